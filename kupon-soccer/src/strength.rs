//! Reduction of a team's attribute ratings to a single strength figure, and the table of known
//! teams from which ratings are resolved.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::domain::{TeamStats, MAX_RATING, MIN_RATING};

/// Number of most recent results that make up the form rating.
pub const FORM_WINDOW: usize = 5;

/// Mean of the attack, defense and form ratings, scaled by the home advantage when playing at home.
pub fn strength(stats: &TeamStats, is_home: bool) -> f64 {
    let stats = stats.clamped();
    let mean = (stats.attack + stats.defense + stats.form) / 3.0;
    if is_home {
        mean * stats.home_advantage
    } else {
        mean
    }
}

/// Ratings of known teams, keyed by name. Names are stored and looked up with surrounding
/// whitespace removed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamTable {
    #[serde(deserialize_with = "deserialize_trimmed")]
    teams: FxHashMap<String, TeamStats>,
}

fn deserialize_trimmed<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<FxHashMap<String, TeamStats>, D::Error> {
    let teams = FxHashMap::<String, TeamStats>::deserialize(deserializer)?;
    Ok(teams
        .into_iter()
        .map(|(team, stats)| (team.trim().to_owned(), stats))
        .collect())
}
impl TeamTable {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            teams: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
        }
    }

    /// Teams of the Turkish Süper Lig with hand-assigned ratings.
    pub fn sample() -> Self {
        Self::from_iter([
            ("Galatasaray", TeamStats::new(8.5, 7.0, 8.0, 1.2)),
            ("Fenerbahce", TeamStats::new(8.0, 7.5, 7.5, 1.1)),
            ("Besiktas", TeamStats::new(7.5, 6.5, 6.0, 1.0)),
            ("Trabzonspor", TeamStats::new(7.0, 6.0, 6.5, 1.1)),
            ("Basaksehir", TeamStats::new(6.5, 6.5, 6.0, 1.0)),
        ])
    }

    pub fn insert(&mut self, team: impl Into<String>, stats: TeamStats) -> Option<TeamStats> {
        self.teams.insert(team.into().trim().to_owned(), stats)
    }

    pub fn get(&self, team: &str) -> Option<&TeamStats> {
        self.teams.get(team.trim())
    }

    /// Stats of the named team, or [TeamStats::NEUTRAL] if the team is not in the table.
    pub fn resolve(&self, team: &str) -> TeamStats {
        match self.get(team) {
            Some(stats) => stats.clamped(),
            None => {
                debug!("no ratings for '{team}', assuming neutral stats");
                TeamStats::NEUTRAL
            }
        }
    }

    pub fn len(&self) -> usize {
        self.teams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.teams.keys().map(String::as_str).collect();
        names.sort();
        names
    }
}

impl<S: Into<String>> FromIterator<(S, TeamStats)> for TeamTable {
    fn from_iter<T: IntoIterator<Item = (S, TeamStats)>>(iter: T) -> Self {
        let iter = iter.into_iter();
        let mut table = Self::with_capacity(iter.size_hint().0);
        for (team, stats) in iter {
            table.insert(team, stats);
        }
        table
    }
}

/// Full-time score of a finished match, from the perspective of the team being rated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub goals_for: u8,
    pub goals_against: u8,
}
impl MatchResult {
    pub fn new(goals_for: u8, goals_against: u8) -> Self {
        Self {
            goals_for,
            goals_against,
        }
    }

    fn points(&self) -> u8 {
        match self.goals_for.cmp(&self.goals_against) {
            std::cmp::Ordering::Greater => 3,
            std::cmp::Ordering::Equal => 1,
            std::cmp::Ordering::Less => 0,
        }
    }
}

impl TeamStats {
    /// Derives ratings from finished matches, ordered oldest first. Attack is twice the mean goals
    /// scored, defense is ten less twice the mean goals conceded, and form is the share of points
    /// taken from the last [FORM_WINDOW] matches, scaled to 10. Without any matches, the team is
    /// rated neutrally.
    pub fn from_results(results: &[MatchResult]) -> Self {
        if results.is_empty() {
            return Self::NEUTRAL;
        }
        let matches = results.len() as f64;
        let scored: f64 = results.iter().map(|result| result.goals_for as f64).sum();
        let conceded: f64 = results.iter().map(|result| result.goals_against as f64).sum();
        let attack = scored / matches * 2.0;
        let defense = MAX_RATING - conceded / matches * 2.0;

        let recent = &results[results.len().saturating_sub(FORM_WINDOW)..];
        let points: f64 = recent.iter().map(|result| result.points() as f64).sum();
        let form = points / (recent.len() as f64 * 3.0) * MAX_RATING;

        let stats = Self {
            attack: attack.max(MIN_RATING),
            defense: defense.max(MIN_RATING),
            form: form.max(MIN_RATING),
            ..Self::NEUTRAL
        };
        stats.clamped()
    }
}
