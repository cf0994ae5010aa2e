use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};

use kupon::market::{validate_price, InvalidOdds, ValueAssessment};
use kupon::parlay::Leg;
use kupon::tier::RiskTier;

use crate::domain::error::{InvalidHeadToHead, PredictError, UnsupportedBetType};

pub mod error;

pub const MIN_RATING: f64 = 1.0;
pub const MAX_RATING: f64 = 10.0;
pub const NEUTRAL_RATING: f64 = 5.0;
pub const DEFAULT_HOME_ADVANTAGE: f64 = 1.0;

fn default_home_advantage() -> f64 {
    DEFAULT_HOME_ADVANTAGE
}

fn clamp_rating(rating: f64) -> f64 {
    if rating.is_nan() {
        NEUTRAL_RATING
    } else {
        rating.clamp(MIN_RATING, MAX_RATING)
    }
}

/// Attribute ratings of a team, each on a 1–10 scale, and the multiplier applied to its strength
/// when playing at home.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamStats {
    pub attack: f64,
    pub defense: f64,
    pub form: f64,
    #[serde(default = "default_home_advantage")]
    pub home_advantage: f64,
}
impl TeamStats {
    /// Stats assumed for a team that is not known or whose data could not be obtained.
    pub const NEUTRAL: TeamStats = TeamStats {
        attack: NEUTRAL_RATING,
        defense: NEUTRAL_RATING,
        form: NEUTRAL_RATING,
        home_advantage: DEFAULT_HOME_ADVANTAGE,
    };

    pub fn new(attack: f64, defense: f64, form: f64, home_advantage: f64) -> Self {
        Self {
            attack,
            defense,
            form,
            home_advantage,
        }
        .clamped()
    }

    /// A copy with the ratings clamped to `[1, 10]`. A home advantage that is not a finite
    /// positive multiplier reverts to 1.
    pub fn clamped(&self) -> Self {
        let home_advantage = if self.home_advantage.is_finite() && self.home_advantage > 0.0 {
            self.home_advantage
        } else {
            DEFAULT_HOME_ADVANTAGE
        };
        Self {
            attack: clamp_rating(self.attack),
            defense: clamp_rating(self.defense),
            form: clamp_rating(self.form),
            home_advantage,
        }
    }
}

impl Default for TeamStats {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

/// Decimal odds quoted for the main markets of a match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OddsQuote {
    pub home: f64,
    pub draw: f64,
    pub away: f64,
    pub over_2_5: f64,
    pub under_2_5: f64,
}
impl OddsQuote {
    pub fn validate(&self) -> Result<(), InvalidOdds> {
        for price in [self.home, self.draw, self.away, self.over_2_5, self.under_2_5] {
            validate_price(&price)?;
        }
        Ok(())
    }

    pub fn price(&self, label: &Label) -> f64 {
        match label {
            Label::Home => self.home,
            Label::Draw => self.draw,
            Label::Away => self.away,
            Label::Under2_5 => self.under_2_5,
            Label::Over2_5 => self.over_2_5,
        }
    }
}

/// Past meetings between two teams. `team1` is the home side of the match being assessed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadToHeadRecord {
    pub total_matches: u32,
    pub team1_wins: u32,
    pub team2_wins: u32,
    pub draws: u32,
    pub avg_goals: f64,
}
impl HeadToHeadRecord {
    pub fn validate(&self) -> Result<(), InvalidHeadToHead> {
        let tallied = self.team1_wins as u64 + self.team2_wins as u64 + self.draws as u64;
        if tallied > self.total_matches as u64 {
            return Err(InvalidHeadToHead::Tallies {
                total_matches: self.total_matches,
                tallied,
            });
        }
        if !self.avg_goals.is_finite() || self.avg_goals < 0.0 {
            return Err(InvalidHeadToHead::AvgGoals(self.avg_goals));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, Serialize, Deserialize)]
pub enum BetType {
    #[strum(serialize = "1X2")]
    OneXTwo,
    #[strum(serialize = "O/U2.5")]
    OverUnder2_5,
}

impl FromStr for BetType {
    type Err = UnsupportedBetType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "1X2" | "ONE_X_TWO" => Ok(BetType::OneXTwo),
            "O/U2.5" | "OVER_UNDER_2_5" => Ok(BetType::OverUnder2_5),
            _ => Err(UnsupportedBetType(s.into())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, Serialize, Deserialize)]
pub enum Label {
    #[strum(serialize = "HOME")]
    Home,
    #[strum(serialize = "DRAW")]
    Draw,
    #[strum(serialize = "AWAY")]
    Away,
    #[strum(serialize = "UNDER_2_5")]
    Under2_5,
    #[strum(serialize = "OVER_2_5")]
    Over2_5,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchInput {
    pub home_team: String,
    pub away_team: String,
    pub bet_type: BetType,
}
impl MatchInput {
    pub fn new(home_team: impl Into<String>, away_team: impl Into<String>, bet_type: BetType) -> Self {
        Self {
            home_team: home_team.into(),
            away_team: away_team.into(),
            bet_type,
        }
    }

    pub fn fixture(&self) -> String {
        format!("{} v {}", self.home_team, self.away_team)
    }
}

/// Optional market and historical data available for a match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchContext {
    pub odds: Option<OddsQuote>,
    pub head_to_head: Option<HeadToHeadRecord>,
}
impl MatchContext {
    pub fn validate(&self) -> Result<(), PredictError> {
        if let Some(odds) = &self.odds {
            odds.validate()?;
        }
        if let Some(h2h) = &self.head_to_head {
            h2h.validate()?;
        }
        Ok(())
    }
}

/// Intermediate quantities behind a prediction, kept for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Factors {
    pub home_strength: f64,
    pub away_strength: f64,
    pub h2h_factor: f64,
    pub form_home: f64,
    pub form_away: f64,
    pub value: Option<ValueAssessment>,
    pub quoted_odds: Option<f64>,
    pub probabilities: Vec<(Label, f64)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub home_team: String,
    pub away_team: String,
    pub bet_type: BetType,
    pub prediction: Label,
    pub confidence: f64,
    pub risk_tier: RiskTier,
    pub value_bet: bool,
    pub factors: Factors,
}
impl PredictionResult {
    pub fn fixture(&self) -> String {
        format!("{} v {}", self.home_team, self.away_team)
    }
}

impl Leg for PredictionResult {
    fn confidence(&self) -> f64 {
        self.confidence
    }
}
