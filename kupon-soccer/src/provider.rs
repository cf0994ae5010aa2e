//! Retrieval of team stats, odds and head-to-head history for the legs of a coupon.
//!
//! Retrieval fails open: a fetch that errors or exceeds its time limit is logged and the leg
//! proceeds with neutral stats, or without odds or history.

use std::future::Future;
use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use futures::future::join_all;
use rustc_hash::FxHashMap;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::domain::{HeadToHeadRecord, OddsQuote, TeamStats};
use crate::engine::CouponLeg;
use crate::strength::TeamTable;

#[async_trait]
pub trait StatsProvider: Send + Sync {
    async fn fetch_team_stats(&self, team: &str) -> Result<TeamStats, anyhow::Error>;

    /// Odds for the match, or `None` if no market is offered.
    async fn fetch_odds(&self, home_team: &str, away_team: &str) -> Result<Option<OddsQuote>, anyhow::Error>;

    /// History of past meetings, with the home side as `team1`, or `None` if none is recorded.
    async fn fetch_head_to_head(
        &self,
        home_team: &str,
        away_team: &str,
    ) -> Result<Option<HeadToHeadRecord>, anyhow::Error>;
}

type Fixture = (String, String);

fn fixture(home_team: &str, away_team: &str) -> Fixture {
    (home_team.trim().to_string(), away_team.trim().to_string())
}

/// Serves data held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticProvider {
    teams: TeamTable,
    odds: FxHashMap<Fixture, OddsQuote>,
    head_to_head: FxHashMap<Fixture, HeadToHeadRecord>,
    default_odds: Option<OddsQuote>,
    default_head_to_head: Option<HeadToHeadRecord>,
}
impl StaticProvider {
    pub fn new(teams: TeamTable) -> Self {
        Self {
            teams,
            ..Self::default()
        }
    }

    /// Odds served for any match without a quote of its own.
    pub fn with_default_odds(mut self, odds: OddsQuote) -> Self {
        self.default_odds = Some(odds);
        self
    }

    /// History served for any match without a record of its own.
    pub fn with_default_head_to_head(mut self, head_to_head: HeadToHeadRecord) -> Self {
        self.default_head_to_head = Some(head_to_head);
        self
    }

    pub fn insert_odds(&mut self, home_team: &str, away_team: &str, odds: OddsQuote) {
        self.odds.insert(fixture(home_team, away_team), odds);
    }

    pub fn insert_head_to_head(&mut self, home_team: &str, away_team: &str, head_to_head: HeadToHeadRecord) {
        self.head_to_head.insert(fixture(home_team, away_team), head_to_head);
    }
}

#[async_trait]
impl StatsProvider for StaticProvider {
    async fn fetch_team_stats(&self, team: &str) -> Result<TeamStats, anyhow::Error> {
        self.teams
            .get(team)
            .map(TeamStats::clamped)
            .ok_or_else(|| anyhow!("no stats for '{team}'"))
    }

    async fn fetch_odds(&self, home_team: &str, away_team: &str) -> Result<Option<OddsQuote>, anyhow::Error> {
        Ok(self
            .odds
            .get(&fixture(home_team, away_team))
            .or(self.default_odds.as_ref())
            .cloned())
    }

    async fn fetch_head_to_head(
        &self,
        home_team: &str,
        away_team: &str,
    ) -> Result<Option<HeadToHeadRecord>, anyhow::Error> {
        Ok(self
            .head_to_head
            .get(&fixture(home_team, away_team))
            .or(self.default_head_to_head.as_ref())
            .cloned())
    }
}

async fn within<T>(
    limit: Duration,
    what: String,
    fetch: impl Future<Output = Result<T, anyhow::Error>>,
) -> Option<T> {
    match timeout(limit, fetch).await {
        Ok(Ok(value)) => Some(value),
        Ok(Err(err)) => {
            warn!("cannot fetch {what}: {err}");
            None
        }
        Err(_) => {
            warn!("timed out fetching {what} after {limit:?}");
            None
        }
    }
}

/// Fills in whatever the leg is missing. All fetches run concurrently, each bounded by `limit`.
async fn complete(provider: &dyn StatsProvider, leg: CouponLeg, limit: Duration) -> CouponLeg {
    let (home, away) = (leg.home_team.trim(), leg.away_team.trim());
    let stats = move |team: &'static str, known: &Option<TeamStats>, name: &str| {
        let known = known.clone();
        let name = name.to_string();
        async move {
            match known {
                Some(stats) => stats,
                None => within(limit, format!("{team} stats for '{name}'"), provider.fetch_team_stats(&name))
                    .await
                    .unwrap_or(TeamStats::NEUTRAL),
            }
        }
    };
    let odds = async {
        match &leg.odds {
            Some(odds) => Some(odds.clone()),
            None => within(limit, format!("odds for {home} v {away}"), provider.fetch_odds(home, away))
                .await
                .flatten(),
        }
    };
    let head_to_head = async {
        match &leg.head_to_head {
            Some(head_to_head) => Some(head_to_head.clone()),
            None => within(
                limit,
                format!("head-to-head for {home} v {away}"),
                provider.fetch_head_to_head(home, away),
            )
            .await
            .flatten(),
        }
    };

    let (home_stats, away_stats, odds, head_to_head) = tokio::join!(
        stats("home", &leg.home_stats, home),
        stats("away", &leg.away_stats, away),
        odds,
        head_to_head
    );
    CouponLeg {
        home_stats: Some(home_stats),
        away_stats: Some(away_stats),
        odds,
        head_to_head,
        ..leg
    }
}

/// Completes every leg concurrently, preserving their order.
pub async fn gather(provider: &dyn StatsProvider, legs: Vec<CouponLeg>, limit: Duration) -> Vec<CouponLeg> {
    debug!("gathering data for {} legs, {limit:?} per fetch", legs.len());
    join_all(legs.into_iter().map(|leg| complete(provider, leg, limit))).await
}
