//! Fixtures shared by tests.

use crate::domain::{HeadToHeadRecord, MatchContext, OddsQuote, TeamStats};

pub fn galatasaray() -> TeamStats {
    TeamStats::new(8.5, 7.0, 8.0, 1.2)
}

pub fn fenerbahce() -> TeamStats {
    TeamStats::new(8.0, 7.5, 7.5, 1.1)
}

pub fn besiktas() -> TeamStats {
    TeamStats::new(7.5, 6.5, 6.0, 1.0)
}

pub fn trabzonspor() -> TeamStats {
    TeamStats::new(7.0, 6.0, 6.5, 1.1)
}

/// Stats with all three ratings equal to `rating` and no home advantage.
pub fn flat(rating: f64) -> TeamStats {
    TeamStats::new(rating, rating, rating, 1.0)
}

pub fn sample_odds() -> OddsQuote {
    OddsQuote {
        home: 2.1,
        draw: 3.2,
        away: 4.5,
        over_2_5: 1.8,
        under_2_5: 2.0,
    }
}

pub fn sample_head_to_head() -> HeadToHeadRecord {
    HeadToHeadRecord {
        total_matches: 10,
        team1_wins: 4,
        team2_wins: 3,
        draws: 3,
        avg_goals: 2.3,
    }
}

pub fn with_odds(odds: OddsQuote) -> MatchContext {
    MatchContext {
        odds: Some(odds),
        head_to_head: None,
    }
}

pub fn with_head_to_head(head_to_head: HeadToHeadRecord) -> MatchContext {
    MatchContext {
        odds: None,
        head_to_head: Some(head_to_head),
    }
}
