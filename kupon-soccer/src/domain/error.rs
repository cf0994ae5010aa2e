use thiserror::Error;

use kupon::market::InvalidOdds;

#[derive(Debug, Error, Clone, PartialEq)]
#[error("unsupported bet type '{0}'")]
pub struct UnsupportedBetType(pub String);

#[derive(Debug, Error, Clone, PartialEq)]
pub enum InvalidHeadToHead {
    #[error("head-to-head tallies {tallied} exceed {total_matches} matches")]
    Tallies { total_matches: u32, tallied: u64 },

    #[error("head-to-head average goals {0} must be finite and non-negative")]
    AvgGoals(f64),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PredictError {
    #[error("{0}")]
    UnsupportedBetType(#[from] UnsupportedBetType),

    #[error("{0}")]
    InvalidOdds(#[from] InvalidOdds),

    #[error("{0}")]
    InvalidHeadToHead(#[from] InvalidHeadToHead),

    #[error("no trained classifier is available")]
    ModelUnavailable,
}
