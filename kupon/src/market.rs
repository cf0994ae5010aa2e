//! Implied probabilities of decimal (European) odds and detection of value bets.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The edge, in probability units, by which the model must exceed the market before a bet is
/// flagged as value.
pub const DEFAULT_VALUE_MARGIN: f64 = 0.05;

pub trait MarketPrice {
    fn decimal(&self) -> f64;
}

impl MarketPrice for f64 {
    fn decimal(&self) -> f64 {
        *self
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
#[error("invalid decimal odds {odds}: a price must be finite and greater than 1")]
pub struct InvalidOdds {
    pub odds: f64,
}

pub fn validate_price(price: &impl MarketPrice) -> Result<f64, InvalidOdds> {
    let odds = price.decimal();
    if odds.is_finite() && odds > 1.0 {
        Ok(odds)
    } else {
        Err(InvalidOdds { odds })
    }
}

/// Probability implied by a decimal price, with no adjustment for the bookmaker's margin.
pub fn implied_prob(price: &impl MarketPrice) -> Result<f64, InvalidOdds> {
    validate_price(price).map(|odds| 1.0 / odds)
}

/// Sum of implied probabilities across the mutually exclusive outcomes of a market. A fair book
/// sums to 1; anything above is the overround.
pub fn booksum(prices: &[f64]) -> Result<f64, InvalidOdds> {
    prices.iter().map(implied_prob).sum()
}

/// The bookmaker's margin on a market: its booksum less 1.
pub fn overround(prices: &[f64]) -> Result<f64, InvalidOdds> {
    Ok(booksum(prices)? - 1.0)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueAssessment {
    pub implied_prob: f64,
    pub edge: f64,
    pub is_value: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueBetDetector {
    pub margin: f64,
}
impl ValueBetDetector {
    pub fn with_margin(margin: f64) -> Self {
        Self { margin }
    }

    /// Compares a model-implied probability to the probability implied by `market_odds`. A bet is
    /// flagged only when the model favours the outcome by strictly more than the margin.
    pub fn detect(&self, model_prob: f64, market_odds: f64) -> Result<ValueAssessment, InvalidOdds> {
        let implied_prob = implied_prob(&market_odds)?;
        let edge = model_prob.clamp(0.0, 1.0) - implied_prob;
        Ok(ValueAssessment {
            implied_prob,
            edge,
            is_value: edge > self.margin,
        })
    }
}

impl Default for ValueBetDetector {
    fn default() -> Self {
        Self::with_margin(DEFAULT_VALUE_MARGIN)
    }
}
