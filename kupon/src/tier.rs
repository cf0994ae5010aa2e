//! Confidence scores and the risk tiers derived from them.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumCount, EnumIter};
use thiserror::Error;

pub const MIN_CONFIDENCE: f64 = 0.0;
pub const MAX_CONFIDENCE: f64 = 100.0;

/// Clamps a confidence score into `[0, 100]`. A score that is not a number carries no confidence.
pub fn clamp_confidence(confidence: f64) -> f64 {
    if confidence.is_nan() {
        MIN_CONFIDENCE
    } else {
        confidence.clamp(MIN_CONFIDENCE, MAX_CONFIDENCE)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumCount, EnumIter, Display, Serialize, Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

#[derive(Debug, Error, Clone, PartialEq)]
#[error("risk thresholds must satisfy 0 <= medium ({medium}) <= low ({low}) <= 100")]
pub struct InvalidThresholds {
    pub low: f64,
    pub medium: f64,
}

/// Minimum confidence for each tier. Anything below `medium` is [RiskTier::High].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskThresholds {
    pub low: f64,
    pub medium: f64,
}
impl RiskThresholds {
    pub const DEFAULT: RiskThresholds = RiskThresholds {
        low: 70.0,
        medium: 55.0,
    };

    pub fn validate(&self) -> Result<(), InvalidThresholds> {
        let ordered = MIN_CONFIDENCE <= self.medium
            && self.medium <= self.low
            && self.low <= MAX_CONFIDENCE;
        if ordered {
            Ok(())
        } else {
            Err(InvalidThresholds {
                low: self.low,
                medium: self.medium,
            })
        }
    }

    pub fn classify(&self, confidence: f64) -> RiskTier {
        let confidence = clamp_confidence(confidence);
        if confidence >= self.low {
            RiskTier::Low
        } else if confidence >= self.medium {
            RiskTier::Medium
        } else {
            RiskTier::High
        }
    }
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self::DEFAULT
    }
}
