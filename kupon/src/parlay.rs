//! Aggregation of independent legs into a single parlay (coupon).
//!
//! Legs are assumed to be statistically independent, so the composite confidence is the product
//! of the leg confidences, taken as probabilities. The composite is mapped to a [Recommendation]
//! through an ordered [RecommendationTable].

use std::fmt;
use std::fmt::Formatter;

use serde::{Deserialize, Serialize};
use strum_macros::Display;
use tracing::debug;

use crate::tier::{clamp_confidence, RiskThresholds, RiskTier, MAX_CONFIDENCE};

/// A leg whose confidence reaches this level counts as high-confidence in [risk_analysis].
pub const HIGH_CONFIDENCE: f64 = 70.0;

/// Minimum share (in percent) of high-confidence legs for each coupon-level risk tier.
pub const HIGH_CONFIDENCE_SHARE: RiskThresholds = RiskThresholds {
    low: 60.0,
    medium: 30.0,
};

pub trait Leg {
    /// Confidence in the leg's outcome, in `[0, 100]`.
    fn confidence(&self) -> f64;
}

impl Leg for f64 {
    fn confidence(&self) -> f64 {
        *self
    }
}

impl<L: Leg> Leg for &L {
    fn confidence(&self) -> f64 {
        (*self).confidence()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum Recommendation {
    #[strum(serialize = "playable")]
    #[serde(rename = "playable")]
    Playable,
    #[strum(serialize = "caution")]
    #[serde(rename = "caution")]
    Caution,
    #[strum(serialize = "avoid")]
    #[serde(rename = "avoid")]
    Avoid,
    #[strum(serialize = "strong")]
    #[serde(rename = "strong")]
    Strong,
    #[strum(serialize = "moderate")]
    #[serde(rename = "moderate")]
    Moderate,
    #[strum(serialize = "small stake")]
    #[serde(rename = "small stake")]
    SmallStake,
    #[strum(serialize = "very risky")]
    #[serde(rename = "very risky")]
    VeryRisky,
    /// A coupon without legs. Its composite confidence is the identity of the product and carries
    /// no signal.
    #[strum(serialize = "nothing to recommend")]
    #[serde(rename = "nothing to recommend")]
    NothingToRecommend,
}

/// Ordered mapping from composite confidence to a [Recommendation]. Tiers are scanned top-down;
/// the first whose minimum is met applies, otherwise the fallback.
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationTable {
    pub name: &'static str,
    pub tiers: &'static [(f64, Recommendation)],
    pub fallback: Recommendation,
}

/// Recommendations for coupons assembled by the rule-based predictor.
pub const RULE_BASED: RecommendationTable = RecommendationTable {
    name: "rule-based",
    tiers: &[(25.0, Recommendation::Playable), (15.0, Recommendation::Caution)],
    fallback: Recommendation::Avoid,
};

/// Recommendations for coupons assembled by the classifier-backed predictor.
pub const CLASSIFIER: RecommendationTable = RecommendationTable {
    name: "classifier",
    tiers: &[
        (30.0, Recommendation::Strong),
        (20.0, Recommendation::Moderate),
        (10.0, Recommendation::SmallStake),
    ],
    fallback: Recommendation::VeryRisky,
};

impl RecommendationTable {
    pub fn is_ordered(&self) -> bool {
        self.tiers
            .windows(2)
            .all(|pair| pair[0].0 > pair[1].0)
    }

    pub fn lookup(&self, composite_confidence: f64) -> Recommendation {
        debug_assert!(self.is_ordered(), "tiers of {} are out of order", self.name);
        self.tiers
            .iter()
            .find(|(min_confidence, _)| composite_confidence >= *min_confidence)
            .map(|(_, recommendation)| *recommendation)
            .unwrap_or(self.fallback)
    }
}

/// A leg that could not be evaluated. It is reported alongside the parlay and excluded from the
/// composite confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegFailure {
    pub index: usize,
    pub leg: String,
    pub reason: String,
}

impl fmt::Display for LegFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "leg {} ({}): {}", self.index + 1, self.leg, self.reason)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParlayResult<L> {
    pub legs: Vec<L>,
    pub composite_confidence: f64,
    pub recommendation: Recommendation,
    pub leg_count: usize,
    pub failed: Vec<LegFailure>,
}
impl<L> ParlayResult<L> {
    /// `true` if no leg contributed to the composite confidence.
    pub fn is_degenerate(&self) -> bool {
        self.leg_count == 0
    }
}

/// Product of the leg confidences, scaled back to `[0, 100]`. An empty set of legs yields 100.
pub fn composite_confidence<L: Leg>(legs: &[L]) -> f64 {
    let product: f64 = legs
        .iter()
        .map(|leg| clamp_confidence(leg.confidence()) / MAX_CONFIDENCE)
        .product();
    clamp_confidence(product * MAX_CONFIDENCE)
}

/// Coupon-level risk from the share of high-confidence legs. A coupon without legs is
/// [RiskTier::High].
pub fn risk_analysis<L: Leg>(legs: &[L]) -> RiskTier {
    if legs.is_empty() {
        return RiskTier::High;
    }
    let high_confidence = legs
        .iter()
        .filter(|leg| leg.confidence() >= HIGH_CONFIDENCE)
        .count();
    let share = high_confidence as f64 / legs.len() as f64 * 100.0;
    HIGH_CONFIDENCE_SHARE.classify(share)
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParlayAggregator {
    table: RecommendationTable,
}
impl ParlayAggregator {
    pub fn new(table: RecommendationTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &RecommendationTable {
        &self.table
    }

    pub fn aggregate<L: Leg>(&self, legs: Vec<L>) -> ParlayResult<L> {
        self.aggregate_partial(legs.into_iter().map(Ok))
    }

    /// Aggregates the legs that were evaluated, carrying the failures through to the result.
    pub fn aggregate_partial<L: Leg>(
        &self,
        outcomes: impl IntoIterator<Item = Result<L, LegFailure>>,
    ) -> ParlayResult<L> {
        let mut legs = vec![];
        let mut failed = vec![];
        for outcome in outcomes {
            match outcome {
                Ok(leg) => legs.push(leg),
                Err(failure) => failed.push(failure),
            }
        }

        let composite_confidence = composite_confidence(&legs);
        let recommendation = if legs.is_empty() {
            Recommendation::NothingToRecommend
        } else {
            self.table.lookup(composite_confidence)
        };
        debug!(
            "aggregated {} legs ({} failed) with {} table: composite confidence {composite_confidence:.2}, {recommendation}",
            legs.len(),
            failed.len(),
            self.table.name
        );
        ParlayResult {
            leg_count: legs.len(),
            legs,
            composite_confidence,
            recommendation,
            failed,
        }
    }
}

impl Default for ParlayAggregator {
    fn default() -> Self {
        Self::new(RULE_BASED)
    }
}
