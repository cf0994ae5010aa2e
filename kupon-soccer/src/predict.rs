//! Rule-based prediction of a single match.
//!
//! The home side's strength (adjusted by head-to-head history) is compared to the away side's;
//! the difference selects the label and drives the confidence. Two parameter sets exist,
//! [SIMPLE] and [ENHANCED]. They are kept separate and selected through [RuleVariant].

use std::str::FromStr;

use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};
use tracing::trace;

use kupon::market::{ValueAssessment, ValueBetDetector};
use kupon::tier::{clamp_confidence, RiskThresholds};

use crate::domain::error::PredictError;
use crate::domain::{BetType, Factors, Label, MatchContext, MatchInput, PredictionResult, TeamStats};
use crate::head_to_head;
use crate::strength::strength;

/// Mean attack rating of both sides above which more than 2.5 goals are expected.
pub const GOALS_ATTACK_LINE: f64 = 7.5;
pub const GOALS_BASE_CONFIDENCE: f64 = 50.0;
pub const GOALS_CONFIDENCE_SLOPE: f64 = 10.0;
pub const GOALS_CONFIDENCE_CAP: f64 = 75.0;

/// Parameters of the 1X2 rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleParams {
    /// Strength difference that must be strictly exceeded to call a winner.
    pub threshold: f64,
    /// Confidence gained per unit of strength difference when calling a winner.
    pub slope: f64,
    pub base: f64,
    pub cap: f64,
    /// The draw confidence is `draw_base + (draw_margin - draw_slope * |diff|)`.
    pub draw_base: f64,
    pub draw_margin: f64,
    pub draw_slope: f64,
    /// When set, a winner is only called if the model's edge over the home price agrees with it by
    /// more than this amount: above it for the home side, below its negation for the away side.
    pub value_gate: Option<f64>,
}

pub const SIMPLE: RuleParams = RuleParams {
    threshold: 1.5,
    slope: 10.0,
    base: 60.0,
    cap: 80.0,
    draw_base: 50.0,
    draw_margin: 10.0,
    draw_slope: 5.0,
    value_gate: None,
};

pub const ENHANCED: RuleParams = RuleParams {
    threshold: 1.0,
    slope: 8.0,
    base: 65.0,
    cap: 85.0,
    draw_base: 45.0,
    draw_margin: 5.0,
    draw_slope: 1.0,
    value_gate: Some(0.1),
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumIter, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RuleVariant {
    #[default]
    Simple,
    Enhanced,
}
impl RuleVariant {
    pub fn params(&self) -> &'static RuleParams {
        match self {
            RuleVariant::Simple => &SIMPLE,
            RuleVariant::Enhanced => &ENHANCED,
        }
    }
}

impl FromStr for RuleVariant {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "simple" => Ok(RuleVariant::Simple),
            "enhanced" => Ok(RuleVariant::Enhanced),
            _ => Err(anyhow!("unsupported rule variant '{s}'")),
        }
    }
}

impl RuleParams {
    /// Calls the 1X2 outcome from the strength difference, consulting the value assessment of the
    /// home price when this parameter set is gated.
    pub fn call_match_result(&self, diff: f64, value: Option<&ValueAssessment>) -> (Label, f64) {
        let confirmed = |home: bool| match self.value_gate {
            None => true,
            Some(gate) => value.is_some_and(|value| {
                if home {
                    value.edge > gate
                } else {
                    value.edge < -gate
                }
            }),
        };

        if diff > self.threshold && confirmed(true) {
            (Label::Home, f64::min(self.cap, self.base + diff * self.slope))
        } else if diff < -self.threshold && confirmed(false) {
            (Label::Away, f64::min(self.cap, self.base + diff.abs() * self.slope))
        } else {
            (
                Label::Draw,
                self.draw_base + (self.draw_margin - self.draw_slope * diff.abs()),
            )
        }
    }
}

/// Calls the over/under 2.5 goals outcome from the mean attack rating of both sides. The further
/// the mean is from the line, the higher the confidence.
pub fn call_total_goals(home: &TeamStats, away: &TeamStats) -> (Label, f64) {
    let mean_attack = (home.attack + away.attack) / 2.0;
    let label = if mean_attack > GOALS_ATTACK_LINE {
        Label::Over2_5
    } else {
        Label::Under2_5
    };
    let distance = (mean_attack - GOALS_ATTACK_LINE).abs();
    (
        label,
        f64::min(
            GOALS_CONFIDENCE_CAP,
            GOALS_BASE_CONFIDENCE + distance * GOALS_CONFIDENCE_SLOPE,
        ),
    )
}

/// Strengths of both sides, with the head-to-head factor applied to the home side.
#[derive(Debug, Clone, PartialEq)]
pub struct Strengths {
    pub home: f64,
    pub away: f64,
    pub h2h_factor: f64,
}
impl Strengths {
    pub fn assess(home: &TeamStats, away: &TeamStats, context: &MatchContext) -> Self {
        let h2h_factor = head_to_head::factor_or_neutral(context.head_to_head.as_ref());
        Self {
            home: strength(home, true) * h2h_factor,
            away: strength(away, false),
            h2h_factor,
        }
    }

    pub fn diff(&self) -> f64 {
        self.home - self.away
    }

    /// Probability of a home win implied by the relative strengths.
    pub fn home_win_prob(&self) -> f64 {
        self.home / (self.home + self.away)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RuleBasedPredictor {
    pub variant: RuleVariant,
    pub detector: ValueBetDetector,
    pub risk_thresholds: RiskThresholds,
}
impl RuleBasedPredictor {
    pub fn predict(
        &self,
        input: &MatchInput,
        home: &TeamStats,
        away: &TeamStats,
        context: &MatchContext,
    ) -> Result<PredictionResult, PredictError> {
        context.validate()?;
        let (home, away) = (home.clamped(), away.clamped());
        let strengths = Strengths::assess(&home, &away, context);
        let diff = strengths.diff();

        let value = match &context.odds {
            Some(odds) => Some(self.detector.detect(strengths.home_win_prob(), odds.home)?),
            None => None,
        };

        let (prediction, confidence) = match input.bet_type {
            BetType::OneXTwo => self.variant.params().call_match_result(diff, value.as_ref()),
            BetType::OverUnder2_5 => call_total_goals(&home, &away),
        };
        let confidence = clamp_confidence(confidence);
        trace!(
            "{}: {:?} strengths {:.3} v {:.3} (diff {diff:.3}) → {prediction} at {confidence:.1}",
            input.fixture(),
            self.variant,
            strengths.home,
            strengths.away
        );

        Ok(PredictionResult {
            home_team: input.home_team.clone(),
            away_team: input.away_team.clone(),
            bet_type: input.bet_type,
            prediction,
            confidence,
            risk_tier: self.risk_thresholds.classify(confidence),
            value_bet: value.as_ref().is_some_and(|value| value.is_value),
            factors: Factors {
                home_strength: strengths.home,
                away_strength: strengths.away,
                h2h_factor: strengths.h2h_factor,
                form_home: home.form,
                form_away: away.form,
                value,
                quoted_odds: context.odds.as_ref().map(|odds| odds.price(&prediction)),
                probabilities: vec![],
            },
        })
    }
}
