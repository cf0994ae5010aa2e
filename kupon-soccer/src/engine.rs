//! Evaluation of single matches and whole coupons under a chosen [Strategy].

use std::fmt;
use std::fmt::Formatter;
use std::str::FromStr;

use anyhow::{anyhow, bail};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use kupon::market::{ValueBetDetector, DEFAULT_VALUE_MARGIN};
use kupon::parlay::{LegFailure, ParlayAggregator, ParlayResult, CLASSIFIER, RULE_BASED};
use kupon::tier::RiskThresholds;

use crate::classifier::{ClassifiedMatch, Classifier, ClassifierPredictor, Conditions};
use crate::domain::error::{PredictError, UnsupportedBetType};
use crate::domain::{
    BetType, HeadToHeadRecord, MatchContext, MatchInput, OddsQuote, PredictionResult, TeamStats,
};
use crate::predict::{RuleBasedPredictor, RuleVariant};
use crate::strength::TeamTable;

fn default_value_margin() -> f64 {
    DEFAULT_VALUE_MARGIN
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Rule variant used when no strategy is named.
    #[serde(default)]
    pub variant: RuleVariant,
    #[serde(default = "default_value_margin")]
    pub value_margin: f64,
    #[serde(default)]
    pub risk_thresholds: RiskThresholds,
    #[serde(default)]
    pub conditions: Conditions,
}
impl EngineConfig {
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !self.value_margin.is_finite() || !(0.0..1.0).contains(&self.value_margin) {
            bail!("value margin must lie in [0, 1), got {}", self.value_margin);
        }
        self.risk_thresholds.validate()?;
        let conditions = [self.conditions.weather_factor, self.conditions.referee_factor];
        if conditions.iter().any(|&factor| !factor.is_finite() || factor <= 0.0) {
            bail!("weather and referee factors must be finite and positive");
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            variant: RuleVariant::default(),
            value_margin: DEFAULT_VALUE_MARGIN,
            risk_thresholds: RiskThresholds::default(),
            conditions: Conditions::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    RuleBased(RuleVariant),
    Classifier,
}

impl FromStr for Strategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "classifier" => Ok(Strategy::Classifier),
            other => other
                .parse()
                .map(Strategy::RuleBased)
                .map_err(|_| anyhow!("unsupported strategy '{s}'")),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::RuleBased(variant) => write!(f, "{variant}"),
            Strategy::Classifier => write!(f, "classifier"),
        }
    }
}

fn default_bet_type() -> String {
    BetType::OneXTwo.to_string()
}

/// A match on a coupon, as submitted. Stats, odds and head-to-head history that are absent are
/// resolved by the engine or left out of the evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CouponLeg {
    pub home_team: String,
    pub away_team: String,
    #[serde(default = "default_bet_type")]
    pub bet_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_stats: Option<TeamStats>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub away_stats: Option<TeamStats>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub odds: Option<OddsQuote>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head_to_head: Option<HeadToHeadRecord>,
}
impl CouponLeg {
    pub fn new(home_team: impl Into<String>, away_team: impl Into<String>, bet_type: impl Into<String>) -> Self {
        Self {
            home_team: home_team.into(),
            away_team: away_team.into(),
            bet_type: bet_type.into(),
            home_stats: None,
            away_stats: None,
            odds: None,
            head_to_head: None,
        }
    }

    pub fn with_odds(mut self, odds: OddsQuote) -> Self {
        self.odds = Some(odds);
        self
    }

    pub fn with_head_to_head(mut self, head_to_head: HeadToHeadRecord) -> Self {
        self.head_to_head = Some(head_to_head);
        self
    }

    pub fn fixture(&self) -> String {
        format!("{} v {}", self.home_team, self.away_team)
    }

    pub fn input(&self) -> Result<MatchInput, UnsupportedBetType> {
        Ok(MatchInput::new(
            self.home_team.trim(),
            self.away_team.trim(),
            self.bet_type.parse()?,
        ))
    }

    pub fn context(&self) -> MatchContext {
        MatchContext {
            odds: self.odds.clone(),
            head_to_head: self.head_to_head.clone(),
        }
    }
}

pub struct Engine {
    config: EngineConfig,
    teams: TeamTable,
    classifier: Option<Box<dyn Classifier>>,
}
impl Engine {
    pub fn new(config: EngineConfig, teams: TeamTable) -> Result<Self, anyhow::Error> {
        config.validate()?;
        debug!("engine configured with {} teams: {config:?}", teams.len());
        Ok(Self {
            config,
            teams,
            classifier: None,
        })
    }

    pub fn with_classifier(mut self, classifier: impl Classifier + 'static) -> Self {
        self.classifier = Some(Box::new(classifier));
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn teams(&self) -> &TeamTable {
        &self.teams
    }

    pub fn has_classifier(&self) -> bool {
        self.classifier.is_some()
    }

    pub fn default_strategy(&self) -> Strategy {
        Strategy::RuleBased(self.config.variant)
    }

    fn detector(&self) -> ValueBetDetector {
        ValueBetDetector::with_margin(self.config.value_margin)
    }

    fn rule_based(&self, variant: RuleVariant) -> RuleBasedPredictor {
        RuleBasedPredictor {
            variant,
            detector: self.detector(),
            risk_thresholds: self.config.risk_thresholds.clone(),
        }
    }

    fn classifier_predictor(&self) -> ClassifierPredictor {
        ClassifierPredictor {
            detector: self.detector(),
            risk_thresholds: self.config.risk_thresholds.clone(),
            conditions: self.config.conditions.clone(),
        }
    }

    /// Predicts a match between teams resolved from the engine's table.
    pub fn predict(
        &self,
        strategy: &Strategy,
        input: &MatchInput,
        context: &MatchContext,
    ) -> Result<PredictionResult, PredictError> {
        let home = self.teams.resolve(&input.home_team);
        let away = self.teams.resolve(&input.away_team);
        self.predict_with_stats(strategy, input, &home, &away, context)
    }

    pub fn predict_with_stats(
        &self,
        strategy: &Strategy,
        input: &MatchInput,
        home: &TeamStats,
        away: &TeamStats,
        context: &MatchContext,
    ) -> Result<PredictionResult, PredictError> {
        match strategy {
            Strategy::RuleBased(variant) => self.rule_based(*variant).predict(input, home, away, context),
            Strategy::Classifier => {
                self.classifier_predictor()
                    .predict(self.classifier.as_deref(), input, home, away, context)
            }
        }
    }

    /// Calls both label spaces of a match with the loaded classifier.
    pub fn classify(
        &self,
        home_team: &str,
        away_team: &str,
        context: &MatchContext,
    ) -> Result<ClassifiedMatch, PredictError> {
        self.classifier_predictor().classify(
            self.classifier.as_deref(),
            &self.teams.resolve(home_team),
            &self.teams.resolve(away_team),
            context,
        )
    }

    /// Evaluates a single leg. Under [Strategy::Classifier], the leg is played on whichever label
    /// space the classifier is more confident of.
    pub fn evaluate_leg(&self, strategy: &Strategy, leg: &CouponLeg) -> Result<PredictionResult, PredictError> {
        let input = leg.input()?;
        let home = leg
            .home_stats
            .clone()
            .unwrap_or_else(|| self.teams.resolve(&input.home_team));
        let away = leg
            .away_stats
            .clone()
            .unwrap_or_else(|| self.teams.resolve(&input.away_team));
        let context = leg.context();
        match strategy {
            Strategy::RuleBased(_) => self.predict_with_stats(strategy, &input, &home, &away, &context),
            Strategy::Classifier => self.classifier_predictor().predict_best(
                self.classifier.as_deref(),
                &input,
                &home,
                &away,
                &context,
            ),
        }
    }

    /// Evaluates every leg and aggregates those that succeed. Legs that fail are reported in
    /// [ParlayResult::failed].
    pub fn evaluate_coupon(&self, strategy: &Strategy, legs: &[CouponLeg]) -> ParlayResult<PredictionResult> {
        let aggregator = ParlayAggregator::new(match strategy {
            Strategy::RuleBased(_) => RULE_BASED,
            Strategy::Classifier => CLASSIFIER,
        });
        let outcomes = legs.iter().enumerate().map(|(index, leg)| {
            self.evaluate_leg(strategy, leg).map_err(|err| {
                warn!("cannot evaluate {} under {strategy} strategy: {err}", leg.fixture());
                LegFailure {
                    index,
                    leg: leg.fixture(),
                    reason: err.to_string(),
                }
            })
        });
        aggregator.aggregate_partial(outcomes)
    }
}

#[cfg(test)]
mod tests;
