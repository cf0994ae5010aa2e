//! Classifier-backed prediction.
//!
//! A match is reduced to a fixed-order [FeatureVector], which a [Classifier] turns into a
//! probability per label for each [LabelSpace]. The most probable label of each space is called,
//! with its probability (as a percentage) taken for the confidence. Fitting the classifier is
//! outside this crate; [LinearSoftmax] scores a match from a parameter file of per-label linear
//! predictors.

use std::path::Path;

use anyhow::bail;
use ordinalizer::Ordinal;
use serde::{Deserialize, Serialize};
use strum::EnumCount;
use strum_macros::{Display, EnumCount, EnumIter};
use tracing::{debug, warn};

use kupon::file::read_json;
use kupon::linear::{argmax, softmax, AsIndex, Predictor, Standardiser};
use kupon::market::ValueBetDetector;
use kupon::tier::{clamp_confidence, RiskThresholds};

use crate::domain::error::PredictError;
use crate::domain::{
    BetType, Factors, HeadToHeadRecord, Label, MatchContext, MatchInput, PredictionResult,
    TeamStats,
};
use crate::head_to_head;
use crate::predict::Strengths;

/// Head-to-head figures assumed when the two sides have no recorded history.
pub const PRIOR_HOME_WIN_RATIO: f64 = 0.4;
pub const PRIOR_AWAY_WIN_RATIO: f64 = 0.3;
pub const PRIOR_AVG_GOALS: f64 = 2.5;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Ordinal, EnumCount, EnumIter, Display, Serialize, Deserialize,
)]
pub enum Feature {
    HomeAttack,
    HomeDefense,
    HomeForm,
    AwayAttack,
    AwayDefense,
    AwayForm,
    AttackDiff,
    DefenseDiff,
    FormDiff,
    H2hHomeWinRatio,
    H2hAwayWinRatio,
    H2hAvgGoals,
    HomeAdvantage,
    WeatherFactor,
    RefereeFactor,
}

impl AsIndex for Feature {
    fn as_index(&self) -> usize {
        self.ordinal()
    }
}

fn neutral_factor() -> f64 {
    1.0
}

/// Match-day conditions that are not part of either team's ratings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conditions {
    #[serde(default = "neutral_factor")]
    pub weather_factor: f64,
    #[serde(default = "neutral_factor")]
    pub referee_factor: f64,
}

impl Default for Conditions {
    fn default() -> Self {
        Self {
            weather_factor: neutral_factor(),
            referee_factor: neutral_factor(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector([f64; Feature::COUNT]);
impl FeatureVector {
    pub fn build(
        home: &TeamStats,
        away: &TeamStats,
        h2h: Option<&HeadToHeadRecord>,
        conditions: &Conditions,
    ) -> Self {
        let (home, away) = (home.clamped(), away.clamped());
        let (h2h_home, h2h_away, h2h_goals) = match h2h {
            None => (PRIOR_HOME_WIN_RATIO, PRIOR_AWAY_WIN_RATIO, PRIOR_AVG_GOALS),
            Some(h2h) => {
                let (home_ratio, away_ratio) = head_to_head::win_ratios(h2h);
                (home_ratio, away_ratio, h2h.avg_goals)
            }
        };

        let mut features = [0.0; Feature::COUNT];
        features[Feature::HomeAttack.ordinal()] = home.attack;
        features[Feature::HomeDefense.ordinal()] = home.defense;
        features[Feature::HomeForm.ordinal()] = home.form;
        features[Feature::AwayAttack.ordinal()] = away.attack;
        features[Feature::AwayDefense.ordinal()] = away.defense;
        features[Feature::AwayForm.ordinal()] = away.form;
        features[Feature::AttackDiff.ordinal()] = home.attack - away.attack;
        features[Feature::DefenseDiff.ordinal()] = home.defense - away.defense;
        features[Feature::FormDiff.ordinal()] = home.form - away.form;
        features[Feature::H2hHomeWinRatio.ordinal()] = h2h_home;
        features[Feature::H2hAwayWinRatio.ordinal()] = h2h_away;
        features[Feature::H2hAvgGoals.ordinal()] = h2h_goals;
        features[Feature::HomeAdvantage.ordinal()] = home.home_advantage;
        features[Feature::WeatherFactor.ordinal()] = conditions.weather_factor;
        features[Feature::RefereeFactor.ordinal()] = conditions.referee_factor;
        Self(features)
    }

    pub fn get(&self, feature: Feature) -> f64 {
        self.0[feature.ordinal()]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, Serialize, Deserialize)]
pub enum LabelSpace {
    MatchResult,
    TotalGoals,
}
impl LabelSpace {
    /// Labels of the space, in the order a classifier reports their probabilities.
    pub fn labels(&self) -> &'static [Label] {
        match self {
            LabelSpace::MatchResult => &[Label::Home, Label::Draw, Label::Away],
            LabelSpace::TotalGoals => &[Label::Under2_5, Label::Over2_5],
        }
    }

    pub fn bet_type(&self) -> BetType {
        match self {
            LabelSpace::MatchResult => BetType::OneXTwo,
            LabelSpace::TotalGoals => BetType::OverUnder2_5,
        }
    }
}

impl From<BetType> for LabelSpace {
    fn from(bet_type: BetType) -> Self {
        match bet_type {
            BetType::OneXTwo => LabelSpace::MatchResult,
            BetType::OverUnder2_5 => LabelSpace::TotalGoals,
        }
    }
}

pub trait Classifier: Send + Sync {
    /// Probabilities of the labels in `space`, in the order of [LabelSpace::labels].
    fn predict_proba(&self, space: LabelSpace, features: &FeatureVector) -> Result<Vec<f64>, anyhow::Error>;
}

/// The most probable label of one space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedOutcome {
    pub space: LabelSpace,
    pub label: Label,
    pub confidence: f64,
    pub probabilities: Vec<(Label, f64)>,
}
impl ClassifiedOutcome {
    fn from_probabilities(space: LabelSpace, probabilities: Vec<f64>) -> Result<Self, anyhow::Error> {
        let labels = space.labels();
        if probabilities.len() != labels.len() {
            bail!(
                "expected {} probabilities for {space}, got {}",
                labels.len(),
                probabilities.len()
            );
        }
        if probabilities.iter().any(|&prob| !prob.is_finite() || !(0.0..=1.0).contains(&prob)) {
            bail!("probabilities for {space} must lie in [0, 1], got {probabilities:?}");
        }
        let Some(best) = argmax(&probabilities) else {
            bail!("no probabilities for {space}");
        };
        Ok(Self {
            space,
            label: labels[best],
            confidence: clamp_confidence(probabilities[best] * 100.0),
            probabilities: labels.iter().copied().zip(probabilities).collect(),
        })
    }

    pub fn probability(&self) -> f64 {
        self.probabilities
            .iter()
            .find(|(label, _)| *label == self.label)
            .map(|(_, prob)| *prob)
            .unwrap_or_default()
    }
}

/// Calls for both label spaces of a match, surfaced independently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedMatch {
    pub match_result: ClassifiedOutcome,
    pub total_goals: ClassifiedOutcome,
}
impl ClassifiedMatch {
    /// The more confident of the two calls; the match result wins a tie.
    pub fn best(&self) -> &ClassifiedOutcome {
        if self.total_goals.confidence > self.match_result.confidence {
            &self.total_goals
        } else {
            &self.match_result
        }
    }

    pub fn for_space(&self, space: LabelSpace) -> &ClassifiedOutcome {
        match space {
            LabelSpace::MatchResult => &self.match_result,
            LabelSpace::TotalGoals => &self.total_goals,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClassifierPredictor {
    pub detector: ValueBetDetector,
    pub risk_thresholds: RiskThresholds,
    pub conditions: Conditions,
}
impl ClassifierPredictor {
    /// Calls both label spaces. Without a classifier, or if the classifier misbehaves, the model is
    /// deemed unavailable.
    pub fn classify(
        &self,
        classifier: Option<&dyn Classifier>,
        home: &TeamStats,
        away: &TeamStats,
        context: &MatchContext,
    ) -> Result<ClassifiedMatch, PredictError> {
        let classifier = classifier.ok_or(PredictError::ModelUnavailable)?;
        context.validate()?;
        let features = FeatureVector::build(home, away, context.head_to_head.as_ref(), &self.conditions);
        let outcome = |space| {
            classifier
                .predict_proba(space, &features)
                .and_then(|probabilities| ClassifiedOutcome::from_probabilities(space, probabilities))
                .map_err(|err| {
                    warn!("classifier failed on {space}: {err}");
                    PredictError::ModelUnavailable
                })
        };
        Ok(ClassifiedMatch {
            match_result: outcome(LabelSpace::MatchResult)?,
            total_goals: outcome(LabelSpace::TotalGoals)?,
        })
    }

    /// Predicts the outcome of the bet type named in `input`.
    pub fn predict(
        &self,
        classifier: Option<&dyn Classifier>,
        input: &MatchInput,
        home: &TeamStats,
        away: &TeamStats,
        context: &MatchContext,
    ) -> Result<PredictionResult, PredictError> {
        let classified = self.classify(classifier, home, away, context)?;
        self.result_for(input, home, away, context, classified.for_space(input.bet_type.into()))
    }

    /// Predicts whichever of the two label spaces the classifier is more confident of. The bet type
    /// of the result is that of the chosen space.
    pub fn predict_best(
        &self,
        classifier: Option<&dyn Classifier>,
        input: &MatchInput,
        home: &TeamStats,
        away: &TeamStats,
        context: &MatchContext,
    ) -> Result<PredictionResult, PredictError> {
        let classified = self.classify(classifier, home, away, context)?;
        self.result_for(input, home, away, context, classified.best())
    }

    fn result_for(
        &self,
        input: &MatchInput,
        home: &TeamStats,
        away: &TeamStats,
        context: &MatchContext,
        outcome: &ClassifiedOutcome,
    ) -> Result<PredictionResult, PredictError> {
        let (home, away) = (home.clamped(), away.clamped());
        let strengths = Strengths::assess(&home, &away, context);
        let quoted_odds = context.odds.as_ref().map(|odds| odds.price(&outcome.label));
        let value = match quoted_odds {
            Some(price) => Some(self.detector.detect(outcome.probability(), price)?),
            None => None,
        };
        debug!(
            "{}: classified {} as {} at {:.1}",
            input.fixture(),
            outcome.space,
            outcome.label,
            outcome.confidence
        );

        Ok(PredictionResult {
            home_team: input.home_team.clone(),
            away_team: input.away_team.clone(),
            bet_type: outcome.space.bet_type(),
            prediction: outcome.label,
            confidence: outcome.confidence,
            risk_tier: self.risk_thresholds.classify(outcome.confidence),
            value_bet: value.as_ref().is_some_and(|value| value.is_value),
            factors: Factors {
                home_strength: strengths.home,
                away_strength: strengths.away,
                h2h_factor: strengths.h2h_factor,
                form_home: home.form,
                form_away: away.form,
                value,
                quoted_odds,
                probabilities: outcome.probabilities.clone(),
            },
        })
    }
}

/// Multinomial logistic scorer: one linear predictor per label, with the scores normalised by
/// softmax. Features are optionally standardised before scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearSoftmax {
    #[serde(default)]
    pub standardiser: Option<Standardiser>,
    pub match_result: Vec<Predictor<Feature>>,
    pub total_goals: Vec<Predictor<Feature>>,
}
impl LinearSoftmax {
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if let Some(standardiser) = &self.standardiser {
            standardiser.validate(Feature::COUNT)?;
        }
        for space in [LabelSpace::MatchResult, LabelSpace::TotalGoals] {
            let predictors = self.predictors(space);
            if predictors.len() != space.labels().len() {
                bail!(
                    "{space} requires {} predictors, got {}",
                    space.labels().len(),
                    predictors.len()
                );
            }
            for predictor in predictors {
                predictor.validate(Feature::COUNT)?;
            }
        }
        Ok(())
    }

    /// Reads the parameters from a JSON file and validates them.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, anyhow::Error> {
        let model: Self = read_json(path)?;
        model.validate()?;
        Ok(model)
    }

    fn predictors(&self, space: LabelSpace) -> &[Predictor<Feature>] {
        match space {
            LabelSpace::MatchResult => &self.match_result,
            LabelSpace::TotalGoals => &self.total_goals,
        }
    }
}

impl Classifier for LinearSoftmax {
    fn predict_proba(&self, space: LabelSpace, features: &FeatureVector) -> Result<Vec<f64>, anyhow::Error> {
        let input = match &self.standardiser {
            Some(standardiser) => standardiser.transform(features.as_slice()),
            None => features.as_slice().to_vec(),
        };
        let scores: Vec<_> = self
            .predictors(space)
            .iter()
            .map(|predictor| predictor.predict(&input))
            .collect();
        if scores.iter().any(|score| !score.is_finite()) {
            bail!("non-finite scores for {space}: {scores:?}");
        }
        Ok(softmax(&scores))
    }
}
