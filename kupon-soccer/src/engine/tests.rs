use assert_float_eq::*;

use kupon::parlay::{risk_analysis, Recommendation};
use kupon::tier::RiskTier;

use crate::classifier::{FeatureVector, LabelSpace};
use crate::domain::Label;
use crate::testing::*;

use super::*;

struct Constant;

impl Classifier for Constant {
    fn predict_proba(&self, space: LabelSpace, _: &FeatureVector) -> Result<Vec<f64>, anyhow::Error> {
        match space {
            LabelSpace::MatchResult => Ok(vec![0.6, 0.3, 0.1]),
            LabelSpace::TotalGoals => Ok(vec![0.45, 0.55]),
        }
    }
}

fn engine() -> Engine {
    Engine::new(EngineConfig::default(), TeamTable::sample()).unwrap()
}

fn derby_coupon() -> Vec<CouponLeg> {
    vec![
        CouponLeg::new("Galatasaray", "Fenerbahce", "1X2"),
        CouponLeg::new("Besiktas", "Trabzonspor", "1X2"),
    ]
}

#[test]
fn config_defaults() {
    let config: EngineConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(EngineConfig::default(), config);
    assert_eq!(RuleVariant::Simple, config.variant);
    assert_eq!(0.05, config.value_margin);
    assert_eq!(RiskThresholds::DEFAULT, config.risk_thresholds);
    config.validate().unwrap();
}

#[test]
fn config_from_json() {
    let config: EngineConfig = serde_json::from_str(
        r#"{"variant": "enhanced", "value_margin": 0.08, "risk_thresholds": {"low": 75, "medium": 60}}"#,
    )
    .unwrap();
    assert_eq!(RuleVariant::Enhanced, config.variant);
    assert_eq!(0.08, config.value_margin);
    assert_eq!(75.0, config.risk_thresholds.low);
    config.validate().unwrap();
}

#[test]
fn config_validation() {
    let negative_margin = EngineConfig {
        value_margin: -0.01,
        ..EngineConfig::default()
    };
    assert_eq!(
        "value margin must lie in [0, 1), got -0.01",
        negative_margin.validate().unwrap_err().to_string()
    );

    let inverted = EngineConfig {
        risk_thresholds: RiskThresholds {
            low: 50.0,
            medium: 60.0,
        },
        ..EngineConfig::default()
    };
    assert!(inverted.validate().is_err());

    let no_weather = EngineConfig {
        conditions: Conditions {
            weather_factor: 0.0,
            referee_factor: 1.0,
        },
        ..EngineConfig::default()
    };
    assert!(Engine::new(no_weather, TeamTable::default()).is_err());
}

#[test]
fn parse_strategy() {
    assert_eq!(Strategy::RuleBased(RuleVariant::Simple), "simple".parse().unwrap());
    assert_eq!(Strategy::RuleBased(RuleVariant::Enhanced), "ENHANCED".parse().unwrap());
    assert_eq!(Strategy::Classifier, "classifier".parse().unwrap());
    assert_eq!(
        "unsupported strategy 'oracle'",
        "oracle".parse::<Strategy>().unwrap_err().to_string()
    );
    assert_eq!("enhanced", Strategy::RuleBased(RuleVariant::Enhanced).to_string());
    assert_eq!("classifier", Strategy::Classifier.to_string());
}

#[test]
fn predict_resolves_teams_from_table() {
    let engine = engine();
    let input = MatchInput::new("Galatasaray", "Fenerbahce", BetType::OneXTwo);
    let result = engine
        .predict(&engine.default_strategy(), &input, &MatchContext::default())
        .unwrap();
    assert_eq!(Label::Home, result.prediction);
    assert_float_absolute_eq!(77.3333, result.confidence, 1e-4);
}

#[test]
fn unknown_team_plays_as_neutral() {
    let engine = engine();
    let input = MatchInput::new("Kasimpasa", "Galatasaray", BetType::OneXTwo);
    let result = engine
        .predict(&engine.default_strategy(), &input, &MatchContext::default())
        .unwrap();
    assert_eq!(5.0, result.factors.home_strength);
    assert_float_absolute_eq!(7.8333, result.factors.away_strength, 1e-4);
    assert_eq!(Label::Away, result.prediction);
    assert_eq!(80.0, result.confidence);
}

#[test]
fn configured_margin_and_thresholds_apply() {
    let config = EngineConfig {
        value_margin: 0.1,
        risk_thresholds: RiskThresholds {
            low: 80.0,
            medium: 70.0,
        },
        ..EngineConfig::default()
    };
    let engine = Engine::new(config, TeamTable::sample()).unwrap();
    let input = MatchInput::new("Galatasaray", "Fenerbahce", BetType::OneXTwo);
    let result = engine
        .predict(&engine.default_strategy(), &input, &with_odds(sample_odds()))
        .unwrap();
    assert_float_absolute_eq!(0.0746, result.factors.value.as_ref().unwrap().edge, 1e-4);
    assert!(!result.value_bet);
    assert_eq!(RiskTier::Medium, result.risk_tier);
}

#[test]
fn coupon_under_default_strategy() {
    let engine = engine();
    let parlay = engine.evaluate_coupon(&engine.default_strategy(), &derby_coupon());
    assert_eq!(2, parlay.leg_count);
    assert!(parlay.failed.is_empty());
    assert_eq!("Galatasaray v Fenerbahce", parlay.legs[0].fixture());
    assert_eq!("Besiktas v Trabzonspor", parlay.legs[1].fixture());
    assert_float_absolute_eq!(45.7556, parlay.composite_confidence, 1e-4);
    assert_eq!(Recommendation::Playable, parlay.recommendation);
    assert_eq!(RiskTier::Medium, risk_analysis(&parlay.legs));
}

#[test]
fn coupon_leg_overrides() {
    let engine = engine();
    let mut leg = CouponLeg::new("Galatasaray", "Besiktas", "1X2").with_odds(sample_odds());
    let parlay = engine.evaluate_coupon(&Strategy::RuleBased(RuleVariant::Enhanced), &[leg.clone()]);
    assert_eq!(Label::Home, parlay.legs[0].prediction);
    assert_eq!(85.0, parlay.composite_confidence);

    leg.home_stats = Some(flat(5.0));
    leg.away_stats = Some(flat(9.0));
    let parlay = engine.evaluate_coupon(&Strategy::RuleBased(RuleVariant::Enhanced), &[leg]);
    assert_eq!(Label::Away, parlay.legs[0].prediction);
}

#[test]
fn failed_legs_are_reported_and_excluded() {
    let engine = engine();
    let legs = vec![
        CouponLeg::new("Galatasaray", "Fenerbahce", "1X2"),
        CouponLeg::new("Besiktas", "Trabzonspor", "HT/FT"),
        CouponLeg::new("Trabzonspor", "Basaksehir", "1X2").with_odds(OddsQuote {
            draw: 0.5,
            ..sample_odds()
        }),
        CouponLeg::new("Basaksehir", "Besiktas", "1X2").with_odds(OddsQuote {
            home: 1.0,
            ..sample_odds()
        }),
    ];
    let parlay = engine.evaluate_coupon(&engine.default_strategy(), &legs);
    assert_eq!(1, parlay.leg_count);
    assert_eq!("Galatasaray v Fenerbahce", parlay.legs[0].fixture());
    assert_float_absolute_eq!(77.3333, parlay.composite_confidence, 1e-4);
    assert_eq!(Recommendation::Playable, parlay.recommendation);

    assert_eq!(vec![1, 2, 3], parlay.failed.iter().map(|failure| failure.index).collect::<Vec<_>>());
    assert_eq!("Besiktas v Trabzonspor", parlay.failed[0].leg);
    assert_eq!("unsupported bet type 'HT/FT'", parlay.failed[0].reason);
    assert_eq!(
        "invalid decimal odds 0.5: a price must be finite and greater than 1",
        parlay.failed[1].reason
    );
    assert_eq!(
        "leg 4 (Basaksehir v Besiktas): invalid decimal odds 1: a price must be finite and greater than 1",
        parlay.failed[2].to_string()
    );
}

#[test]
fn empty_coupon_has_nothing_to_recommend() {
    let engine = engine();
    let parlay = engine.evaluate_coupon(&engine.default_strategy(), &[]);
    assert!(parlay.is_degenerate());
    assert_eq!(100.0, parlay.composite_confidence);
    assert_eq!(Recommendation::NothingToRecommend, parlay.recommendation);
}

#[test]
fn classifier_strategy_without_classifier() {
    let engine = engine();
    assert!(!engine.has_classifier());
    let parlay = engine.evaluate_coupon(&Strategy::Classifier, &derby_coupon());
    assert!(parlay.is_degenerate());
    assert_eq!(2, parlay.failed.len());
    assert_eq!("no trained classifier is available", parlay.failed[0].reason);
    assert_eq!(Recommendation::NothingToRecommend, parlay.recommendation);

    assert_eq!(
        PredictError::ModelUnavailable,
        engine
            .classify("Galatasaray", "Fenerbahce", &MatchContext::default())
            .unwrap_err()
    );
}

#[test]
fn classifier_strategy_plays_best_label_space() {
    let engine = engine().with_classifier(Constant);
    assert!(engine.has_classifier());

    let classified = engine
        .classify("Galatasaray", "Fenerbahce", &MatchContext::default())
        .unwrap();
    assert_eq!(Label::Home, classified.match_result.label);
    assert_eq!(Label::Over2_5, classified.total_goals.label);

    let mut legs = derby_coupon();
    legs[1].bet_type = "O/U2.5".into();
    let parlay = engine.evaluate_coupon(&Strategy::Classifier, &legs);
    assert_eq!(2, parlay.leg_count);
    for leg in &parlay.legs {
        assert_eq!(BetType::OneXTwo, leg.bet_type);
        assert_eq!(Label::Home, leg.prediction);
        assert_float_absolute_eq!(60.0, leg.confidence, 1e-9);
    }
    assert_float_absolute_eq!(36.0, parlay.composite_confidence, 1e-9);
    assert_eq!(Recommendation::Strong, parlay.recommendation);

    legs.push(CouponLeg::new("Trabzonspor", "Basaksehir", "1X2"));
    let parlay = engine.evaluate_coupon(&Strategy::Classifier, &legs);
    assert_float_absolute_eq!(21.6, parlay.composite_confidence, 1e-9);
    assert_eq!(Recommendation::Moderate, parlay.recommendation);
}

#[test]
fn classifier_strategy_for_named_bet_type() {
    let engine = engine().with_classifier(Constant);
    let input = MatchInput::new("Galatasaray", "Fenerbahce", BetType::OverUnder2_5);
    let result = engine
        .predict(&Strategy::Classifier, &input, &MatchContext::default())
        .unwrap();
    assert_eq!(Label::Over2_5, result.prediction);
    assert_float_absolute_eq!(55.0, result.confidence, 1e-9);
}

#[test]
fn coupon_leg_from_json() {
    let leg: CouponLeg = serde_json::from_str(
        r#"{"home_team": "Galatasaray", "away_team": "Fenerbahce",
            "odds": {"home": 2.1, "draw": 3.2, "away": 4.5, "over_2_5": 1.8, "under_2_5": 2.0}}"#,
    )
    .unwrap();
    assert_eq!("1X2", leg.bet_type);
    assert_eq!(Some(sample_odds()), leg.odds);
    assert_eq!(None, leg.head_to_head);
    assert_eq!(BetType::OneXTwo, leg.input().unwrap().bet_type);
}

#[test]
fn evaluate_demo_coupon() {
    use kupon::file::ReadJsonFile;

    let demos = concat!(env!("CARGO_MANIFEST_DIR"), "/../demos");
    let config = EngineConfig::read_json_file(format!("{demos}/config.json")).unwrap();
    let teams = TeamTable::read_json_file(format!("{demos}/teams.json")).unwrap();
    let legs = Vec::<CouponLeg>::read_json_file(format!("{demos}/coupon.json")).unwrap();
    assert_eq!(RuleVariant::Enhanced, config.variant);
    assert_eq!(TeamTable::sample(), teams);
    assert_eq!(4, legs.len());
    assert_eq!("1X2", legs[2].bet_type);

    let engine = Engine::new(config, teams).unwrap();
    let parlay = engine.evaluate_coupon(&engine.default_strategy(), &legs);
    assert_eq!(4, parlay.leg_count);
    assert!(parlay.failed.is_empty());
}
