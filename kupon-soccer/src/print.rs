use stanza::style::HAlign::Left;
use stanza::style::{HAlign, Header, MinWidth, Styles};
use stanza::table::{Col, Row, Table};

use kupon::parlay::{risk_analysis, LegFailure, ParlayResult};

use crate::domain::PredictionResult;

pub fn tabulate_legs(legs: &[PredictionResult]) -> Table {
    let mut table = Table::default()
        .with_cols(vec![
            Col::new(Styles::default().with(MinWidth(3)).with(HAlign::Right)),
            Col::new(Styles::default().with(MinWidth(20)).with(Left)),
            Col::new(Styles::default().with(MinWidth(6)).with(Left)),
            Col::new(Styles::default().with(MinWidth(9)).with(Left)),
            Col::new(Styles::default().with(MinWidth(6)).with(HAlign::Right)),
            Col::new(Styles::default().with(MinWidth(6)).with(Left)),
            Col::new(Styles::default().with(MinWidth(6)).with(HAlign::Right)),
            Col::new(Styles::default().with(MinWidth(6)).with(HAlign::Right)),
        ])
        .with_row(Row::new(
            Styles::default().with(Header(true)),
            vec![
                "#".into(),
                "Fixture".into(),
                "Bet".into(),
                "Pick".into(),
                "Conf".into(),
                "Risk".into(),
                "Odds".into(),
                "Edge".into(),
            ],
        ));
    for (index, leg) in legs.iter().enumerate() {
        let odds = leg
            .factors
            .quoted_odds
            .map(|odds| format!("{odds:.2}"))
            .unwrap_or_else(|| "-".into());
        let edge = match &leg.factors.value {
            Some(value) if leg.value_bet => format!("{:+.3}*", value.edge),
            Some(value) => format!("{:+.3}", value.edge),
            None => "-".into(),
        };
        table.push_row(Row::new(
            Styles::default(),
            vec![
                format!("{}", index + 1).into(),
                leg.fixture().into(),
                leg.bet_type.to_string().into(),
                leg.prediction.to_string().into(),
                format!("{:.1}", leg.confidence).into(),
                leg.risk_tier.to_string().into(),
                odds.into(),
                edge.into(),
            ],
        ));
    }
    table
}

/// Strength and form behind each prediction.
pub fn tabulate_factors(legs: &[PredictionResult]) -> Table {
    let mut table = Table::default()
        .with_cols(vec![
            Col::new(Styles::default().with(MinWidth(20)).with(Left)),
            Col::new(Styles::default().with(MinWidth(6)).with(HAlign::Right)),
            Col::new(Styles::default().with(MinWidth(6)).with(HAlign::Right)),
            Col::new(Styles::default().with(MinWidth(5)).with(HAlign::Right)),
            Col::new(Styles::default().with(MinWidth(5)).with(HAlign::Right)),
            Col::new(Styles::default().with(MinWidth(5)).with(HAlign::Right)),
            Col::new(Styles::default().with(MinWidth(20)).with(Left)),
        ])
        .with_row(Row::new(
            Styles::default().with(Header(true)),
            vec![
                "Fixture".into(),
                "Home".into(),
                "Away".into(),
                "H2H".into(),
                "Form H".into(),
                "Form A".into(),
                "Probabilities".into(),
            ],
        ));
    for leg in legs {
        let factors = &leg.factors;
        let probabilities = factors
            .probabilities
            .iter()
            .map(|(label, prob)| format!("{label} {prob:.3}"))
            .collect::<Vec<_>>()
            .join(", ");
        table.push_row(Row::new(
            Styles::default(),
            vec![
                leg.fixture().into(),
                format!("{:.3}", factors.home_strength).into(),
                format!("{:.3}", factors.away_strength).into(),
                format!("{:.1}", factors.h2h_factor).into(),
                format!("{:.1}", factors.form_home).into(),
                format!("{:.1}", factors.form_away).into(),
                probabilities.into(),
            ],
        ));
    }
    table
}

pub fn tabulate_summary(parlay: &ParlayResult<PredictionResult>) -> Table {
    let mut table = Table::default().with_cols(vec![
        Col::new(Styles::default().with(MinWidth(15)).with(Left)),
        Col::new(Styles::default().with(MinWidth(10)).with(HAlign::Right)),
    ]);
    let rows = [
        ("Legs", parlay.leg_count.to_string()),
        ("Failed", parlay.failed.len().to_string()),
        ("Composite", format!("{:.2}", parlay.composite_confidence)),
        ("Recommendation", parlay.recommendation.to_string()),
        ("Risk", risk_analysis(&parlay.legs).to_string()),
    ];
    for (key, value) in rows {
        table.push_row(Row::new(Styles::default(), vec![key.into(), value.into()]));
    }
    table
}

pub fn tabulate_failures(failed: &[LegFailure]) -> Table {
    let mut table = Table::default()
        .with_cols(vec![
            Col::new(Styles::default().with(MinWidth(3)).with(HAlign::Right)),
            Col::new(Styles::default().with(MinWidth(20)).with(Left)),
            Col::new(Styles::default().with(MinWidth(30)).with(Left)),
        ])
        .with_row(Row::new(
            Styles::default().with(Header(true)),
            vec!["#".into(), "Fixture".into(), "Reason".into()],
        ));
    for failure in failed {
        table.push_row(Row::new(
            Styles::default(),
            vec![
                format!("{}", failure.index + 1).into(),
                failure.leg.clone().into(),
                failure.reason.clone().into(),
            ],
        ));
    }
    table
}
