//! Adjustments derived from past meetings between the two sides.

use crate::domain::HeadToHeadRecord;

pub const FAVOURED_FACTOR: f64 = 1.1;
pub const UNFAVOURED_FACTOR: f64 = 0.9;
pub const NEUTRAL_FACTOR: f64 = 1.0;

/// Multiplier for the home side's strength: it is boosted if the home side won more of the past
/// meetings, diminished if it won fewer, and left alone otherwise.
pub fn factor(h2h: &HeadToHeadRecord) -> f64 {
    if h2h.total_matches == 0 {
        return NEUTRAL_FACTOR;
    }
    match h2h.team1_wins.cmp(&h2h.team2_wins) {
        std::cmp::Ordering::Greater => FAVOURED_FACTOR,
        std::cmp::Ordering::Less => UNFAVOURED_FACTOR,
        std::cmp::Ordering::Equal => NEUTRAL_FACTOR,
    }
}

pub fn factor_or_neutral(h2h: Option<&HeadToHeadRecord>) -> f64 {
    h2h.map(factor).unwrap_or(NEUTRAL_FACTOR)
}

/// Shares of past meetings won by the home and away sides; both zero if they have never met.
pub fn win_ratios(h2h: &HeadToHeadRecord) -> (f64, f64) {
    if h2h.total_matches == 0 {
        return (0.0, 0.0);
    }
    let total = h2h.total_matches as f64;
    (h2h.team1_wins as f64 / total, h2h.team2_wins as f64 / total)
}
