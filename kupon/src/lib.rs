//! Betting math shared by the match predictors: implied probabilities and value detection for
//! decimal odds, confidence-based risk tiers, and aggregation of independent legs into a
//! parlay (coupon) with a recommendation.

pub mod file;
pub mod linear;
pub mod market;
pub mod parlay;
pub mod tier;

#[cfg(test)]
pub(crate) mod testing;

#[doc = include_str!("../../README.md")]
#[cfg(doc)]
fn readme() {}
