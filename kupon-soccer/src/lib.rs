pub mod classifier;
pub mod domain;
pub mod engine;
pub mod head_to_head;
pub mod predict;
pub mod print;
pub mod provider;
pub mod strength;

#[cfg(test)]
pub(crate) mod testing;

#[doc = include_str!("../README.md")]
#[cfg(doc)]
fn readme() {}
