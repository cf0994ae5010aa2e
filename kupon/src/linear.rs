//! Linear scoring of feature vectors and conversion of class scores to probabilities.

use core::fmt::Debug;

use anyhow::bail;
use serde::{Deserialize, Serialize};

pub trait AsIndex {
    fn as_index(&self) -> usize;
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub enum Regressor<O: AsIndex> {
    Ordinal(O),
    Exp(Box<Regressor<O>>, i32),
    Product(Vec<Regressor<O>>),
    Intercept,
}
impl<O: AsIndex> Regressor<O> {
    pub fn resolve(&self, input: &[f64]) -> f64 {
        match self {
            Regressor::Ordinal(ordinal) => input[ordinal.as_index()],
            Regressor::Exp(regressor, power) => regressor.resolve(input).powi(*power),
            Regressor::Product(regressors) => regressors
                .iter()
                .map(|regressor| regressor.resolve(input))
                .product(),
            Regressor::Intercept => 1.,
        }
    }

    fn max_index(&self) -> Option<usize> {
        match self {
            Regressor::Ordinal(ordinal) => Some(ordinal.as_index()),
            Regressor::Exp(regressor, _) => regressor.max_index(),
            Regressor::Product(regressors) => regressors
                .iter()
                .filter_map(Regressor::max_index)
                .max(),
            Regressor::Intercept => None,
        }
    }
}

/// A weighted sum of regressors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Predictor<O: AsIndex> {
    pub regressors: Vec<Regressor<O>>,
    pub coefficients: Vec<f64>,
}
impl<O: AsIndex> Predictor<O> {
    pub fn validate(&self, input_len: usize) -> Result<(), anyhow::Error> {
        if self.regressors.len() != self.coefficients.len() {
            bail!("exactly one coefficient must be specified for each regressor");
        }
        if self.coefficients.iter().any(|coefficient| !coefficient.is_finite()) {
            bail!("coefficients must be finite");
        }
        if let Some(max_index) = self.regressors.iter().filter_map(Regressor::max_index).max() {
            if max_index >= input_len {
                bail!("regressor references input {max_index}, but only {input_len} inputs are available");
            }
        }
        Ok(())
    }

    pub fn predict(&self, input: &[f64]) -> f64 {
        self.regressors
            .iter()
            .zip(self.coefficients.iter())
            .map(|(regressor, coefficient)| coefficient * regressor.resolve(input))
            .sum()
    }
}

/// Centres and scales each input by a fitted mean and standard deviation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Standardiser {
    pub means: Vec<f64>,
    pub scales: Vec<f64>,
}
impl Standardiser {
    pub fn validate(&self, input_len: usize) -> Result<(), anyhow::Error> {
        if self.means.len() != input_len || self.scales.len() != input_len {
            bail!(
                "standardiser must have {input_len} means and scales, got {} and {}",
                self.means.len(),
                self.scales.len()
            );
        }
        if self.scales.iter().any(|&scale| !scale.is_finite() || scale <= 0.) {
            bail!("scales must be finite and positive");
        }
        Ok(())
    }

    pub fn transform(&self, input: &[f64]) -> Vec<f64> {
        input
            .iter()
            .zip(self.means.iter().zip(self.scales.iter()))
            .map(|(value, (mean, scale))| (value - mean) / scale)
            .collect()
    }
}

/// Normalised exponentials of `scores`. The maximum is subtracted first so that large scores do
/// not overflow.
pub fn softmax(scores: &[f64]) -> Vec<f64> {
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<_> = scores.iter().map(|score| (score - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|exp| exp / sum).collect()
}

/// Index of the largest value; the first one wins a tie. `None` for an empty slice.
pub fn argmax(values: &[f64]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (index, &value)| match best {
            Some((_, best_value)) if best_value >= value => best,
            _ => Some((index, value)),
        })
        .map(|(index, _)| index)
}
