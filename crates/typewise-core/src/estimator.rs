//! Expected-a-posteriori (EAP) theta estimation.
//!
//! The posterior over θ is evaluated on a fixed quadrature grid under a
//! standard normal prior. Log-likelihoods are accumulated per grid point and
//! shifted by their maximum before exponentiating, so long response histories
//! never underflow.
//!
//! Estimation is a pure function of the observation list: the same input
//! always produces bit-identical output.

use serde::{Deserialize, Serialize};

use crate::irt::{item_information, response_log_likelihood};
use crate::model::{PsychometricItem, ResponseChoice};

/// A point estimate of one latent trait.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThetaEstimate {
    /// Posterior mean.
    pub theta: f64,
    /// Posterior standard deviation.
    pub standard_error: f64,
    /// Sum of item information at `theta`.
    pub information: f64,
}

impl ThetaEstimate {
    /// The N(0, 1) prior, used before any response is recorded.
    pub const PRIOR: ThetaEstimate = ThetaEstimate {
        theta: 0.0,
        standard_error: 1.0,
        information: 0.0,
    };
}

impl Default for ThetaEstimate {
    fn default() -> Self {
        Self::PRIOR
    }
}

/// Integration grid for the posterior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quadrature {
    #[serde(default = "default_min")]
    pub min: f64,
    #[serde(default = "default_max")]
    pub max: f64,
    #[serde(default = "default_points")]
    pub points: usize,
}

fn default_min() -> f64 {
    -4.0
}

fn default_max() -> f64 {
    4.0
}

fn default_points() -> usize {
    81
}

impl Default for Quadrature {
    fn default() -> Self {
        Self {
            min: default_min(),
            max: default_max(),
            points: default_points(),
        }
    }
}

impl Quadrature {
    /// Grid spacing.
    pub fn step(&self) -> f64 {
        (self.max - self.min) / (self.points.max(2) - 1) as f64
    }

    /// Evenly spaced nodes from `min` to `max` inclusive.
    pub fn nodes(&self) -> impl Iterator<Item = f64> + '_ {
        let step = self.step();
        (0..self.points.max(2)).map(move |i| self.min + step * i as f64)
    }

    /// Whether `theta` lies within half a grid step of either bound.
    pub fn is_at_boundary(&self, theta: f64) -> bool {
        let margin = self.step() / 2.0;
        theta <= self.min + margin || theta >= self.max - margin
    }

    fn is_well_formed(&self) -> bool {
        self.points >= 2 && self.min.is_finite() && self.max.is_finite() && self.max > self.min
    }
}

/// One answered item.
#[derive(Debug, Clone, Copy)]
pub struct Observation<'a> {
    pub item: &'a PsychometricItem,
    pub choice: ResponseChoice,
}

impl<'a> Observation<'a> {
    pub fn new(item: &'a PsychometricItem, choice: ResponseChoice) -> Self {
        Self { item, choice }
    }
}

/// Compute the EAP estimate for one dimension's ordered response history.
///
/// With no observations the prior is returned unchanged. The posterior mean
/// is a weighted average of grid nodes and so never leaves the grid; use
/// [`Quadrature::is_at_boundary`] to detect estimates pressed against an end.
pub fn estimate_theta(observations: &[Observation<'_>], quadrature: &Quadrature) -> ThetaEstimate {
    if observations.is_empty() {
        return ThetaEstimate::PRIOR;
    }

    let grid = if quadrature.is_well_formed() {
        quadrature.clone()
    } else {
        tracing::warn!(?quadrature, "malformed quadrature grid, using default");
        Quadrature::default()
    };

    let log_posterior: Vec<(f64, f64)> = grid
        .nodes()
        .map(|theta| {
            let log_prior = -0.5 * theta * theta;
            let log_likelihood: f64 = observations
                .iter()
                .map(|obs| response_log_likelihood(obs.item, obs.choice, theta))
                .sum();
            (theta, log_prior + log_likelihood)
        })
        .collect();

    let peak = log_posterior
        .iter()
        .map(|&(_, lp)| lp)
        .fold(f64::NEG_INFINITY, f64::max);

    let weights: Vec<(f64, f64)> = log_posterior
        .iter()
        .map(|&(theta, lp)| (theta, (lp - peak).exp()))
        .collect();
    let total: f64 = weights.iter().map(|&(_, w)| w).sum();

    let mean = weights.iter().map(|&(theta, w)| theta * w).sum::<f64>() / total;
    let variance = weights
        .iter()
        .map(|&(theta, w)| (theta - mean).powi(2) * w)
        .sum::<f64>()
        / total;

    let information = observations
        .iter()
        .map(|obs| item_information(obs.item, mean))
        .sum();

    ThetaEstimate {
        theta: mean,
        standard_error: variance.max(0.0).sqrt(),
        information,
    }
}
