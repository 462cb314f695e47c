//! Two-parameter logistic (2PL) item response model.
//!
//! P(A | θ) = 1 / (1 + exp(−a·(θ − b)))
//!
//! "A" is the dimension's first pole, so positive theta favours E, S, T and J.

use crate::model::{PsychometricItem, ResponseChoice};

/// Logit magnitude beyond which `exp` is clamped. `1 / (1 + e^35)` is still
/// representable and keeps log-likelihoods finite.
const MAX_LOGIT: f64 = 35.0;

/// Probability of endorsing the first pole at trait level `theta`.
pub fn probability(theta: f64, discrimination: f64, difficulty: f64) -> f64 {
    let logit = (discrimination * (theta - difficulty)).clamp(-MAX_LOGIT, MAX_LOGIT);
    1.0 / (1.0 + (-logit).exp())
}

/// Probability that `item` is answered toward the first pole.
pub fn item_probability(item: &PsychometricItem, theta: f64) -> f64 {
    probability(theta, item.discrimination, item.difficulty)
}

/// Fisher information of a 2PL item: a² · P · (1 − P).
pub fn fisher_information(theta: f64, discrimination: f64, difficulty: f64) -> f64 {
    let p = probability(theta, discrimination, difficulty);
    discrimination * discrimination * p * (1.0 - p)
}

pub fn item_information(item: &PsychometricItem, theta: f64) -> f64 {
    fisher_information(theta, item.discrimination, item.difficulty)
}

/// Probability of the observed choice on `item` at `theta`.
pub fn response_probability(item: &PsychometricItem, choice: ResponseChoice, theta: f64) -> f64 {
    let p = item_probability(item, theta);
    if item.endorses_first_pole(choice) {
        p
    } else {
        1.0 - p
    }
}

/// Natural log of [`response_probability`].
pub fn response_log_likelihood(item: &PsychometricItem, choice: ResponseChoice, theta: f64) -> f64 {
    response_probability(item, choice, theta).ln()
}
