//! Response-quality detection over a complete session.
//!
//! Three independent checks run once at finalisation:
//!
//! | Check | Signal | Flag |
//! |-------|--------|------|
//! | Response time | too many sub-threshold latencies, or near-constant latencies | `suspicious_response_times` |
//! | Person fit | standardised log-likelihood l_z, likelihood ratio against coin flips | `low_consistency` |
//! | Social desirability | share of desirable-pole choices on tagged items | `social_desirability` |
//!
//! Detection never fails. Missing items or too few responses simply leave the
//! corresponding statistic empty.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::estimator::ThetaEstimate;
use crate::irt::item_probability;
use crate::model::{DimensionMap, ItemBank};
use crate::session::AdaptiveResponse;
use crate::statistics::{coefficient_of_variation, mean, median};

/// Thresholds for the validity checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidityConfig {
    /// Latencies below this are too fast to have read and weighed both options.
    #[serde(default = "default_min_latency_ms")]
    pub min_latency_ms: u64,
    /// Maximum tolerated share of too-fast responses.
    #[serde(default = "default_max_fast_fraction")]
    pub max_fast_fraction: f64,
    /// Latency coefficient of variation below this looks scripted.
    #[serde(default = "default_min_latency_cv")]
    pub min_latency_cv: f64,
    #[serde(default = "default_min_responses")]
    pub min_responses_for_timing: usize,
    /// l_z below this flags low consistency.
    #[serde(default = "default_min_person_fit")]
    pub min_person_fit: f64,
    /// Per-response likelihood relative to a coin flip below this flags low consistency.
    #[serde(default = "default_min_likelihood_ratio")]
    pub min_likelihood_ratio: f64,
    #[serde(default = "default_min_responses")]
    pub min_responses_for_fit: usize,
    /// Share of desirable-pole choices at or above which the flag is raised.
    #[serde(default = "default_desirability_threshold")]
    pub desirability_threshold: f64,
    #[serde(default = "default_min_desirability_items")]
    pub min_desirability_items: usize,
}

fn default_min_latency_ms() -> u64 {
    800
}
fn default_max_fast_fraction() -> f64 {
    0.3
}
fn default_min_latency_cv() -> f64 {
    0.1
}
fn default_min_responses() -> usize {
    8
}
fn default_min_person_fit() -> f64 {
    -2.0
}
fn default_min_likelihood_ratio() -> f64 {
    0.9
}
fn default_desirability_threshold() -> f64 {
    0.85
}
fn default_min_desirability_items() -> usize {
    4
}

impl Default for ValidityConfig {
    fn default() -> Self {
        Self {
            min_latency_ms: default_min_latency_ms(),
            max_fast_fraction: default_max_fast_fraction(),
            min_latency_cv: default_min_latency_cv(),
            min_responses_for_timing: default_min_responses(),
            min_person_fit: default_min_person_fit(),
            min_likelihood_ratio: default_min_likelihood_ratio(),
            min_responses_for_fit: default_min_responses(),
            desirability_threshold: default_desirability_threshold(),
            min_desirability_items: default_min_desirability_items(),
        }
    }
}

/// A named data-quality concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidityFlag {
    SuspiciousResponseTimes,
    LowConsistency,
    SocialDesirability,
}

/// How much a flag undermines the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagSeverity {
    /// Reported alongside the result; does not invalidate it.
    Advisory,
    /// Marks the result as not trustworthy.
    Invalidating,
}

impl ValidityFlag {
    pub fn severity(self) -> FlagSeverity {
        match self {
            ValidityFlag::SuspiciousResponseTimes | ValidityFlag::LowConsistency => {
                FlagSeverity::Invalidating
            }
            ValidityFlag::SocialDesirability => FlagSeverity::Advisory,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ValidityFlag::SuspiciousResponseTimes => {
                "responses were too fast or too uniform to reflect deliberate answers"
            }
            ValidityFlag::LowConsistency => {
                "the answer pattern does not fit a single coherent trait level"
            }
            ValidityFlag::SocialDesirability => {
                "answers consistently favoured the socially preferred option"
            }
        }
    }
}

impl fmt::Display for ValidityFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidityFlag::SuspiciousResponseTimes => write!(f, "suspicious_response_times"),
            ValidityFlag::LowConsistency => write!(f, "low_consistency"),
            ValidityFlag::SocialDesirability => write!(f, "social_desirability"),
        }
    }
}

/// Latency summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseTimeStats {
    pub count: usize,
    pub mean_ms: Option<f64>,
    pub median_ms: Option<f64>,
    /// Share of responses faster than `min_latency_ms`.
    pub fast_fraction: f64,
    pub coefficient_of_variation: Option<f64>,
}

/// Person-fit statistics across all dimensions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonFit {
    pub responses: usize,
    pub log_likelihood: f64,
    /// Standardised log-likelihood; `None` when its variance vanishes.
    pub lz: Option<f64>,
    /// Geometric-mean response likelihood divided by 0.5.
    pub likelihood_ratio: f64,
}

/// Overall validity verdict plus the statistics behind it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentValidity {
    pub is_valid: bool,
    pub flags: Vec<ValidityFlag>,
    pub response_times: ResponseTimeStats,
    pub person_fit: Option<PersonFit>,
    /// Share of desirable-pole choices among tagged items.
    pub desirability_rate: Option<f64>,
}

impl Default for AssessmentValidity {
    fn default() -> Self {
        Self {
            is_valid: true,
            flags: Vec::new(),
            response_times: ResponseTimeStats::default(),
            person_fit: None,
            desirability_rate: None,
        }
    }
}

impl AssessmentValidity {
    pub fn has_flag(&self, flag: ValidityFlag) -> bool {
        self.flags.contains(&flag)
    }
}

/// Run every check over the full response list.
pub fn assess_validity(
    responses: &[AdaptiveResponse],
    bank: &ItemBank,
    estimates: &DimensionMap<ThetaEstimate>,
    config: &ValidityConfig,
) -> AssessmentValidity {
    let mut flags = Vec::new();

    let (response_times, timing_suspect) = check_response_times(responses, config);
    if timing_suspect {
        flags.push(ValidityFlag::SuspiciousResponseTimes);
    }

    let person_fit = compute_person_fit(responses, bank, estimates, config);
    if let Some(fit) = &person_fit {
        let lz_low = fit.lz.is_some_and(|lz| lz < config.min_person_fit);
        if lz_low || fit.likelihood_ratio < config.min_likelihood_ratio {
            flags.push(ValidityFlag::LowConsistency);
        }
    }

    let desirability_rate = desirability_rate(responses, bank, config);
    if desirability_rate.is_some_and(|rate| rate >= config.desirability_threshold) {
        flags.push(ValidityFlag::SocialDesirability);
    }

    let is_valid = !flags
        .iter()
        .any(|f| f.severity() == FlagSeverity::Invalidating);

    if !flags.is_empty() {
        tracing::warn!(?flags, is_valid, "validity checks raised flags");
    }

    AssessmentValidity {
        is_valid,
        flags,
        response_times,
        person_fit,
        desirability_rate,
    }
}

fn check_response_times(responses: &[AdaptiveResponse], config: &ValidityConfig) -> (ResponseTimeStats, bool) {
    if responses.is_empty() {
        return (ResponseTimeStats::default(), false);
    }

    let latencies: Vec<f64> = responses.iter().map(|r| r.latency_ms as f64).collect();
    let fast = responses
        .iter()
        .filter(|r| r.latency_ms < config.min_latency_ms)
        .count();
    let fast_fraction = fast as f64 / responses.len() as f64;
    let cv = coefficient_of_variation(&latencies);

    let too_fast = fast_fraction > config.max_fast_fraction;
    let too_uniform = responses.len() >= config.min_responses_for_timing
        && cv.is_some_and(|cv| cv < config.min_latency_cv);

    let stats = ResponseTimeStats {
        count: responses.len(),
        mean_ms: mean(&latencies),
        median_ms: median(&latencies),
        fast_fraction,
        coefficient_of_variation: cv,
    };
    (stats, too_fast || too_uniform)
}

fn compute_person_fit(
    responses: &[AdaptiveResponse],
    bank: &ItemBank,
    estimates: &DimensionMap<ThetaEstimate>,
    config: &ValidityConfig,
) -> Option<PersonFit> {
    let mut observed = 0.0;
    let mut expected = 0.0;
    let mut variance = 0.0;
    let mut n = 0usize;

    for response in responses {
        let Some(item) = bank.get(&response.item_id) else {
            tracing::debug!(item_id = %response.item_id, "item missing from bank, skipped in person fit");
            continue;
        };
        let theta = estimates.get(item.dimension).theta;
        let p = item_probability(item, theta);
        let q = 1.0 - p;
        if p <= 0.0 || q <= 0.0 {
            continue;
        }
        let endorsed = item.endorses_first_pole(response.choice);
        observed += if endorsed { p.ln() } else { q.ln() };
        expected += p * p.ln() + q * q.ln();
        variance += p * q * (p / q).ln().powi(2);
        n += 1;
    }

    if n < config.min_responses_for_fit {
        return None;
    }

    let lz = (variance > 1e-9).then(|| (observed - expected) / variance.sqrt());
    let likelihood_ratio = 2.0 * (observed / n as f64).exp();

    Some(PersonFit {
        responses: n,
        log_likelihood: observed,
        lz,
        likelihood_ratio,
    })
}

fn desirability_rate(responses: &[AdaptiveResponse], bank: &ItemBank, config: &ValidityConfig) -> Option<f64> {
    let mut tagged = 0usize;
    let mut desirable = 0usize;
    for response in responses {
        let Some(item) = bank.get(&response.item_id) else {
            continue;
        };
        let Some(pole) = item.desirable_pole else {
            continue;
        };
        tagged += 1;
        if item.pole_for(response.choice) == pole {
            desirable += 1;
        }
    }
    if tagged < config.min_desirability_items {
        return None;
    }
    Some(desirable as f64 / tagged as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    use crate::estimator::{estimate_theta, Observation, Quadrature};
    use crate::model::{Dimension, PsychometricItem, ResponseChoice};

    const DIFFICULTIES: [f64; 6] = [-2.0, -1.2, -0.4, 0.4, 1.2, 2.0];

    fn bank() -> ItemBank {
        let mut items = Vec::new();
        for dimension in Dimension::ALL {
            for (i, b) in DIFFICULTIES.iter().enumerate() {
                items.push(PsychometricItem {
                    id: format!("{dimension}-{i}"),
                    dimension,
                    discrimination: 1.5,
                    difficulty: *b,
                    option_a: "a".into(),
                    option_b: "b".into(),
                    option_a_pole: dimension.first_pole(),
                    desirable_pole: match i {
                        0 => Some(dimension.first_pole()),
                        1 => Some(dimension.second_pole()),
                        _ => None,
                    },
                });
            }
        }
        ItemBank {
            id: "validity".into(),
            name: "Validity".into(),
            description: String::new(),
            items,
        }
    }

    fn respond(bank: &ItemBank, latency: impl Fn(usize) -> u64, choose: impl Fn(f64) -> ResponseChoice) -> Vec<AdaptiveResponse> {
        bank.items
            .iter()
            .enumerate()
            .map(|(i, item)| AdaptiveResponse {
                id: Uuid::new_v4(),
                session_id: Uuid::nil(),
                item_id: item.id.clone(),
                dimension: item.dimension,
                choice: choose(item.difficulty),
                latency_ms: latency(i),
                theta_before: 0.0,
                se_before: 1.0,
                theta_after: 0.0,
                se_after: 1.0,
                information: 0.0,
                presentation_order: i as u32 + 1,
                answered_at: Utc::now(),
            })
            .collect()
    }

    fn fitted(bank: &ItemBank, responses: &[AdaptiveResponse]) -> DimensionMap<ThetaEstimate> {
        DimensionMap::from_fn(|dimension| {
            let obs: Vec<_> = responses
                .iter()
                .filter(|r| r.dimension == dimension)
                .filter_map(|r| bank.get(&r.item_id).map(|item| Observation::new(item, r.choice)))
                .collect();
            estimate_theta(&obs, &Quadrature::default())
        })
    }

    fn natural_latency(i: usize) -> u64 {
        2_000 + (i as u64 * 379) % 2_500
    }

    fn consistent(b: f64) -> ResponseChoice {
        if b < 0.3 {
            ResponseChoice::A
        } else {
            ResponseChoice::B
        }
    }

    #[test]
    fn consistent_deliberate_session_is_valid() {
        let bank = bank();
        let responses = respond(&bank, natural_latency, consistent);
        let validity = assess_validity(&responses, &bank, &fitted(&bank, &responses), &ValidityConfig::default());
        assert!(validity.is_valid, "flags: {:?}", validity.flags);
        assert!(validity.flags.is_empty());
        let fit = validity.person_fit.unwrap();
        assert!(fit.likelihood_ratio > 1.0);
        assert!(fit.lz.unwrap() > 0.0);
    }

    #[test]
    fn sub_300ms_latencies_flag_response_times() {
        let bank = bank();
        let responses = respond(&bank, |i| 120 + (i as u64 * 37) % 170, consistent);
        let validity = assess_validity(&responses, &bank, &fitted(&bank, &responses), &ValidityConfig::default());
        assert!(validity.has_flag(ValidityFlag::SuspiciousResponseTimes));
        assert!(!validity.is_valid);
        assert_eq!(validity.response_times.fast_fraction, 1.0);
    }

    #[test]
    fn a_single_fast_response_is_still_flagged() {
        let bank = bank();
        let responses = respond(&bank, |_| 250, consistent);
        let validity = assess_validity(&responses[..1], &bank, &fitted(&bank, &responses), &ValidityConfig::default());
        assert!(validity.has_flag(ValidityFlag::SuspiciousResponseTimes));
    }

    #[test]
    fn metronomic_latencies_look_scripted() {
        let bank = bank();
        let responses = respond(&bank, |i| 1_500 + (i as u64 % 3), consistent);
        let validity = assess_validity(&responses, &bank, &fitted(&bank, &responses), &ValidityConfig::default());
        assert!(validity.has_flag(ValidityFlag::SuspiciousResponseTimes));
        assert!(validity.response_times.coefficient_of_variation.unwrap() < 0.01);
    }

    #[test]
    fn reversed_pattern_has_low_consistency() {
        let bank = bank();
        let reversed = |b: f64| {
            if b > 0.3 {
                ResponseChoice::A
            } else {
                ResponseChoice::B
            }
        };
        let responses = respond(&bank, natural_latency, reversed);
        let validity = assess_validity(&responses, &bank, &fitted(&bank, &responses), &ValidityConfig::default());
        assert!(validity.has_flag(ValidityFlag::LowConsistency));
        assert!(!validity.is_valid);
        let fit = validity.person_fit.unwrap();
        assert!(fit.lz.unwrap() < -2.0);
        assert!(fit.likelihood_ratio < 0.9);
    }

    #[test]
    fn desirability_flag_is_advisory() {
        let mut bank = bank();
        // Tagged items sit at b = -2.0 and -1.2 where a consistent respondent
        // endorses the first pole; make that the desirable pole everywhere.
        for item in &mut bank.items {
            if item.desirable_pole.is_some() {
                item.desirable_pole = Some(item.dimension.first_pole());
            }
        }
        let responses = respond(&bank, natural_latency, consistent);
        let validity = assess_validity(&responses, &bank, &fitted(&bank, &responses), &ValidityConfig::default());
        assert_eq!(validity.desirability_rate, Some(1.0));
        assert!(validity.has_flag(ValidityFlag::SocialDesirability));
        assert!(validity.is_valid, "advisory flags must not invalidate");
    }

    #[test]
    fn empty_session_is_valid_without_statistics() {
        let bank = bank();
        let estimates = DimensionMap::from_fn(|_| ThetaEstimate::PRIOR);
        let validity = assess_validity(&[], &bank, &estimates, &ValidityConfig::default());
        assert!(validity.is_valid);
        assert!(validity.person_fit.is_none());
        assert!(validity.desirability_rate.is_none());
    }

    #[test]
    fn unknown_items_are_skipped_not_fatal() {
        let bank = bank();
        let mut responses = respond(&bank, natural_latency, consistent);
        for r in &mut responses {
            r.item_id = format!("missing-{}", r.item_id);
        }
        let estimates = DimensionMap::from_fn(|_| ThetaEstimate::PRIOR);
        let validity = assess_validity(&responses, &bank, &estimates, &ValidityConfig::default());
        assert!(validity.person_fit.is_none());
        assert!(validity.is_valid);
    }

    #[test]
    fn severity_mapping() {
        assert_eq!(ValidityFlag::LowConsistency.severity(), FlagSeverity::Invalidating);
        assert_eq!(ValidityFlag::SocialDesirability.severity(), FlagSeverity::Advisory);
        assert_eq!(ValidityFlag::SuspiciousResponseTimes.to_string(), "suspicious_response_times");
    }
}
