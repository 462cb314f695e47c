//! The adaptive testing engine.
//!
//! `AdaptiveEngine` holds only configuration. Every operation takes a session
//! snapshot plus whatever history it needs and returns a new value, so one
//! engine can serve any number of sessions concurrently. Callers must
//! serialise calls for a single session; the repository's version check is
//! the usual way to enforce that.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::EngineError;
use crate::estimator::{estimate_theta, Observation, Quadrature};
use crate::irt::item_information;
use crate::model::{Dimension, DimensionMap, ItemBank, PsychometricItem, ResponseChoice};
use crate::result::{calculate_result, AssessmentResult, AssessmentWarning};
use crate::selection::select_next_item;
use crate::session::{AdaptiveResponse, AdaptiveSession, SessionStatus};
use crate::stopping::{next_dimension, SchedulingPolicy, StopDecision, StoppingRules};
use crate::validity::{assess_validity, ValidityConfig};

/// Configuration for the adaptive engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// A dimension stops once its SE falls to or below this.
    #[serde(default = "default_se_threshold")]
    pub se_threshold: f64,
    /// Hard cap on items per dimension.
    #[serde(default = "default_max_items")]
    pub max_items_per_dimension: u32,
    #[serde(default)]
    pub scheduling: SchedulingPolicy,
    #[serde(default)]
    pub quadrature: Quadrature,
    #[serde(default)]
    pub validity: ValidityConfig,
}

fn default_se_threshold() -> f64 {
    0.35
}

fn default_max_items() -> u32 {
    12
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            se_threshold: default_se_threshold(),
            max_items_per_dimension: default_max_items(),
            scheduling: SchedulingPolicy::default(),
            quadrature: Quadrature::default(),
            validity: ValidityConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn stopping_rules(&self) -> StoppingRules {
        StoppingRules {
            se_threshold: self.se_threshold,
            max_items: self.max_items_per_dimension,
        }
    }
}

/// An answer posted back by the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseSubmission {
    pub item_id: String,
    /// The dimension the item was presented for.
    pub dimension: Dimension,
    pub choice: ResponseChoice,
    pub latency_ms: u64,
    pub answered_at: DateTime<Utc>,
}

/// Result of applying one response: the new session snapshot and the
/// response record to persist alongside it.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedResponse {
    pub session: AdaptiveSession,
    pub response: AdaptiveResponse,
}

/// Outcome of finalising a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalizedAssessment {
    pub result: AssessmentResult,
    pub is_valid: bool,
    pub warnings: Vec<AssessmentWarning>,
}

/// Ids of every item already answered.
pub fn administered_ids(responses: &[AdaptiveResponse]) -> HashSet<String> {
    responses.iter().map(|r| r.item_id.clone()).collect()
}

/// The adaptive engine.
#[derive(Debug, Clone, Default)]
pub struct AdaptiveEngine {
    config: EngineConfig,
}

impl AdaptiveEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Create a session with neutral priors on all four dimensions.
    pub fn initialize_session(&self, user_id: &str, tenant_id: &str) -> AdaptiveSession {
        let session = AdaptiveSession::new(user_id, tenant_id, Utc::now());
        tracing::info!(session_id = %session.id, user_id, tenant_id, "session started");
        session
    }

    /// Evaluate the stopping rules for one dimension given how many of its
    /// items remain unadministered.
    pub fn should_stop_dimension(
        &self,
        session: &AdaptiveSession,
        dimension: Dimension,
        remaining_items: usize,
    ) -> StopDecision {
        self.config
            .stopping_rules()
            .evaluate(session, dimension, remaining_items)
    }

    /// The dimension to test next, or `None` when every dimension has stopped.
    pub fn next_dimension(
        &self,
        session: &AdaptiveSession,
        bank: &ItemBank,
        administered: &HashSet<String>,
    ) -> Option<Dimension> {
        next_dimension(session, self.config.scheduling, |dimension| {
            self.should_stop_dimension(session, dimension, bank.remaining_for(dimension, administered))
        })
    }

    /// The next item to present and the dimension it measures. `None` means
    /// the assessment is complete, or the session is no longer active.
    pub fn next_item<'b>(
        &self,
        session: &AdaptiveSession,
        bank: &'b ItemBank,
        administered: &HashSet<String>,
    ) -> Option<(&'b PsychometricItem, Dimension)> {
        if !session.is_active() {
            return None;
        }
        let dimension = self.next_dimension(session, bank, administered)?;
        let theta = session.estimate(dimension).theta;
        select_next_item(theta, bank.items_for(dimension), administered).map(|item| (item, dimension))
    }

    /// Apply one answer and re-estimate the answered dimension.
    ///
    /// `history` is the session's prior responses; only entries for the
    /// submitted dimension feed the estimate. Answers for a dimension whose
    /// stopping rule has already fired are refused. The input session is
    /// left untouched whether or not the call succeeds.
    pub fn process_response(
        &self,
        session: &AdaptiveSession,
        bank: &ItemBank,
        submission: ResponseSubmission,
        history: &[AdaptiveResponse],
    ) -> Result<ProcessedResponse, EngineError> {
        session.ensure_active()?;

        let item = bank
            .get(&submission.item_id)
            .ok_or_else(|| EngineError::UnknownItem(submission.item_id.clone()))?;
        if history.iter().any(|r| r.item_id == item.id) {
            return Err(EngineError::ItemAlreadyAdministered(item.id.clone()));
        }
        if item.dimension != submission.dimension {
            return Err(EngineError::DimensionMismatch {
                item_id: item.id.clone(),
                expected: submission.dimension,
                actual: item.dimension,
            });
        }

        let dimension = item.dimension;
        let remaining = bank.remaining_for(dimension, &administered_ids(history));
        let decision = self.should_stop_dimension(session, dimension, remaining);
        if decision.stop {
            return Err(EngineError::DimensionStopped {
                dimension,
                reason: decision.reason,
            });
        }
        let mut observations: Vec<Observation<'_>> = history
            .iter()
            .filter(|r| r.dimension == dimension)
            .filter_map(|r| match bank.get(&r.item_id) {
                Some(prior) => Some(Observation::new(prior, r.choice)),
                None => {
                    tracing::warn!(item_id = %r.item_id, "history references an item missing from the bank");
                    None
                }
            })
            .collect();
        observations.push(Observation::new(item, submission.choice));

        let before = session.estimate(dimension);
        let after = estimate_theta(&observations, &self.config.quadrature);
        if self.config.quadrature.is_at_boundary(after.theta) {
            tracing::warn!(
                session_id = %session.id,
                %dimension,
                theta = after.theta,
                "estimate at integration grid boundary"
            );
        }
        tracing::debug!(
            session_id = %session.id,
            %dimension,
            item_id = %item.id,
            choice = %submission.choice,
            theta = after.theta,
            se = after.standard_error,
            "theta updated"
        );

        let response = AdaptiveResponse {
            id: Uuid::new_v4(),
            session_id: session.id,
            item_id: item.id.clone(),
            dimension,
            choice: submission.choice,
            latency_ms: submission.latency_ms,
            theta_before: before.theta,
            se_before: before.standard_error,
            theta_after: after.theta,
            se_after: after.standard_error,
            information: item_information(item, before.theta),
            presentation_order: session.responses_recorded + 1,
            answered_at: submission.answered_at,
        };
        let next = session.with_estimate(dimension, after, session.items_administered(dimension) + 1);

        Ok(ProcessedResponse {
            session: next,
            response,
        })
    }

    /// Score a session from its final estimates and full response list.
    ///
    /// Pure: no clock reads and no randomness, so finalising the same
    /// session and responses twice gives identical output. Abandoned
    /// sessions are refused. An in-progress session may be finalised early;
    /// dimensions still short of a stopping rule are reported as warnings.
    pub fn finalize(
        &self,
        session: &AdaptiveSession,
        responses: &[AdaptiveResponse],
        bank: &ItemBank,
    ) -> Result<FinalizedAssessment, EngineError> {
        if session.status == SessionStatus::Abandoned {
            return Err(EngineError::SessionNotActive(session.status));
        }

        let estimates = DimensionMap::from_fn(|d| session.estimate(d));
        let validity = assess_validity(responses, bank, &estimates, &self.config.validity);
        let administered = administered_ids(responses);

        let mut warnings = Vec::new();
        for dimension in Dimension::ALL {
            let estimate = session.estimate(dimension);
            let remaining = bank.remaining_for(dimension, &administered);
            let decision = self.should_stop_dimension(session, dimension, remaining);
            // The pool can run dry on the same answer that hits the item cap,
            // so exhaustion is judged on its own rather than from the reason.
            if remaining == 0 && estimate.standard_error > self.config.se_threshold {
                tracing::warn!(
                    %dimension,
                    se = estimate.standard_error,
                    reason = %decision.reason,
                    "item pool exhausted before precision target"
                );
                warnings.push(AssessmentWarning::InsufficientItems {
                    dimension,
                    standard_error: estimate.standard_error,
                    threshold: self.config.se_threshold,
                });
            } else if !decision.stop {
                warnings.push(AssessmentWarning::Incomplete {
                    dimension,
                    items_administered: session.items_administered(dimension),
                });
            }
            if self.config.quadrature.is_at_boundary(estimate.theta) {
                warnings.push(AssessmentWarning::BoundaryEstimate {
                    dimension,
                    theta: estimate.theta,
                });
            }
        }
        warnings.extend(
            validity
                .flags
                .iter()
                .map(|flag| AssessmentWarning::ValiditySuspect { flag: *flag }),
        );

        let is_valid = validity.is_valid;
        let result = calculate_result(session.id, &session.dimensions, responses, validity, session.started_at);

        tracing::info!(
            session_id = %session.id,
            type_code = %result.type_code,
            confidence = result.overall_confidence,
            is_valid,
            warnings = warnings.len(),
            "session finalized"
        );

        Ok(FinalizedAssessment {
            result,
            is_valid,
            warnings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Pole;
    use crate::stopping::StopReason;

    fn bank(per_dimension: usize) -> ItemBank {
        let items = Dimension::ALL
            .into_iter()
            .flat_map(|dimension| {
                (0..per_dimension).map(move |i| PsychometricItem {
                    id: format!("{}-{i}", dimension.to_string().to_lowercase()),
                    dimension,
                    discrimination: 1.2 + 0.1 * i as f64,
                    difficulty: -1.75 + 0.5 * i as f64,
                    option_a: format!("{} option", dimension.first_pole()),
                    option_b: format!("{} option", dimension.second_pole()),
                    option_a_pole: dimension.first_pole(),
                    desirable_pole: None,
                })
            })
            .collect();
        ItemBank {
            id: "test".into(),
            name: "Test bank".into(),
            description: String::new(),
            items,
        }
    }

    fn submit(item: &PsychometricItem, choice: ResponseChoice, order: u32) -> ResponseSubmission {
        ResponseSubmission {
            item_id: item.id.clone(),
            dimension: item.dimension,
            choice,
            latency_ms: 1500 + u64::from(order * 379 % 2500),
            answered_at: DateTime::from_timestamp(1_700_000_000 + i64::from(order) * 5, 0).unwrap(),
        }
    }

    /// Answer every session item deterministically from fixed true thetas.
    fn run_to_completion(
        engine: &AdaptiveEngine,
        bank: &ItemBank,
        truth: DimensionMap<f64>,
    ) -> (AdaptiveSession, Vec<AdaptiveResponse>) {
        let mut session = engine.initialize_session("user", "tenant");
        let mut responses: Vec<AdaptiveResponse> = Vec::new();
        let mut administered = HashSet::new();
        while let Some((item, _)) = engine.next_item(&session, bank, &administered) {
            let endorse_first = *truth.get(item.dimension) >= item.difficulty;
            let choice = if endorse_first == item.option_a_pole.is_first() {
                ResponseChoice::A
            } else {
                ResponseChoice::B
            };
            let order = session.responses_recorded;
            let processed = engine
                .process_response(&session, bank, submit(item, choice, order), &responses)
                .unwrap();
            administered.insert(item.id.clone());
            responses.push(processed.response);
            session = processed.session;
        }
        (session, responses)
    }

    fn intj_truth() -> DimensionMap<f64> {
        DimensionMap {
            ei: -1.1,
            sn: -0.8,
            tf: 0.6,
            jp: 1.4,
        }
    }

    #[test]
    fn config_defaults_from_empty_toml() {
        let config: EngineConfig = toml::from_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.se_threshold, 0.35);
        assert_eq!(config.max_items_per_dimension, 12);
        assert_eq!(config.scheduling, SchedulingPolicy::RoundRobin);
    }

    #[test]
    fn config_partial_toml() {
        let config: EngineConfig = toml::from_str(
            "se_threshold = 0.3\nscheduling = \"least_precise\"\n[validity]\nmin_latency_ms = 500\n",
        )
        .unwrap();
        assert_eq!(config.se_threshold, 0.3);
        assert_eq!(config.scheduling, SchedulingPolicy::LeastPrecise);
        assert_eq!(config.validity.min_latency_ms, 500);
        assert_eq!(config.validity.max_fast_fraction, 0.3);
    }

    #[test]
    fn first_item_is_most_informative_ei_item() {
        let engine = AdaptiveEngine::default();
        let bank = bank(8);
        let session = engine.initialize_session("u", "t");
        let (item, dimension) = engine.next_item(&session, &bank, &HashSet::new()).unwrap();
        assert_eq!(dimension, Dimension::EI);
        assert_eq!(item.id, "ei-4");
    }

    #[test]
    fn process_response_updates_one_dimension() {
        let engine = AdaptiveEngine::default();
        let bank = bank(8);
        let session = engine.initialize_session("u", "t");
        let item = bank.get("sn-4").unwrap();

        let processed = engine
            .process_response(&session, &bank, submit(item, ResponseChoice::B, 0), &[])
            .unwrap();

        let sn = processed.session.estimate(Dimension::SN);
        assert!(sn.theta < 0.0, "choosing N should move theta towards N");
        assert!(sn.standard_error < 1.0);
        assert_eq!(processed.session.items_administered(Dimension::SN), 1);
        assert_eq!(processed.session.estimate(Dimension::EI), session.estimate(Dimension::EI));
        assert_eq!(processed.session.version, session.version + 1);

        let r = &processed.response;
        assert_eq!(r.presentation_order, 1);
        assert_eq!(r.theta_before, 0.0);
        assert_eq!(r.se_before, 1.0);
        assert_eq!(r.theta_after, sn.theta);
        assert_eq!(r.session_id, session.id);
    }

    #[test]
    fn history_from_other_dimensions_is_ignored() {
        let engine = AdaptiveEngine::default();
        let bank = bank(8);
        let session = engine.initialize_session("u", "t");
        let ei = engine
            .process_response(&session, &bank, submit(bank.get("ei-2").unwrap(), ResponseChoice::A, 0), &[])
            .unwrap();

        let with_history = engine
            .process_response(
                &ei.session,
                &bank,
                submit(bank.get("tf-3").unwrap(), ResponseChoice::A, 1),
                std::slice::from_ref(&ei.response),
            )
            .unwrap();
        let without_history = engine
            .process_response(&session, &bank, submit(bank.get("tf-3").unwrap(), ResponseChoice::A, 1), &[])
            .unwrap();

        assert_eq!(
            with_history.session.estimate(Dimension::TF),
            without_history.session.estimate(Dimension::TF)
        );
        assert_eq!(with_history.response.presentation_order, 2);
    }

    #[test]
    fn rejects_unknown_mismatched_and_repeated_items() {
        let engine = AdaptiveEngine::default();
        let bank = bank(4);
        let session = engine.initialize_session("u", "t");
        let item = bank.get("jp-1").unwrap();

        let mut unknown = submit(item, ResponseChoice::A, 0);
        unknown.item_id = "nope".into();
        assert_eq!(
            engine.process_response(&session, &bank, unknown, &[]).unwrap_err(),
            EngineError::UnknownItem("nope".into())
        );

        let mut mismatched = submit(item, ResponseChoice::A, 0);
        mismatched.dimension = Dimension::EI;
        assert!(matches!(
            engine.process_response(&session, &bank, mismatched, &[]).unwrap_err(),
            EngineError::DimensionMismatch {
                expected: Dimension::EI,
                actual: Dimension::JP,
                ..
            }
        ));

        let first = engine
            .process_response(&session, &bank, submit(item, ResponseChoice::A, 0), &[])
            .unwrap();
        let repeat = engine.process_response(
            &first.session,
            &bank,
            submit(item, ResponseChoice::B, 1),
            std::slice::from_ref(&first.response),
        );
        assert_eq!(repeat.unwrap_err(), EngineError::ItemAlreadyAdministered("jp-1".into()));
    }

    #[test]
    fn terminal_sessions_accept_nothing() {
        let engine = AdaptiveEngine::default();
        let bank = bank(4);
        let abandoned = engine.initialize_session("u", "t").abandon(Utc::now()).unwrap();
        assert!(engine.next_item(&abandoned, &bank, &HashSet::new()).is_none());
        let err = engine
            .process_response(&abandoned, &bank, submit(bank.get("ei-0").unwrap(), ResponseChoice::A, 0), &[])
            .unwrap_err();
        assert_eq!(err, EngineError::SessionNotActive(SessionStatus::Abandoned));
        assert!(engine.finalize(&abandoned, &[], &bank).is_err());
    }

    #[test]
    fn full_session_recovers_type_and_stops_every_dimension() {
        let engine = AdaptiveEngine::default();
        let bank = bank(16);
        let (session, responses) = run_to_completion(&engine, &bank, intj_truth());

        let administered = administered_ids(&responses);
        for dimension in Dimension::ALL {
            let remaining = bank.remaining_for(dimension, &administered);
            assert!(engine.should_stop_dimension(&session, dimension, remaining).stop);
            assert!(session.items_administered(dimension) <= 12);
        }

        let finalized = engine.finalize(&session, &responses, &bank).unwrap();
        assert_eq!(finalized.result.type_code, "INTJ");
        assert_eq!(finalized.result.total_items as usize, responses.len());
        assert!(!finalized
            .warnings
            .iter()
            .any(|w| matches!(w, AssessmentWarning::Incomplete { .. })));
    }

    #[test]
    fn finalize_is_idempotent() {
        let engine = AdaptiveEngine::default();
        let bank = bank(16);
        let (session, responses) = run_to_completion(&engine, &bank, intj_truth());
        let first = engine.finalize(&session, &responses, &bank).unwrap();
        let completed = session
            .complete(first.result.validity.clone(), responses.last().unwrap().answered_at)
            .unwrap();

        let again = engine.finalize(&completed, &responses, &bank).unwrap();
        let once_more = engine.finalize(&completed, &responses, &bank).unwrap();
        assert_eq!(first, again);
        assert_eq!(again, once_more);
    }

    #[test]
    fn exhausted_bank_warns_about_uncertainty() {
        let engine = AdaptiveEngine::new(EngineConfig {
            se_threshold: 0.05,
            ..EngineConfig::default()
        });
        let bank = bank(3);
        let (session, responses) = run_to_completion(&engine, &bank, intj_truth());
        assert_eq!(responses.len(), 12);

        let finalized = engine.finalize(&session, &responses, &bank).unwrap();
        let insufficient = finalized
            .warnings
            .iter()
            .filter(|w| matches!(w, AssessmentWarning::InsufficientItems { .. }))
            .count();
        assert_eq!(insufficient, 4);
    }

    #[test]
    fn pool_exhausted_at_item_cap_still_warns() {
        let engine = AdaptiveEngine::new(EngineConfig {
            se_threshold: 0.05,
            ..EngineConfig::default()
        });
        let bank = bank(12);
        let (session, responses) = run_to_completion(&engine, &bank, intj_truth());
        assert_eq!(responses.len(), 48);

        let administered = administered_ids(&responses);
        for dimension in Dimension::ALL {
            assert_eq!(bank.remaining_for(dimension, &administered), 0);
            assert!(matches!(
                engine.should_stop_dimension(&session, dimension, 0).reason,
                StopReason::MaxItemsReached { administered: 12, max: 12 }
            ));
        }

        let finalized = engine.finalize(&session, &responses, &bank).unwrap();
        let insufficient: Vec<Dimension> = finalized
            .warnings
            .iter()
            .filter_map(|w| match w {
                AssessmentWarning::InsufficientItems { dimension, .. } => Some(*dimension),
                _ => None,
            })
            .collect();
        assert_eq!(insufficient, Dimension::ALL.to_vec());
    }

    #[test]
    fn cap_reached_with_items_left_is_not_a_shortage() {
        let engine = AdaptiveEngine::new(EngineConfig {
            se_threshold: 0.05,
            max_items_per_dimension: 4,
            ..EngineConfig::default()
        });
        let bank = bank(8);
        let (session, responses) = run_to_completion(&engine, &bank, intj_truth());
        assert_eq!(responses.len(), 16);

        let finalized = engine.finalize(&session, &responses, &bank).unwrap();
        assert!(!finalized.warnings.iter().any(|w| matches!(
            w,
            AssessmentWarning::InsufficientItems { .. } | AssessmentWarning::Incomplete { .. }
        )));
    }

    #[test]
    fn answers_for_a_stopped_dimension_are_refused() {
        let engine = AdaptiveEngine::new(EngineConfig {
            max_items_per_dimension: 2,
            ..EngineConfig::default()
        });
        let bank = bank(6);
        let session = engine.initialize_session("u", "t");
        let first = engine
            .process_response(&session, &bank, submit(bank.get("ei-0").unwrap(), ResponseChoice::A, 0), &[])
            .unwrap();
        let mut history = vec![first.response];
        let ei_1 = submit(bank.get("ei-1").unwrap(), ResponseChoice::A, 1);
        let second = engine
            .process_response(&first.session, &bank, ei_1, &history)
            .unwrap();
        history.push(second.response);
        assert_eq!(second.session.items_administered(Dimension::EI), 2);

        let ei_2 = submit(bank.get("ei-2").unwrap(), ResponseChoice::A, 2);
        let err = engine
            .process_response(&second.session, &bank, ei_2, &history)
            .unwrap_err();
        assert_eq!(
            err,
            EngineError::DimensionStopped {
                dimension: Dimension::EI,
                reason: StopReason::MaxItemsReached { administered: 2, max: 2 },
            }
        );

        // Other dimensions are still open.
        let sn_0 = submit(bank.get("sn-0").unwrap(), ResponseChoice::B, 2);
        assert!(engine
            .process_response(&second.session, &bank, sn_0, &history)
            .is_ok());
    }

    #[test]
    fn early_finalize_reports_incomplete_dimensions() {
        let engine = AdaptiveEngine::default();
        let bank = bank(8);
        let session = engine.initialize_session("u", "t");
        let finalized = engine.finalize(&session, &[], &bank).unwrap();
        assert_eq!(
            finalized
                .warnings
                .iter()
                .filter(|w| matches!(w, AssessmentWarning::Incomplete { .. }))
                .count(),
            4
        );
        assert_eq!(finalized.result.total_items, 0);
        assert!(finalized.result.duration_secs.is_none());
    }

    #[test]
    fn least_precise_policy_still_covers_every_dimension() {
        let engine = AdaptiveEngine::new(EngineConfig {
            scheduling: SchedulingPolicy::LeastPrecise,
            ..EngineConfig::default()
        });
        let bank = bank(16);
        let (session, _) = run_to_completion(&engine, &bank, intj_truth());
        for dimension in Dimension::ALL {
            assert!(session.items_administered(dimension) > 0);
        }
    }

    #[test]
    fn reversed_item_keying_is_respected() {
        let engine = AdaptiveEngine::default();
        let mut bank = bank(4);
        for item in bank.items.iter_mut() {
            item.option_a_pole = item.dimension.second_pole();
        }
        let session = engine.initialize_session("u", "t");
        let item = bank.get("ei-2").unwrap();
        assert_eq!(item.option_a_pole, Pole::I);
        let processed = engine
            .process_response(&session, &bank, submit(item, ResponseChoice::A, 0), &[])
            .unwrap();
        assert!(processed.session.estimate(Dimension::EI).theta < 0.0);
    }
}
