//! Per-dimension stopping rules and the scheduler that picks which
//! dimension to test next.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::Dimension;
use crate::session::AdaptiveSession;

/// Why a dimension stopped, or `Continue` if it has not.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum StopReason {
    /// SE has reached the precision target.
    PrecisionReached { standard_error: f64, threshold: f64 },
    /// The per-dimension item cap was hit.
    MaxItemsReached { administered: u32, max: u32 },
    /// No unadministered items remain in the bank.
    ItemPoolExhausted,
    Continue,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::PrecisionReached {
                standard_error,
                threshold,
            } => write!(f, "SE {standard_error:.3} <= threshold {threshold:.3}"),
            StopReason::MaxItemsReached { administered, max } => {
                write!(f, "{administered} of max {max} items administered")
            }
            StopReason::ItemPoolExhausted => write!(f, "no unadministered items remain"),
            StopReason::Continue => write!(f, "precision target not yet reached"),
        }
    }
}

/// Outcome of evaluating the stopping rules for one dimension.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StopDecision {
    pub stop: bool,
    pub reason: StopReason,
}

impl StopDecision {
    fn stop(reason: StopReason) -> Self {
        Self { stop: true, reason }
    }
}

/// Thresholds the stopping rules compare against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StoppingRules {
    pub se_threshold: f64,
    pub max_items: u32,
}

impl StoppingRules {
    /// Evaluate the rules in order: precision, item cap, exhausted pool.
    pub fn evaluate(&self, session: &AdaptiveSession, dimension: Dimension, remaining: usize) -> StopDecision {
        let progress = session.dimensions.get(dimension);
        let se = progress.estimate.standard_error;

        if progress.items_administered > 0 && se <= self.se_threshold {
            return StopDecision::stop(StopReason::PrecisionReached {
                standard_error: se,
                threshold: self.se_threshold,
            });
        }
        if progress.items_administered >= self.max_items {
            return StopDecision::stop(StopReason::MaxItemsReached {
                administered: progress.items_administered,
                max: self.max_items,
            });
        }
        if remaining == 0 {
            return StopDecision::stop(StopReason::ItemPoolExhausted);
        }
        StopDecision {
            stop: false,
            reason: StopReason::Continue,
        }
    }
}

/// Order in which open dimensions are visited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulingPolicy {
    /// Fewest items administered first.
    #[default]
    RoundRobin,
    /// Highest standard error first.
    LeastPrecise,
}

/// Pick the next dimension among those whose stopping rules have not fired.
///
/// `decide` reports the stop decision for each dimension. Ties fall back to
/// the canonical EI, SN, TF, JP order. Returns `None` once every dimension
/// has stopped, which ends the session.
pub fn next_dimension(
    session: &AdaptiveSession,
    policy: SchedulingPolicy,
    mut decide: impl FnMut(Dimension) -> StopDecision,
) -> Option<Dimension> {
    let open: Vec<Dimension> = Dimension::ALL
        .into_iter()
        .filter(|d| !decide(*d).stop)
        .collect();

    match policy {
        SchedulingPolicy::RoundRobin => open
            .into_iter()
            .min_by_key(|d| (session.items_administered(*d), d.index())),
        SchedulingPolicy::LeastPrecise => open.into_iter().max_by(|a, b| {
            session
                .estimate(*a)
                .standard_error
                .total_cmp(&session.estimate(*b).standard_error)
                .then_with(|| b.index().cmp(&a.index()))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimator::ThetaEstimate;
    use chrono::Utc;

    const RULES: StoppingRules = StoppingRules {
        se_threshold: 0.35,
        max_items: 12,
    };

    fn with(session: &AdaptiveSession, dimension: Dimension, se: f64, items: u32) -> AdaptiveSession {
        session.with_estimate(
            dimension,
            ThetaEstimate {
                theta: 0.0,
                standard_error: se,
                information: 0.0,
            },
            items,
        )
    }

    fn fresh() -> AdaptiveSession {
        AdaptiveSession::new("u", "t", Utc::now())
    }

    #[test]
    fn fresh_dimension_continues() {
        let decision = RULES.evaluate(&fresh(), Dimension::EI, 10);
        assert!(!decision.stop);
        assert_eq!(decision.reason, StopReason::Continue);
    }

    #[test]
    fn precision_stops() {
        let s = with(&fresh(), Dimension::EI, 0.3, 6);
        let decision = RULES.evaluate(&s, Dimension::EI, 10);
        assert!(decision.stop);
        assert!(matches!(decision.reason, StopReason::PrecisionReached { .. }));
        assert!(decision.reason.to_string().contains("0.300"));
    }

    #[test]
    fn threshold_is_inclusive() {
        let s = with(&fresh(), Dimension::SN, 0.35, 6);
        assert!(RULES.evaluate(&s, Dimension::SN, 10).stop);
    }

    #[test]
    fn item_cap_stops() {
        let s = with(&fresh(), Dimension::TF, 0.5, 12);
        let decision = RULES.evaluate(&s, Dimension::TF, 4);
        assert_eq!(
            decision.reason,
            StopReason::MaxItemsReached {
                administered: 12,
                max: 12
            }
        );
    }

    #[test]
    fn empty_pool_stops() {
        let decision = RULES.evaluate(&fresh(), Dimension::JP, 0);
        assert!(decision.stop);
        assert_eq!(decision.reason, StopReason::ItemPoolExhausted);
    }

    #[test]
    fn round_robin_prefers_fewest_items() {
        let s = with(&fresh(), Dimension::EI, 0.8, 1);
        let next = next_dimension(&s, SchedulingPolicy::RoundRobin, |d| RULES.evaluate(&s, d, 10));
        assert_eq!(next, Some(Dimension::SN));
    }

    #[test]
    fn least_precise_prefers_highest_se() {
        let s = fresh();
        let s = with(&s, Dimension::EI, 0.6, 2);
        let s = with(&s, Dimension::SN, 0.9, 3);
        let s = with(&s, Dimension::TF, 0.5, 1);
        let s = with(&s, Dimension::JP, 0.7, 1);
        let next = next_dimension(&s, SchedulingPolicy::LeastPrecise, |d| RULES.evaluate(&s, d, 10));
        assert_eq!(next, Some(Dimension::SN));
    }

    #[test]
    fn least_precise_ties_use_canonical_order() {
        let s = fresh();
        let next = next_dimension(&s, SchedulingPolicy::LeastPrecise, |d| RULES.evaluate(&s, d, 10));
        assert_eq!(next, Some(Dimension::EI));
    }

    #[test]
    fn stopped_dimensions_are_skipped_and_none_ends_the_session() {
        let s = with(&fresh(), Dimension::EI, 0.2, 5);
        let next = next_dimension(&s, SchedulingPolicy::RoundRobin, |d| RULES.evaluate(&s, d, 10));
        assert_eq!(next, Some(Dimension::SN));

        let done = next_dimension(&s, SchedulingPolicy::RoundRobin, |d| RULES.evaluate(&s, d, 0));
        assert_eq!(done, None);
    }

    #[test]
    fn policy_serializes_snake_case() {
        let json = serde_json::to_string(&SchedulingPolicy::LeastPrecise).unwrap();
        assert_eq!(json, "\"least_precise\"");
    }
}
