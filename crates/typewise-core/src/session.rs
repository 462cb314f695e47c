//! Adaptive session state and the append-only response record.
//!
//! A session is a value: engine operations take a snapshot and hand back a
//! new one. Each mutation bumps `version`, which persistence layers use for
//! optimistic concurrency checks.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::EngineError;
use crate::estimator::ThetaEstimate;
use crate::model::{Dimension, DimensionMap, ResponseChoice};
use crate::validity::AssessmentValidity;

/// Lifecycle of an assessment attempt.
///
/// `InProgress` → `Completed` once every dimension has stopped, or
/// `InProgress` → `Abandoned` on an external signal. Both are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    InProgress,
    Completed,
    Abandoned,
}

impl SessionStatus {
    pub fn can_transition_to(&self, target: SessionStatus) -> bool {
        matches!(
            (self, target),
            (SessionStatus::InProgress, SessionStatus::Completed)
                | (SessionStatus::InProgress, SessionStatus::Abandoned)
        )
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, SessionStatus::InProgress)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::InProgress => write!(f, "in_progress"),
            SessionStatus::Completed => write!(f, "completed"),
            SessionStatus::Abandoned => write!(f, "abandoned"),
        }
    }
}

/// Measurement state of one dimension.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DimensionProgress {
    pub estimate: ThetaEstimate,
    pub items_administered: u32,
}

/// State container for one assessment attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdaptiveSession {
    pub id: Uuid,
    pub user_id: String,
    pub tenant_id: String,
    pub status: SessionStatus,
    pub dimensions: DimensionMap<DimensionProgress>,
    /// Total responses across all dimensions; the next presentation order.
    pub responses_recorded: u32,
    /// Set when the session completes.
    #[serde(default)]
    pub validity: Option<AssessmentValidity>,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub ended_at: Option<DateTime<Utc>>,
    /// Incremented on every mutation.
    pub version: u64,
}

impl AdaptiveSession {
    /// A fresh session with neutral priors on every dimension.
    pub fn new(user_id: impl Into<String>, tenant_id: impl Into<String>, started_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            tenant_id: tenant_id.into(),
            status: SessionStatus::InProgress,
            dimensions: DimensionMap::default(),
            responses_recorded: 0,
            validity: None,
            started_at,
            ended_at: None,
            version: 0,
        }
    }

    pub fn estimate(&self, dimension: Dimension) -> ThetaEstimate {
        self.dimensions.get(dimension).estimate
    }

    pub fn items_administered(&self, dimension: Dimension) -> u32 {
        self.dimensions.get(dimension).items_administered
    }

    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::InProgress
    }

    /// Fail unless the session can still accept responses.
    pub fn ensure_active(&self) -> Result<(), EngineError> {
        if self.is_active() {
            Ok(())
        } else {
            Err(EngineError::SessionNotActive(self.status))
        }
    }

    /// Return a copy with `dimension`'s estimate replaced and counters advanced.
    pub(crate) fn with_estimate(&self, dimension: Dimension, estimate: ThetaEstimate, items: u32) -> Self {
        let mut next = self.clone();
        *next.dimensions.get_mut(dimension) = DimensionProgress {
            estimate,
            items_administered: items,
        };
        next.responses_recorded += 1;
        next.version += 1;
        next
    }

    fn transition(&self, target: SessionStatus, at: DateTime<Utc>) -> Result<Self, EngineError> {
        if !self.status.can_transition_to(target) {
            return Err(EngineError::InvalidTransition {
                from: self.status,
                to: target,
            });
        }
        let mut next = self.clone();
        next.status = target;
        next.ended_at = Some(at);
        next.version += 1;
        Ok(next)
    }

    /// Mark the session completed and attach its validity summary.
    pub fn complete(&self, validity: AssessmentValidity, at: DateTime<Utc>) -> Result<Self, EngineError> {
        let mut next = self.transition(SessionStatus::Completed, at)?;
        next.validity = Some(validity);
        Ok(next)
    }

    /// Mark the session abandoned.
    pub fn abandon(&self, at: DateTime<Utc>) -> Result<Self, EngineError> {
        self.transition(SessionStatus::Abandoned, at)
    }
}

/// One answered item. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdaptiveResponse {
    pub id: Uuid,
    pub session_id: Uuid,
    pub item_id: String,
    pub dimension: Dimension,
    pub choice: ResponseChoice,
    pub latency_ms: u64,
    pub theta_before: f64,
    pub se_before: f64,
    pub theta_after: f64,
    pub se_after: f64,
    /// Item information at `theta_before`, the value the selector maximised.
    pub information: f64,
    /// 1-based position across the whole session.
    pub presentation_order: u32,
    pub answered_at: DateTime<Utc>,
}
