//! Engine and persistence error types.
//!
//! `EngineError` covers requests the engine refuses to apply to a session.
//! `StoreError` is defined here (rather than in `typewise-store`) so the
//! orchestration service can downcast repository failures and recognise
//! optimistic-concurrency conflicts without string matching.

use thiserror::Error;
use uuid::Uuid;

use crate::model::Dimension;
use crate::session::SessionStatus;
use crate::stopping::StopReason;

/// Errors raised when a request cannot be applied to a session.
///
/// None of these are fatal to the surrounding application. The session is
/// left untouched and the caller decides whether to re-prompt or abort.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// The submitted answer is not one of the two forced-choice options.
    #[error("invalid response '{0}': expected option A or B")]
    InvalidResponse(String),

    /// The item id is not present in the item bank.
    #[error("unknown item: {0}")]
    UnknownItem(String),

    /// The item belongs to a different dimension than the one being tested.
    #[error("item {item_id} measures {actual}, not {expected}")]
    DimensionMismatch {
        item_id: String,
        expected: Dimension,
        actual: Dimension,
    },

    /// The item's dimension has already met a stopping rule.
    #[error("dimension {dimension} has stopped ({reason}); no further items are accepted for it")]
    DimensionStopped {
        dimension: Dimension,
        reason: StopReason,
    },

    /// The item was already answered in this session.
    #[error("item {0} was already administered in this session")]
    ItemAlreadyAdministered(String),

    /// The session is in a terminal state and cannot accept the request.
    #[error("session is {0}, not in progress")]
    SessionNotActive(SessionStatus),

    /// A status change that the session state machine does not allow.
    #[error("cannot transition session from {from} to {to}")]
    InvalidTransition {
        from: SessionStatus,
        to: SessionStatus,
    },
}

impl EngineError {
    /// Returns `true` if the caller can recover by re-prompting the respondent.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, EngineError::InvalidResponse(_))
    }
}

/// Errors surfaced by session repositories.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No session with this id has been stored.
    #[error("session not found: {0}")]
    SessionNotFound(Uuid),

    /// A session with this id already exists.
    #[error("session already exists: {0}")]
    SessionExists(Uuid),

    /// The stored version differs from the one the caller read.
    #[error("version conflict for session {session_id}: expected {expected}, found {found}")]
    VersionConflict {
        session_id: Uuid,
        expected: u64,
        found: u64,
    },

    /// Underlying filesystem failure.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A record could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Returns `true` if retrying after reloading the session may succeed.
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::VersionConflict { .. })
    }
}
