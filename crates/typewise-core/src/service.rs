//! Orchestration over the engine, a session repository and an item bank.
//!
//! The service is the only layer that performs I/O. Each call loads the
//! latest snapshot, asks the engine for a new value, and writes it back with
//! an optimistic version check. A concurrent writer on the same session
//! therefore fails with [`StoreError::VersionConflict`] instead of silently
//! interleaving responses.
//!
//! [`StoreError::VersionConflict`]: crate::error::StoreError::VersionConflict

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::{administered_ids, AdaptiveEngine, FinalizedAssessment, ResponseSubmission};
use crate::error::EngineError;
use crate::model::{Dimension, ItemBank, ResponseChoice};
use crate::session::{AdaptiveResponse, AdaptiveSession, SessionStatus};
use crate::traits::{ItemBankProvider, SessionRepository};

/// An item ready for presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub session_id: Uuid,
    pub item_id: String,
    pub dimension: Dimension,
    pub option_a: String,
    pub option_b: String,
    /// 1-based position in the session.
    pub position: u32,
}

/// What a caller gets back after submitting an answer.
#[derive(Debug, Clone)]
pub struct AnswerOutcome {
    pub session: AdaptiveSession,
    pub response: AdaptiveResponse,
    /// True once no further items will be presented.
    pub complete: bool,
}

/// Drives assessments end to end.
pub struct AssessmentService {
    engine: AdaptiveEngine,
    repository: Arc<dyn SessionRepository>,
    bank: Arc<ItemBank>,
}

impl AssessmentService {
    pub fn new(engine: AdaptiveEngine, repository: Arc<dyn SessionRepository>, bank: Arc<ItemBank>) -> Self {
        Self {
            engine,
            repository,
            bank,
        }
    }

    /// Build a service, loading the bank from `provider` once up front.
    pub async fn from_provider(
        engine: AdaptiveEngine,
        repository: Arc<dyn SessionRepository>,
        provider: &dyn ItemBankProvider,
    ) -> Result<Self> {
        let bank = provider.load_bank().await.context("failed to load item bank")?;
        Ok(Self::new(engine, repository, Arc::new(bank)))
    }

    pub fn engine(&self) -> &AdaptiveEngine {
        &self.engine
    }

    pub fn bank(&self) -> &ItemBank {
        &self.bank
    }

    /// Create and persist a fresh session.
    pub async fn start(&self, user_id: &str, tenant_id: &str) -> Result<AdaptiveSession> {
        let session = self.engine.initialize_session(user_id, tenant_id);
        self.repository
            .create(&session)
            .await
            .with_context(|| format!("failed to store new session {}", session.id))?;
        Ok(session)
    }

    pub async fn session(&self, session_id: Uuid) -> Result<AdaptiveSession> {
        self.repository.load(session_id).await
    }

    pub async fn responses(&self, session_id: Uuid) -> Result<Vec<AdaptiveResponse>> {
        self.repository.responses(session_id).await
    }

    /// The next item for the session, or `None` once it is complete.
    pub async fn next_question(&self, session_id: Uuid) -> Result<Option<Question>> {
        let session = self.repository.load(session_id).await?;
        let responses = self.repository.responses(session_id).await?;
        let administered = administered_ids(&responses);

        Ok(self
            .engine
            .next_item(&session, &self.bank, &administered)
            .map(|(item, dimension)| Question {
                session_id,
                item_id: item.id.clone(),
                dimension,
                option_a: item.option_a.clone(),
                option_b: item.option_b.clone(),
                position: session.responses_recorded + 1,
            }))
    }

    /// Record an answer given as raw option text ("A", "b", "1", ...).
    ///
    /// Unparseable input fails with [`EngineError::InvalidResponse`] before
    /// anything is read or written, so the caller can simply re-prompt. An
    /// item outside the dimension the engine would test next is refused. If
    /// the response record cannot be appended the session snapshot is
    /// restored, so a retry starts from the same state.
    pub async fn answer(
        &self,
        session_id: Uuid,
        item_id: &str,
        raw_choice: &str,
        latency_ms: u64,
        answered_at: DateTime<Utc>,
    ) -> Result<AnswerOutcome> {
        let choice: ResponseChoice = raw_choice.parse()?;

        let session = self.repository.load(session_id).await?;
        let history = self.repository.responses(session_id).await?;
        let item_dimension = self
            .bank
            .get(item_id)
            .map(|item| item.dimension)
            .ok_or_else(|| EngineError::UnknownItem(item_id.to_string()))?;

        // Answers are accepted for the dimension currently being tested. Once
        // every dimension has stopped the engine refuses the item's own.
        let mut administered = administered_ids(&history);
        let dimension = self
            .engine
            .next_item(&session, &self.bank, &administered)
            .map_or(item_dimension, |(_, current)| current);

        let processed = self.engine.process_response(
            &session,
            &self.bank,
            ResponseSubmission {
                item_id: item_id.to_string(),
                dimension,
                choice,
                latency_ms,
                answered_at,
            },
            &history,
        )?;

        self.repository
            .update(&processed.session, session.version)
            .await
            .with_context(|| format!("failed to save session {session_id}"))?;
        if let Err(e) = self.repository.append_response(&processed.response).await {
            // Put the previous snapshot back so the stored estimates never run
            // ahead of the recorded responses.
            if let Err(rollback) = self.repository.update(&session, processed.session.version).await {
                tracing::error!(%session_id, "failed to roll back session after lost response: {rollback:#}");
            }
            return Err(e.context(format!("failed to record response for session {session_id}")));
        }

        administered.insert(processed.response.item_id.clone());
        let complete = self
            .engine
            .next_item(&processed.session, &self.bank, &administered)
            .is_none();

        Ok(AnswerOutcome {
            session: processed.session,
            response: processed.response,
            complete,
        })
    }

    /// Score the session and mark it completed.
    ///
    /// Finishing an already completed session returns the same assessment
    /// again without writing anything.
    pub async fn finish(&self, session_id: Uuid) -> Result<FinalizedAssessment> {
        let session = self.repository.load(session_id).await?;
        let responses = self.repository.responses(session_id).await?;
        let finalized = self.engine.finalize(&session, &responses, &self.bank)?;

        if session.status == SessionStatus::InProgress {
            let ended_at = responses
                .iter()
                .map(|r| r.answered_at)
                .max()
                .unwrap_or(session.started_at);
            let completed = session.complete(finalized.result.validity.clone(), ended_at)?;
            self.repository
                .update(&completed, session.version)
                .await
                .with_context(|| format!("failed to complete session {session_id}"))?;
            tracing::info!(%session_id, type_code = %finalized.result.type_code, "session completed");
        }

        Ok(finalized)
    }

    /// Mark the session abandoned.
    pub async fn abandon(&self, session_id: Uuid, at: DateTime<Utc>) -> Result<AdaptiveSession> {
        let session = self.repository.load(session_id).await?;
        let abandoned = session.abandon(at)?;
        self.repository
            .update(&abandoned, session.version)
            .await
            .with_context(|| format!("failed to abandon session {session_id}"))?;
        tracing::info!(%session_id, "session abandoned");
        Ok(abandoned)
    }
}
