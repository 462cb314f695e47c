//! In-memory session repository.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use typewise_core::error::StoreError;
use typewise_core::session::{AdaptiveResponse, AdaptiveSession};
use typewise_core::traits::SessionRepository;

/// Keeps sessions and responses in process memory. Nothing survives a
/// restart; intended for tests, simulations and single-shot CLI runs.
#[derive(Default)]
pub struct MemorySessionRepository {
    sessions: RwLock<HashMap<Uuid, AdaptiveSession>>,
    responses: RwLock<HashMap<Uuid, Vec<AdaptiveResponse>>>,
}

impl MemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionRepository for MemorySessionRepository {
    fn name(&self) -> &str {
        "memory"
    }

    async fn create(&self, session: &AdaptiveSession) -> anyhow::Result<()> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&session.id) {
            return Err(StoreError::SessionExists(session.id).into());
        }
        sessions.insert(session.id, session.clone());
        Ok(())
    }

    async fn load(&self, session_id: Uuid) -> anyhow::Result<AdaptiveSession> {
        self.sessions
            .read()
            .await
            .get(&session_id)
            .cloned()
            .ok_or_else(|| StoreError::SessionNotFound(session_id).into())
    }

    async fn update(&self, session: &AdaptiveSession, expected_version: u64) -> anyhow::Result<()> {
        let mut sessions = self.sessions.write().await;
        let stored = sessions
            .get_mut(&session.id)
            .ok_or(StoreError::SessionNotFound(session.id))?;
        if stored.version != expected_version {
            return Err(StoreError::VersionConflict {
                session_id: session.id,
                expected: expected_version,
                found: stored.version,
            }
            .into());
        }
        *stored = session.clone();
        Ok(())
    }

    async fn append_response(&self, response: &AdaptiveResponse) -> anyhow::Result<()> {
        if !self.sessions.read().await.contains_key(&response.session_id) {
            return Err(StoreError::SessionNotFound(response.session_id).into());
        }
        self.responses
            .write()
            .await
            .entry(response.session_id)
            .or_default()
            .push(response.clone());
        Ok(())
    }

    async fn responses(&self, session_id: Uuid) -> anyhow::Result<Vec<AdaptiveResponse>> {
        if !self.sessions.read().await.contains_key(&session_id) {
            return Err(StoreError::SessionNotFound(session_id).into());
        }
        let mut responses = self
            .responses
            .read()
            .await
            .get(&session_id)
            .cloned()
            .unwrap_or_default();
        responses.sort_by_key(|r| r.presentation_order);
        Ok(responses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn create_and_load() {
        let repo = MemorySessionRepository::new();
        let session = AdaptiveSession::new("u", "t", Utc::now());
        repo.create(&session).await.unwrap();
        assert_eq!(repo.load(session.id).await.unwrap(), session);
        assert_eq!(repo.len().await, 1);
        assert!(repo.responses(session.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_create_fails() {
        let repo = MemorySessionRepository::new();
        let session = AdaptiveSession::new("u", "t", Utc::now());
        repo.create(&session).await.unwrap();
        let err = repo.create(&session).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StoreError>(),
            Some(StoreError::SessionExists(_))
        ));
    }

    #[tokio::test]
    async fn stale_update_is_rejected() {
        let repo = MemorySessionRepository::new();
        let session = AdaptiveSession::new("u", "t", Utc::now());
        repo.create(&session).await.unwrap();

        let abandoned = session.abandon(Utc::now()).unwrap();
        repo.update(&abandoned, session.version).await.unwrap();

        let err = repo.update(&abandoned, session.version).await.unwrap_err();
        let store_err = err.downcast_ref::<StoreError>().unwrap();
        assert!(store_err.is_conflict());
        assert_eq!(repo.load(session.id).await.unwrap().version, abandoned.version);
    }

    #[tokio::test]
    async fn unknown_session() {
        let repo = MemorySessionRepository::new();
        let id = Uuid::new_v4();
        assert!(repo.load(id).await.is_err());
        assert!(repo.responses(id).await.is_err());
    }
}
