//! Collaborator interfaces consumed by the orchestration service.
//!
//! The engine never touches storage. These async traits are the narrow seam
//! behind which `typewise-store` provides in-memory and file-backed adapters.

use async_trait::async_trait;
use uuid::Uuid;

use crate::model::ItemBank;
use crate::session::{AdaptiveResponse, AdaptiveSession};

/// Durable storage for sessions and their append-only responses.
///
/// Implementations must reject an `update` whose `expected_version` does not
/// match the stored session with [`StoreError::VersionConflict`], which is how
/// concurrent writers to one session are serialised.
///
/// [`StoreError::VersionConflict`]: crate::error::StoreError::VersionConflict
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Human-readable backend name (e.g. "memory").
    fn name(&self) -> &str;

    /// Store a new session. Fails if the id is already taken.
    async fn create(&self, session: &AdaptiveSession) -> anyhow::Result<()>;

    /// Load a session by id.
    async fn load(&self, session_id: Uuid) -> anyhow::Result<AdaptiveSession>;

    /// Replace a session if the stored version equals `expected_version`.
    async fn update(&self, session: &AdaptiveSession, expected_version: u64) -> anyhow::Result<()>;

    /// Append one response record.
    async fn append_response(&self, response: &AdaptiveResponse) -> anyhow::Result<()>;

    /// All responses for a session in presentation order.
    async fn responses(&self, session_id: Uuid) -> anyhow::Result<Vec<AdaptiveResponse>>;
}

/// Read-only source of the item catalogue.
#[async_trait]
pub trait ItemBankProvider: Send + Sync {
    async fn load_bank(&self) -> anyhow::Result<ItemBank>;
}
