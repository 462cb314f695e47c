//! File-backed session repository.
//!
//! Layout under the root directory:
//!
//! ```text
//! sessions/<session-id>.json     latest session snapshot
//! responses/<session-id>.jsonl   one response per line, append-only
//! ```
//!
//! Snapshots are written to a temporary file and renamed into place, so a
//! crash never leaves a half-written session behind. A process-wide mutex
//! serialises writers so the version check and the write are atomic with
//! respect to each other.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use uuid::Uuid;

use typewise_core::error::StoreError;
use typewise_core::session::{AdaptiveResponse, AdaptiveSession};
use typewise_core::traits::SessionRepository;

pub struct FileSessionRepository {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl FileSessionRepository {
    /// Open (creating if needed) a repository rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        for dir in [root.join("sessions"), root.join("responses")] {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("failed to create data directory: {}", dir.display()))?;
        }
        tracing::debug!(root = %root.display(), "opened file session store");
        Ok(Self {
            root,
            write_lock: Mutex::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn session_path(&self, session_id: Uuid) -> PathBuf {
        self.root.join("sessions").join(format!("{session_id}.json"))
    }

    fn responses_path(&self, session_id: Uuid) -> PathBuf {
        self.root.join("responses").join(format!("{session_id}.jsonl"))
    }

    async fn read_session(&self, session_id: Uuid) -> Result<AdaptiveSession> {
        let path = self.session_path(session_id);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::SessionNotFound(session_id).into());
            }
            Err(e) => return Err(StoreError::Io(e).into()),
        };
        let session = serde_json::from_str(&content)
            .map_err(StoreError::from)
            .with_context(|| format!("corrupt session file: {}", path.display()))?;
        Ok(session)
    }

    async fn write_session(&self, session: &AdaptiveSession) -> Result<()> {
        let path = self.session_path(session.id);
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_vec_pretty(session).map_err(StoreError::from)?;
        tokio::fs::write(&tmp, json).await.map_err(StoreError::from)?;
        tokio::fs::rename(&tmp, &path).await.map_err(StoreError::from)?;
        Ok(())
    }
}

#[async_trait]
impl SessionRepository for FileSessionRepository {
    fn name(&self) -> &str {
        "file"
    }

    async fn create(&self, session: &AdaptiveSession) -> anyhow::Result<()> {
        let _guard = self.write_lock.lock().await;
        if tokio::fs::try_exists(self.session_path(session.id))
            .await
            .map_err(StoreError::from)?
        {
            return Err(StoreError::SessionExists(session.id).into());
        }
        self.write_session(session).await
    }

    async fn load(&self, session_id: Uuid) -> anyhow::Result<AdaptiveSession> {
        self.read_session(session_id).await
    }

    async fn update(&self, session: &AdaptiveSession, expected_version: u64) -> anyhow::Result<()> {
        let _guard = self.write_lock.lock().await;
        let stored = self.read_session(session.id).await?;
        if stored.version != expected_version {
            return Err(StoreError::VersionConflict {
                session_id: session.id,
                expected: expected_version,
                found: stored.version,
            }
            .into());
        }
        self.write_session(session).await
    }

    async fn append_response(&self, response: &AdaptiveResponse) -> anyhow::Result<()> {
        let _guard = self.write_lock.lock().await;
        if !tokio::fs::try_exists(self.session_path(response.session_id))
            .await
            .map_err(StoreError::from)?
        {
            return Err(StoreError::SessionNotFound(response.session_id).into());
        }

        let mut line = serde_json::to_string(response).map_err(StoreError::from)?;
        line.push('\n');
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.responses_path(response.session_id))
            .await
            .map_err(StoreError::from)?;
        file.write_all(line.as_bytes()).await.map_err(StoreError::from)?;
        file.flush().await.map_err(StoreError::from)?;
        Ok(())
    }

    async fn responses(&self, session_id: Uuid) -> anyhow::Result<Vec<AdaptiveResponse>> {
        if !tokio::fs::try_exists(self.session_path(session_id))
            .await
            .map_err(StoreError::from)?
        {
            return Err(StoreError::SessionNotFound(session_id).into());
        }

        let path = self.responses_path(session_id);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::Io(e).into()),
        };

        let mut responses = content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .enumerate()
            .map(|(n, line)| {
                serde_json::from_str::<AdaptiveResponse>(line)
                    .with_context(|| format!("corrupt response at {}:{}", path.display(), n + 1))
            })
            .collect::<Result<Vec<_>>>()?;
        responses.sort_by_key(|r| r.presentation_order);
        Ok(responses)
    }
}
