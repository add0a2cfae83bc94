//! Session persistence backends
//!
//! Sessions live either as JSON files under the data directory or, when the
//! directory is not writable, in process memory. The backend is chosen once
//! at startup by probing with a real write; the choice never changes while
//! the server runs.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::types::ChatSession;

/// Storage backend for chat sessions
#[async_trait]
pub trait SessionBackend: Send + Sync {
    /// Persist a session, replacing any previous version
    async fn save(&self, session: &ChatSession) -> Result<()>;

    /// Load a session; `Ok(None)` means it does not exist
    async fn load(&self, id: &Uuid) -> Result<Option<ChatSession>>;

    /// Load every stored session
    async fn list_all(&self) -> Result<Vec<ChatSession>>;

    /// Delete a session; deleting a missing session is not an error
    async fn delete(&self, id: &Uuid) -> Result<()>;

    /// Backend name for logging
    fn name(&self) -> &str;
}

/// Durable backend: one JSON file per session under `sessions/`
pub struct FileSessionBackend {
    dir: PathBuf,
}

impl FileSessionBackend {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            dir: data_dir.join("sessions"),
        }
    }

    fn path(&self, id: &Uuid) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }
}

#[async_trait]
impl SessionBackend for FileSessionBackend {
    async fn save(&self, session: &ChatSession) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| Error::SessionStorage(format!("Failed to create session dir: {}", e)))?;

        let json = serde_json::to_vec_pretty(session)?;
        tokio::fs::write(self.path(&session.id), json)
            .await
            .map_err(|e| Error::SessionStorage(format!("Failed to write session: {}", e)))?;
        Ok(())
    }

    async fn load(&self, id: &Uuid) -> Result<Option<ChatSession>> {
        match tokio::fs::read(self.path(id)).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::SessionStorage(format!("Failed to read session: {}", e))),
        }
    }

    async fn list_all(&self) -> Result<Vec<ChatSession>> {
        let mut sessions = Vec::new();

        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(sessions),
            Err(e) => {
                return Err(Error::SessionStorage(format!("Failed to list sessions: {}", e)))
            }
        };

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| Error::SessionStorage(format!("Failed to list sessions: {}", e)))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match tokio::fs::read(&path).await {
                Ok(bytes) => match serde_json::from_slice(&bytes) {
                    Ok(session) => sessions.push(session),
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable session file");
                    }
                },
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable session file");
                }
            }
        }

        Ok(sessions)
    }

    async fn delete(&self, id: &Uuid) -> Result<()> {
        match tokio::fs::remove_file(self.path(id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::SessionStorage(format!("Failed to delete session: {}", e))),
        }
    }

    fn name(&self) -> &str {
        "file"
    }
}

/// In-memory fallback backend; sessions vanish on restart
#[derive(Default)]
pub struct MemorySessionBackend {
    sessions: DashMap<Uuid, ChatSession>,
}

impl MemorySessionBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionBackend for MemorySessionBackend {
    async fn save(&self, session: &ChatSession) -> Result<()> {
        self.sessions.insert(session.id, session.clone());
        Ok(())
    }

    async fn load(&self, id: &Uuid) -> Result<Option<ChatSession>> {
        Ok(self.sessions.get(id).map(|s| s.value().clone()))
    }

    async fn list_all(&self) -> Result<Vec<ChatSession>> {
        Ok(self.sessions.iter().map(|entry| entry.value().clone()).collect())
    }

    async fn delete(&self, id: &Uuid) -> Result<()> {
        self.sessions.remove(id);
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

/// Probe the data directory with a real write and pick the backend.
///
/// Returns the backend and whether it is durable. Any probe failure selects
/// the in-memory fallback; the server still starts.
pub async fn resolve_backend(data_dir: &Path) -> (Arc<dyn SessionBackend>, bool) {
    match probe_writable(data_dir).await {
        Ok(()) => {
            tracing::info!(dir = %data_dir.display(), "Using durable session storage");
            (Arc::new(FileSessionBackend::new(data_dir)), true)
        }
        Err(e) => {
            tracing::warn!(
                dir = %data_dir.display(),
                error = %e,
                "Data directory not writable, sessions will not survive restarts"
            );
            (Arc::new(MemorySessionBackend::new()), false)
        }
    }
}

async fn probe_writable(data_dir: &Path) -> std::io::Result<()> {
    tokio::fs::create_dir_all(data_dir).await?;
    let probe = data_dir.join(".write_probe");
    tokio::fs::write(&probe, b"probe").await?;
    tokio::fs::remove_file(&probe).await?;
    Ok(())
}
