//! Session store: create-or-continue semantics over a storage backend

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::Result;
use crate::types::{ChatMessage, ChatSession};

use super::storage::SessionBackend;

/// Manages chat sessions on top of the selected backend
pub struct SessionStore {
    backend: Arc<dyn SessionBackend>,
    /// Serializes create-if-absent so two concurrent requests with the same
    /// new session id cannot both create it
    creation: Mutex<()>,
    /// Per-session write locks; turns append under the lock so concurrent
    /// turns on one session cannot overwrite each other
    writes: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl SessionStore {
    pub fn new(backend: Arc<dyn SessionBackend>) -> Self {
        Self {
            backend,
            creation: Mutex::new(()),
            writes: DashMap::new(),
        }
    }

    /// Continue an existing session or create a new one.
    ///
    /// With no id, a fresh session is created. With an id, the stored session
    /// is loaded if present, otherwise a new session is created under that id.
    pub async fn get_or_create(
        &self,
        session_id: Option<Uuid>,
        document_ids: &[Uuid],
    ) -> Result<ChatSession> {
        let _guard = self.creation.lock().await;

        let id = session_id.unwrap_or_else(Uuid::new_v4);
        if let Some(session) = self.backend.load(&id).await? {
            return Ok(session);
        }

        let session = ChatSession::new(id, document_ids.to_vec());
        self.backend.save(&session).await?;
        tracing::debug!(session_id = %id, "Created chat session");
        Ok(session)
    }

    /// Persist the current state of a session
    pub async fn save(&self, session: &ChatSession) -> Result<()> {
        self.backend.save(session).await
    }

    /// Append one completed turn (user message plus assistant reply) to a
    /// session. Read-modify-write under the session's write lock, so turns
    /// racing on the same session are appended one after the other instead
    /// of clobbering each other.
    pub async fn append_turn(
        &self,
        session_id: Uuid,
        document_ids: &[Uuid],
        user: ChatMessage,
        assistant: ChatMessage,
    ) -> Result<()> {
        let lock = self.write_lock(session_id);
        let _guard = lock.lock().await;

        let mut session = match self.backend.load(&session_id).await? {
            Some(session) => session,
            None => ChatSession::new(session_id, document_ids.to_vec()),
        };
        session.ground_in(document_ids);
        session.push(user);
        session.push(assistant);
        self.backend.save(&session).await
    }

    fn write_lock(&self, session_id: Uuid) -> Arc<Mutex<()>> {
        self.writes
            .entry(session_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Load a session; `Ok(None)` if it does not exist
    pub async fn load(&self, id: &Uuid) -> Result<Option<ChatSession>> {
        self.backend.load(id).await
    }

    /// All stored sessions, newest first
    pub async fn list_all(&self) -> Result<Vec<ChatSession>> {
        let mut sessions = self.backend.list_all().await?;
        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(sessions)
    }

    /// Remove a deleted document from every session's grounding set.
    ///
    /// Sessions left with no documents are deleted. Returns how many sessions
    /// were removed.
    pub async fn prune_document(&self, document_id: &Uuid) -> Result<usize> {
        let mut removed = 0;

        for mut session in self.backend.list_all().await? {
            if !session.document_ids.contains(document_id) {
                continue;
            }
            session.document_ids.retain(|id| id != document_id);

            if session.document_ids.is_empty() {
                self.backend.delete(&session.id).await?;
                self.writes.remove(&session.id);
                removed += 1;
            } else {
                self.backend.save(&session).await?;
            }
        }

        Ok(removed)
    }

    /// Name of the underlying backend
    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }
}
