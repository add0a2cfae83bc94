//! Request and response DTOs for the HTTP API

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::chat::{ChatMessage, ChatSession};
use super::document::Document;
use crate::index::IndexingState;

/// Response to a document upload: indexing continues in the background
#[derive(Debug, Clone, Serialize)]
pub struct UploadResponse {
    pub document_id: Uuid,
    pub filename: String,
    pub status: String,
    pub message: String,
}

/// Indexing status for a document, as seen by a polling caller
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub document_id: Uuid,
    /// "pending" | "indexing" | "completed" | "failed" | "unknown"
    pub state: String,
    pub message: String,
}

impl StatusResponse {
    /// Build from a status table lookup; `None` means the id was never seen
    pub fn from_lookup(document_id: Uuid, state: Option<IndexingState>) -> Self {
        match state {
            Some(IndexingState::Pending) => Self {
                document_id,
                state: "pending".to_string(),
                message: "Waiting for indexing to start".to_string(),
            },
            Some(IndexingState::Indexing) => Self {
                document_id,
                state: "indexing".to_string(),
                message: "Indexing in progress".to_string(),
            },
            Some(IndexingState::Completed { chunk_count }) => Self {
                document_id,
                state: "completed".to_string(),
                message: format!("Indexed {} chunks", chunk_count),
            },
            Some(IndexingState::Failed { error }) => Self {
                document_id,
                state: "failed".to_string(),
                message: error,
            },
            None => Self {
                document_id,
                state: "unknown".to_string(),
                message: "No indexing record for this document".to_string(),
            },
        }
    }
}

/// Summary of a registered document
#[derive(Debug, Clone, Serialize)]
pub struct DocumentSummary {
    pub id: Uuid,
    pub filename: String,
    pub doc_type: String,
    pub size_bytes: u64,
    pub uploaded_at: chrono::DateTime<chrono::Utc>,
}

impl From<&Document> for DocumentSummary {
    fn from(doc: &Document) -> Self {
        Self {
            id: doc.id,
            filename: doc.filename.clone(),
            doc_type: doc.doc_type.display_name().to_lowercase(),
            size_bytes: doc.size_bytes,
            uploaded_at: doc.uploaded_at,
        }
    }
}

/// Chat request body
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    /// Existing session to continue, or absent to start a new one
    #[serde(default)]
    pub session_id: Option<Uuid>,
    /// Documents to ground the answer in (all must be indexed)
    pub document_ids: Vec<Uuid>,
    /// The user's message
    pub message: String,
    /// Optional model override
    #[serde(default)]
    pub model: Option<String>,
}

/// Session summary for listings
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub id: Uuid,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub document_ids: Vec<Uuid>,
    pub message_count: usize,
}

impl From<&ChatSession> for SessionSummary {
    fn from(session: &ChatSession) -> Self {
        Self {
            id: session.id,
            created_at: session.created_at,
            document_ids: session.document_ids.clone(),
            message_count: session.messages.len(),
        }
    }
}

/// Full session payload
#[derive(Debug, Clone, Serialize)]
pub struct SessionResponse {
    pub id: Uuid,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub document_ids: Vec<Uuid>,
    pub messages: Vec<ChatMessage>,
}

impl From<ChatSession> for SessionResponse {
    fn from(session: ChatSession) -> Self {
        Self {
            id: session.id,
            created_at: session.created_at,
            document_ids: session.document_ids,
            messages: session.messages,
        }
    }
}

/// Response to a document delete
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    pub document_id: Uuid,
    pub deleted: bool,
    /// Sessions that were removed because they lost their last document
    pub sessions_removed: usize,
}
