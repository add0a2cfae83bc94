//! Chat session types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Message author role
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

/// A single message in a chat transcript
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl ChatMessage {
    pub fn user(content: String) -> Self {
        Self {
            role: MessageRole::User,
            content,
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn assistant(content: String) -> Self {
        Self {
            role: MessageRole::Assistant,
            content,
            timestamp: chrono::Utc::now(),
        }
    }
}

/// A persisted conversation transcript grounded in one or more documents.
/// Mutated only by appending messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: Uuid,
    pub created_at: chrono::DateTime<chrono::Utc>,
    /// Documents this session is grounded in
    pub document_ids: Vec<Uuid>,
    /// Ordered, append-only transcript
    pub messages: Vec<ChatMessage>,
}

impl ChatSession {
    /// Create a new session grounded in the given documents
    pub fn new(id: Uuid, document_ids: Vec<Uuid>) -> Self {
        Self {
            id,
            created_at: chrono::Utc::now(),
            document_ids,
            messages: Vec::new(),
        }
    }

    /// Add documents to the grounding set, keeping it duplicate-free
    pub fn ground_in(&mut self, document_ids: &[Uuid]) {
        for id in document_ids {
            if !self.document_ids.contains(id) {
                self.document_ids.push(*id);
            }
        }
    }

    /// Append a message to the transcript
    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }
}
