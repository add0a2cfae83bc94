//! Error types for the document chat engine

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

/// Result type alias for docchat operations
pub type Result<T> = std::result::Result<T, Error>;

/// Per-document status detail carried by [`Error::NotReady`]
#[derive(Debug, Clone)]
pub struct NotReadyDetail {
    pub document_id: Uuid,
    /// Reported state: "pending", "indexing", "failed", or "unknown"
    pub state: String,
}

impl std::fmt::Display for NotReadyDetail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.document_id, self.state)
    }
}

/// Docchat errors
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error (bad chunker parameters etc.) - fatal at startup
    #[error("Configuration error: {0}")]
    Config(String),

    /// Unsupported file extension, rejected before extraction
    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),

    /// Content extraction failed
    #[error("Failed to extract text from '{filename}': {message}")]
    Extraction { filename: String, message: String },

    /// Embedding service error
    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    /// Query issued against documents that are not all in `completed` state
    #[error("Documents not ready for querying: {}", format_details(.0))]
    NotReady(Vec<NotReadyDetail>),

    /// Retrieval found nothing to ground the answer in
    #[error("No relevant content found in the selected documents")]
    NoRelevantContent,

    /// Generation service error
    #[error("Generation failed: {0}")]
    Generation(String),

    /// Document not found
    #[error("Document not found: {0}")]
    DocumentNotFound(Uuid),

    /// Chat session not found
    #[error("Session not found: {0}")]
    SessionNotFound(Uuid),

    /// Session storage error
    #[error("Session storage error: {0}")]
    SessionStorage(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

fn format_details(details: &[NotReadyDetail]) -> String {
    details
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl Error {
    /// Create an extraction error
    pub fn extraction(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Extraction {
            filename: filename.into(),
            message: message.into(),
        }
    }

    /// Create an embedding error
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding(message.into())
    }

    /// Create a generation error
    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            Error::Config(msg) => (StatusCode::BAD_REQUEST, "config_error", msg.clone()),
            Error::UnsupportedType(ext) => (
                StatusCode::BAD_REQUEST,
                "unsupported_type",
                format!("Unsupported file type: {}", ext),
            ),
            Error::Extraction { filename, message } => (
                StatusCode::BAD_REQUEST,
                "extraction_error",
                format!("Failed to extract '{}': {}", filename, message),
            ),
            Error::Embedding(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "embedding_error", msg.clone())
            }
            Error::NotReady(_) => (StatusCode::CONFLICT, "not_ready", self.to_string()),
            Error::NoRelevantContent => {
                (StatusCode::NOT_FOUND, "no_relevant_content", self.to_string())
            }
            Error::Generation(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, "generation_error", msg.clone())
            }
            Error::DocumentNotFound(id) => (
                StatusCode::NOT_FOUND,
                "not_found",
                format!("Document not found: {}", id),
            ),
            Error::SessionNotFound(id) => (
                StatusCode::NOT_FOUND,
                "not_found",
                format!("Session not found: {}", id),
            ),
            Error::SessionStorage(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "session_storage_error", msg.clone())
            }
            Error::Io(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "io_error",
                err.to_string(),
            ),
            Error::Json(err) => (StatusCode::BAD_REQUEST, "json_error", err.to_string()),
            Error::Http(err) => (StatusCode::BAD_GATEWAY, "http_error", err.to_string()),
            Error::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg.clone())
            }
        };

        let body = Json(json!({
            "error": {
                "type": error_type,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}
