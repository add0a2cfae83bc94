//! Document and chunk types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Supported document types, selected once at upload time
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    /// PDF document
    Pdf,
    /// Plain text file
    Text,
    /// Markdown file
    Markdown,
    /// CSV file
    Csv,
    /// JSON file
    Json,
}

impl DocumentType {
    /// Detect document type from the filename extension.
    /// Unknown extensions are rejected before any extraction is attempted.
    pub fn from_filename(filename: &str) -> Result<Self> {
        let ext = std::path::Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "pdf" => Ok(Self::Pdf),
            "txt" | "text" => Ok(Self::Text),
            "md" | "markdown" => Ok(Self::Markdown),
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "" => Err(Error::UnsupportedType(format!("'{}' has no extension", filename))),
            other => Err(Error::UnsupportedType(other.to_string())),
        }
    }

    /// Get display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Pdf => "PDF",
            Self::Text => "Text",
            Self::Markdown => "Markdown",
            Self::Csv => "CSV",
            Self::Json => "JSON",
        }
    }
}

/// A document accepted for indexing. Immutable after upload; destroyed only
/// by explicit delete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique document ID, independent of the filename
    pub id: Uuid,
    /// Original filename as uploaded
    pub filename: String,
    /// Document type
    pub doc_type: DocumentType,
    /// File size in bytes
    pub size_bytes: u64,
    /// Upload timestamp
    pub uploaded_at: chrono::DateTime<chrono::Utc>,
}

impl Document {
    /// Create a new document record
    pub fn new(filename: String, doc_type: DocumentType, size_bytes: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            filename,
            doc_type,
            size_bytes,
            uploaded_at: chrono::Utc::now(),
        }
    }
}

/// A chunk of extracted text, the unit of retrieval. Produced once during
/// indexing, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Parent document ID
    pub document_id: Uuid,
    /// Text content (non-empty)
    pub text: String,
    /// Position within the document, preserved for citation
    pub ordinal: u32,
}

impl Chunk {
    /// Create a new chunk
    pub fn new(document_id: Uuid, text: String, ordinal: u32) -> Self {
        Self {
            document_id,
            text,
            ordinal,
        }
    }
}
