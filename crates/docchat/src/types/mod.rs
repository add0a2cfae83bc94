//! Core types: documents, chunks, chat sessions, and API DTOs

pub mod chat;
pub mod document;
pub mod response;

pub use chat::{ChatMessage, ChatSession, MessageRole};
pub use document::{Chunk, Document, DocumentType};
pub use response::{
    ChatRequest, DeleteResponse, DocumentSummary, SessionResponse, SessionSummary, StatusResponse,
    UploadResponse,
};
