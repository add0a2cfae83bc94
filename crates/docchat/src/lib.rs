//! Document chat engine
//!
//! Upload documents, index them in the background into per-document vector
//! stores, and chat with a model grounded in the retrieved content. Chat
//! sessions persist to disk when the data directory is writable, with an
//! in-memory fallback otherwise.

pub mod chat;
pub mod config;
pub mod error;
pub mod index;
pub mod ingestion;
pub mod providers;
pub mod retrieval;
pub mod server;
pub mod types;

pub use config::AppConfig;
pub use error::{Error, Result};
pub use server::AppState;
