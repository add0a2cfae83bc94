//! Chat sessions and grounded answer generation

pub mod engine;
pub mod prompt;
pub mod storage;
pub mod store;

pub use engine::ChatEngine;
pub use storage::{resolve_backend, FileSessionBackend, MemorySessionBackend, SessionBackend};
pub use store::SessionStore;
