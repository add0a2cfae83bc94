//! Provider abstractions for the embedding and generation services
//!
//! Both services are opaque upstream collaborators reached over HTTP; the
//! traits keep them injectable so tests can substitute deterministic stubs.

pub mod embedding;
pub mod llm;
pub mod openai;

pub use embedding::EmbeddingProvider;
pub use llm::{GenerationProvider, PromptMessage};
pub use openai::OpenAiClient;
