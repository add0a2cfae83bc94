//! Per-document vector index and background indexing

pub mod pipeline;
pub mod status;
pub mod store;

pub use pipeline::IndexingPipeline;
pub use status::{IndexingState, StatusTable};
pub use store::VectorStore;
