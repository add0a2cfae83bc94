//! Multi-document retrieval and context assembly

pub mod context;

pub use context::{ContextAssembler, GroundingContext};
