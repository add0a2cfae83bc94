//! Document ingestion: per-type text extraction and chunking

mod chunker;
mod extract;

pub use chunker::TextChunker;
pub use extract::{extract_blocks, PdfExtractBackend, PdfTextExtractor};
