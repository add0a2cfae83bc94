//! Background indexing pipeline
//!
//! Upload returns immediately; extraction, chunking, and embedding run in a
//! spawned task per document. Progress is visible through the status table
//! and the finished index through the store map.

use std::path::PathBuf;
use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::config::{ChunkingConfig, EmbeddingConfig};
use crate::error::{Error, Result};
use crate::ingestion::{extract_blocks, PdfTextExtractor, TextChunker};
use crate::providers::EmbeddingProvider;
use crate::types::{Chunk, Document};

use super::status::StatusTable;
use super::store::VectorStore;

/// Metadata written next to the durable registry when a document finishes
/// indexing. Vectors themselves stay in memory only.
#[derive(Debug, Serialize, Deserialize)]
struct IndexMeta {
    document_id: Uuid,
    filename: String,
    chunk_count: usize,
    indexed_at: chrono::DateTime<chrono::Utc>,
}

/// Drives document indexing in the background
pub struct IndexingPipeline {
    statuses: Arc<StatusTable>,
    stores: Arc<DashMap<Uuid, Arc<VectorStore>>>,
    documents: Arc<DashMap<Uuid, Document>>,
    embedder: Arc<dyn EmbeddingProvider>,
    pdf: Arc<dyn PdfTextExtractor>,
    chunker: TextChunker,
    embed_concurrency: usize,
    /// Directory for index metadata; `None` when running on the in-memory
    /// fallback backend
    meta_dir: Option<PathBuf>,
    tasks: DashMap<Uuid, JoinHandle<()>>,
}

impl IndexingPipeline {
    pub fn new(
        statuses: Arc<StatusTable>,
        stores: Arc<DashMap<Uuid, Arc<VectorStore>>>,
        documents: Arc<DashMap<Uuid, Document>>,
        embedder: Arc<dyn EmbeddingProvider>,
        pdf: Arc<dyn PdfTextExtractor>,
        chunking: &ChunkingConfig,
        embeddings: &EmbeddingConfig,
        meta_dir: Option<PathBuf>,
    ) -> Result<Self> {
        Ok(Self {
            statuses,
            stores,
            documents,
            embedder,
            pdf,
            chunker: TextChunker::new(chunking)?,
            embed_concurrency: embeddings.concurrency(),
            meta_dir,
            tasks: DashMap::new(),
        })
    }

    /// Spawn indexing for an uploaded document. The caller has already
    /// registered the document and set its status to pending.
    pub fn start_indexing(self: &Arc<Self>, document: Document, data: Vec<u8>) {
        let pipeline = Arc::clone(self);
        let document_id = document.id;

        let handle = tokio::spawn(async move {
            let filename = document.filename.clone();
            match pipeline.index_document(document, data).await {
                Ok(chunk_count) => {
                    tracing::info!(%document_id, chunk_count, filename = %filename, "Document indexed");
                }
                Err(e) => {
                    tracing::warn!(%document_id, filename = %filename, error = %e, "Indexing failed");
                    // Same guard as the commit path: a document deleted while
                    // the job ran keeps no status record, failed or otherwise
                    if pipeline.documents.contains_key(&document_id) {
                        pipeline.statuses.fail(document_id, e.to_string());
                    } else {
                        pipeline.statuses.remove(&document_id);
                    }
                }
            }
            pipeline.tasks.remove(&document_id);
        });

        self.tasks.insert(document_id, handle);
    }

    async fn index_document(&self, document: Document, data: Vec<u8>) -> Result<usize> {
        let document_id = document.id;
        self.statuses.mark_indexing(document_id);

        // Extraction can be CPU-heavy (PDF parsing), keep it off the runtime
        let pdf = Arc::clone(&self.pdf);
        let chunker = self.chunker.clone();
        let filename = document.filename.clone();
        let doc_type = document.doc_type;
        let texts = tokio::task::spawn_blocking(move || -> Result<Vec<String>> {
            let blocks = extract_blocks(doc_type, &filename, &data, pdf.as_ref())?;
            Ok(chunker.split(&blocks))
        })
        .await
        .map_err(|e| Error::internal(format!("Indexing task panicked: {}", e)))??;

        if texts.is_empty() {
            return Err(Error::extraction(
                &document.filename,
                "Document contains no extractable text",
            ));
        }

        let chunks: Vec<Chunk> = texts
            .into_iter()
            .enumerate()
            .map(|(i, text)| Chunk::new(document_id, text, i as u32))
            .collect();

        let store = Arc::new(VectorStore::new(Arc::clone(&self.embedder)));
        let chunk_count = store.build_from_chunks(chunks, self.embed_concurrency).await?;

        // The document may have been deleted while we were embedding; commit
        // only if it is still registered, otherwise drop the orphaned index
        if !self.documents.contains_key(&document_id) {
            tracing::debug!(%document_id, "Document deleted during indexing, discarding index");
            self.statuses.remove(&document_id);
            return Ok(0);
        }

        self.stores.insert(document_id, store);
        self.statuses.complete(document_id, chunk_count);

        if let Some(dir) = &self.meta_dir {
            let meta = IndexMeta {
                document_id,
                filename: document.filename.clone(),
                chunk_count,
                indexed_at: chrono::Utc::now(),
            };
            if let Err(e) = write_meta(dir, &meta).await {
                tracing::warn!(%document_id, error = %e, "Failed to write index metadata");
            }
        }

        Ok(chunk_count)
    }

    /// Get the finished index for a document, if any
    pub fn store(&self, document_id: &Uuid) -> Option<Arc<VectorStore>> {
        self.stores.get(document_id).map(|s| Arc::clone(s.value()))
    }

    /// Drop everything the pipeline holds for a document: a running task,
    /// the index, the status record, and on-disk metadata.
    pub async fn discard(&self, document_id: &Uuid) {
        if let Some((_, handle)) = self.tasks.remove(document_id) {
            handle.abort();
        }
        self.stores.remove(document_id);
        self.statuses.remove(document_id);

        if let Some(dir) = &self.meta_dir {
            let path = meta_path(dir, document_id);
            if let Err(e) = tokio::fs::remove_file(&path).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(%document_id, error = %e, "Failed to remove index metadata");
                }
            }
        }
    }
}

fn meta_path(dir: &std::path::Path, document_id: &Uuid) -> PathBuf {
    dir.join(format!("{}.json", document_id))
}

async fn write_meta(dir: &std::path::Path, meta: &IndexMeta) -> Result<()> {
    tokio::fs::create_dir_all(dir).await?;
    let json = serde_json::to_vec_pretty(meta)?;
    tokio::fs::write(meta_path(dir, &meta.document_id), json).await?;
    Ok(())
}
