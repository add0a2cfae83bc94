//! Shared application state

use std::path::PathBuf;
use std::sync::Arc;

use dashmap::DashMap;
use uuid::Uuid;

use crate::chat::{resolve_backend, ChatEngine, SessionStore};
use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::index::{IndexingPipeline, StatusTable, VectorStore};
use crate::ingestion::PdfExtractBackend;
use crate::providers::{EmbeddingProvider, GenerationProvider, OpenAiClient};
use crate::retrieval::ContextAssembler;
use crate::types::{DeleteResponse, Document, DocumentType, UploadResponse};

/// Shared state for all request handlers
pub struct AppState {
    pub config: AppConfig,
    pub documents: Arc<DashMap<Uuid, Document>>,
    pub statuses: Arc<StatusTable>,
    pub pipeline: Arc<IndexingPipeline>,
    pub engine: Arc<ChatEngine>,
    pub sessions: Arc<SessionStore>,
    pub embedder: Arc<dyn EmbeddingProvider>,
    pub llm: Arc<dyn GenerationProvider>,
    /// True when the durable file backend is active
    pub durable: bool,
    /// Path of the persisted document registry, when durable
    registry_path: Option<PathBuf>,
}

impl AppState {
    /// Wire up the full application from configuration.
    ///
    /// Probes the data directory once to pick the session backend, and on the
    /// durable path reloads the document registry from the previous run.
    pub async fn new(config: AppConfig) -> Result<Arc<Self>> {
        config.validate()?;

        let client = Arc::new(OpenAiClient::new(&config.llm, &config.embeddings));
        let embedder: Arc<dyn EmbeddingProvider> = client.clone();
        let llm: Arc<dyn GenerationProvider> = client;

        let (backend, durable) = resolve_backend(&config.storage.data_dir).await;
        let sessions = Arc::new(SessionStore::new(backend));

        let registry_path = durable.then(|| config.storage.data_dir.join("documents.json"));
        let meta_dir = durable.then(|| config.storage.data_dir.join("index"));

        let documents: Arc<DashMap<Uuid, Document>> = Arc::new(DashMap::new());
        if let Some(path) = &registry_path {
            for doc in load_registry(path).await {
                documents.insert(doc.id, doc);
            }
            if !documents.is_empty() {
                // Vectors are never persisted, so reloaded documents report
                // "unknown" until they are uploaded again
                tracing::info!(
                    count = documents.len(),
                    "Reloaded document registry; indexes must be rebuilt by re-uploading"
                );
            }
        }

        let statuses = Arc::new(StatusTable::new());
        let stores: Arc<DashMap<Uuid, Arc<VectorStore>>> = Arc::new(DashMap::new());

        let pipeline = Arc::new(IndexingPipeline::new(
            Arc::clone(&statuses),
            Arc::clone(&stores),
            Arc::clone(&documents),
            Arc::clone(&embedder),
            Arc::new(PdfExtractBackend),
            &config.chunking,
            &config.embeddings,
            meta_dir,
        )?);

        let assembler = Arc::new(ContextAssembler::new(
            Arc::clone(&statuses),
            stores,
            Arc::clone(&documents),
            config.retrieval.per_document_k,
        ));

        let engine = Arc::new(ChatEngine::new(
            assembler,
            Arc::clone(&llm),
            Arc::clone(&sessions),
        ));

        Ok(Arc::new(Self {
            config,
            documents,
            statuses,
            pipeline,
            engine,
            sessions,
            embedder,
            llm,
            durable,
            registry_path,
        }))
    }

    /// Accept an upload: register the document and kick off indexing
    pub async fn accept_upload(&self, filename: String, data: Vec<u8>) -> Result<UploadResponse> {
        let doc_type = DocumentType::from_filename(&filename)?;
        let document = Document::new(filename, doc_type, data.len() as u64);
        let document_id = document.id;

        self.documents.insert(document_id, document.clone());
        self.statuses.set_pending(document_id);
        self.persist_registry().await;

        tracing::info!(
            %document_id,
            filename = %document.filename,
            doc_type = document.doc_type.display_name(),
            size_bytes = document.size_bytes,
            "Document accepted"
        );

        let filename = document.filename.clone();
        self.pipeline.start_indexing(document, data);

        Ok(UploadResponse {
            document_id,
            filename,
            status: "pending".to_string(),
            message: "Indexing started in the background".to_string(),
        })
    }

    /// Delete a document: registry, index, status, and session grounding
    pub async fn delete_document(&self, document_id: Uuid) -> Result<DeleteResponse> {
        if self.documents.remove(&document_id).is_none() {
            return Err(Error::DocumentNotFound(document_id));
        }
        self.persist_registry().await;
        self.pipeline.discard(&document_id).await;
        let sessions_removed = self.sessions.prune_document(&document_id).await?;

        tracing::info!(%document_id, sessions_removed, "Document deleted");

        Ok(DeleteResponse {
            document_id,
            deleted: true,
            sessions_removed,
        })
    }

    async fn persist_registry(&self) {
        let Some(path) = &self.registry_path else {
            return;
        };

        let docs: Vec<Document> = self.documents.iter().map(|entry| entry.value().clone()).collect();
        let result = async {
            let json = serde_json::to_vec_pretty(&docs)?;
            tokio::fs::write(path, json).await?;
            Ok::<(), Error>(())
        }
        .await;

        if let Err(e) = result {
            tracing::warn!(error = %e, "Failed to persist document registry");
        }
    }
}

async fn load_registry(path: &std::path::Path) -> Vec<Document> {
    match tokio::fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(docs) => docs,
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring corrupt document registry");
                Vec::new()
            }
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read document registry");
            Vec::new()
        }
    }
}
