//! End-to-end flow: upload bytes, background indexing, retrieval, and a
//! streamed chat turn persisted to durable session storage.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use futures_util::stream::{self, BoxStream};
use futures_util::StreamExt;
use tempfile::TempDir;
use uuid::Uuid;

use docchat::chat::{ChatEngine, FileSessionBackend, SessionStore};
use docchat::config::{ChunkingConfig, EmbeddingConfig};
use docchat::error::{Error, Result};
use docchat::index::{IndexingPipeline, IndexingState, StatusTable, VectorStore};
use docchat::ingestion::PdfTextExtractor;
use docchat::providers::{EmbeddingProvider, GenerationProvider, PromptMessage};
use docchat::retrieval::ContextAssembler;
use docchat::types::{ChatRequest, Document, DocumentType};

/// Deterministic embedder: direction depends on which keyword the text mentions
struct KeywordEmbedder;

#[async_trait]
impl EmbeddingProvider for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(if text.contains("ferris") {
            vec![1.0, 0.0]
        } else {
            vec![0.0, 1.0]
        })
    }

    fn dimensions(&self) -> usize {
        2
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "keyword"
    }
}

/// Echoes the retrieved context size so the test can assert grounding happened
struct CannedLlm;

#[async_trait]
impl GenerationProvider for CannedLlm {
    async fn stream_complete(
        &self,
        _model: &str,
        messages: &[PromptMessage],
    ) -> Result<BoxStream<'static, Result<String>>> {
        assert_eq!(messages[0].role, "system");
        assert!(messages[0].content.contains("ferris"));
        Ok(stream::iter(vec![Ok("Ferris ".to_string()), Ok("is a crab.".to_string())]).boxed())
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "canned"
    }

    fn model(&self) -> &str {
        "canned-model"
    }
}

struct NoPdf;

impl PdfTextExtractor for NoPdf {
    fn extract_text(&self, _filename: &str, _data: &[u8]) -> Result<Vec<String>> {
        Ok(Vec::new())
    }
}

struct Harness {
    documents: Arc<DashMap<Uuid, Document>>,
    statuses: Arc<StatusTable>,
    pipeline: Arc<IndexingPipeline>,
    engine: ChatEngine,
    sessions: Arc<SessionStore>,
}

fn harness(data_dir: &TempDir) -> Harness {
    let documents: Arc<DashMap<Uuid, Document>> = Arc::new(DashMap::new());
    let statuses = Arc::new(StatusTable::new());
    let stores: Arc<DashMap<Uuid, Arc<VectorStore>>> = Arc::new(DashMap::new());
    let embedder: Arc<dyn EmbeddingProvider> = Arc::new(KeywordEmbedder);

    let pipeline = Arc::new(
        IndexingPipeline::new(
            Arc::clone(&statuses),
            Arc::clone(&stores),
            Arc::clone(&documents),
            Arc::clone(&embedder),
            Arc::new(NoPdf),
            &ChunkingConfig::default(),
            &EmbeddingConfig::default(),
            None,
        )
        .unwrap(),
    );

    let assembler = Arc::new(ContextAssembler::new(
        Arc::clone(&statuses),
        stores,
        Arc::clone(&documents),
        2,
    ));

    let sessions = Arc::new(SessionStore::new(Arc::new(FileSessionBackend::new(
        data_dir.path(),
    ))));
    let engine = ChatEngine::new(assembler, Arc::new(CannedLlm), Arc::clone(&sessions));

    Harness {
        documents,
        statuses,
        pipeline,
        engine,
        sessions,
    }
}

fn upload(harness: &Harness, filename: &str, data: &[u8]) -> Uuid {
    let doc_type = DocumentType::from_filename(filename).unwrap();
    let document = Document::new(filename.to_string(), doc_type, data.len() as u64);
    let id = document.id;
    harness.documents.insert(id, document.clone());
    harness.statuses.set_pending(id);
    harness.pipeline.start_indexing(document, data.to_vec());
    id
}

async fn wait_for_completion(statuses: &StatusTable, id: Uuid) -> usize {
    for _ in 0..200 {
        match statuses.get(&id) {
            Some(IndexingState::Completed { chunk_count }) => return chunk_count,
            Some(IndexingState::Failed { error }) => panic!("indexing failed: {}", error),
            _ => tokio::time::sleep(Duration::from_millis(10)).await,
        }
    }
    panic!("indexing never completed");
}

#[tokio::test]
async fn upload_index_chat_and_persist() {
    let dir = TempDir::new().unwrap();
    let harness = harness(&dir);

    let doc_id = upload(&harness, "ferris.txt", b"ferris is the rust mascot, a crab");
    let chunk_count = wait_for_completion(&harness.statuses, doc_id).await;
    assert_eq!(chunk_count, 1);

    let (session_id, stream) = harness
        .engine
        .chat_turn(ChatRequest {
            session_id: None,
            document_ids: vec![doc_id],
            message: "who is ferris?".to_string(),
            model: None,
        })
        .await
        .unwrap();

    let answer: String = stream.collect::<Vec<_>>().await.concat();
    assert_eq!(answer, "Ferris is a crab.");

    // The transcript lands on disk once the stream is drained
    let mut session = None;
    for _ in 0..100 {
        session = harness.sessions.load(&session_id).await.unwrap();
        if session.as_ref().map(|s| s.messages.len()) == Some(2) {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    let session = session.expect("session was not persisted");
    assert_eq!(session.messages.len(), 2);
    assert_eq!(session.messages[0].content, "who is ferris?");
    assert_eq!(session.messages[1].content, "Ferris is a crab.");
    assert!(dir
        .path()
        .join("sessions")
        .join(format!("{}.json", session_id))
        .exists());
}

#[tokio::test]
async fn chat_against_pending_document_is_rejected() {
    let dir = TempDir::new().unwrap();
    let harness = harness(&dir);

    // Registered but never indexed
    let document = Document::new("slow.txt".to_string(), DocumentType::Text, 4);
    let doc_id = document.id;
    harness.documents.insert(doc_id, document);
    harness.statuses.set_pending(doc_id);

    let err = harness
        .engine
        .chat_turn(ChatRequest {
            session_id: None,
            document_ids: vec![doc_id],
            message: "too early".to_string(),
            model: None,
        })
        .await
        .unwrap_err();

    match err {
        Error::NotReady(details) => {
            assert_eq!(details.len(), 1);
            assert_eq!(details[0].document_id, doc_id);
            assert_eq!(details[0].state, "pending");
        }
        other => panic!("expected NotReady, got {:?}", other),
    }
}

#[tokio::test]
async fn failed_indexing_reports_failed_state() {
    let dir = TempDir::new().unwrap();
    let harness = harness(&dir);

    let doc_id = upload(&harness, "blank.txt", b"   \n  ");

    for _ in 0..200 {
        if let Some(state) = harness.statuses.get(&doc_id) {
            if state.is_terminal() {
                assert!(matches!(state, IndexingState::Failed { .. }));
                return;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("indexing never reached a terminal state");
}

#[tokio::test]
async fn delete_discards_index_and_status() {
    let dir = TempDir::new().unwrap();
    let harness = harness(&dir);

    let doc_id = upload(&harness, "gone.txt", b"ferris content");
    wait_for_completion(&harness.statuses, doc_id).await;

    harness.documents.remove(&doc_id);
    harness.pipeline.discard(&doc_id).await;

    assert!(harness.pipeline.store(&doc_id).is_none());
    assert_eq!(harness.statuses.get(&doc_id), None);
}
