//! Assembles grounding context from the selected documents

use std::sync::Arc;

use dashmap::DashMap;
use uuid::Uuid;

use crate::error::{Error, NotReadyDetail, Result};
use crate::index::{IndexingState, StatusTable, VectorStore};
use crate::types::Document;

/// Retrieved context ready to be handed to the prompt builder
#[derive(Debug, Clone)]
pub struct GroundingContext {
    /// Concatenated chunk texts, document order preserved
    pub text: String,
    /// Filenames of the documents the context was drawn from
    pub source_names: Vec<String>,
}

/// Builds a grounding context by searching each selected document's index
pub struct ContextAssembler {
    statuses: Arc<StatusTable>,
    stores: Arc<DashMap<Uuid, Arc<VectorStore>>>,
    documents: Arc<DashMap<Uuid, Document>>,
    /// Chunks retrieved per document
    per_document_k: usize,
}

impl ContextAssembler {
    pub fn new(
        statuses: Arc<StatusTable>,
        stores: Arc<DashMap<Uuid, Arc<VectorStore>>>,
        documents: Arc<DashMap<Uuid, Document>>,
        per_document_k: usize,
    ) -> Self {
        Self {
            statuses,
            stores,
            documents,
            per_document_k,
        }
    }

    /// Retrieve the top chunks from every selected document.
    ///
    /// Fails with `NotReady` listing every document that is not in completed
    /// state, and with `NoRelevantContent` if the searches come back empty.
    /// Documents contribute in the order the caller listed them; within a
    /// document hits are ordered by descending similarity.
    pub async fn build_context(&self, query: &str, document_ids: &[Uuid]) -> Result<GroundingContext> {
        let mut not_ready = Vec::new();
        for id in document_ids {
            match self.statuses.get(id) {
                Some(IndexingState::Completed { .. }) => {}
                Some(IndexingState::Pending) => not_ready.push(detail(*id, "pending")),
                Some(IndexingState::Indexing) => not_ready.push(detail(*id, "indexing")),
                Some(IndexingState::Failed { .. }) => not_ready.push(detail(*id, "failed")),
                None => not_ready.push(detail(*id, "unknown")),
            }
        }
        if !not_ready.is_empty() {
            return Err(Error::NotReady(not_ready));
        }

        let mut sections = Vec::new();
        let mut source_names = Vec::new();

        for id in document_ids {
            // Completed status implies the store exists; a missing store here
            // means a delete raced us, treat it the same as not ready
            let store = self
                .stores
                .get(id)
                .map(|s| Arc::clone(s.value()))
                .ok_or_else(|| Error::NotReady(vec![detail(*id, "unknown")]))?;

            let hits = store.search_by_text(query, self.per_document_k).await?;
            if hits.is_empty() {
                continue;
            }

            if let Some(doc) = self.documents.get(id) {
                source_names.push(doc.filename.clone());
            }
            for hit in hits {
                sections.push(hit.chunk.text);
            }
        }

        if sections.is_empty() {
            return Err(Error::NoRelevantContent);
        }

        Ok(GroundingContext {
            text: sections.join("\n\n---\n\n"),
            source_names,
        })
    }
}

fn detail(document_id: Uuid, state: &str) -> NotReadyDetail {
    NotReadyDetail {
        document_id,
        state: state.to_string(),
    }
}
