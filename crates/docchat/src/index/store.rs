//! In-memory per-document vector store with cosine similarity search

use std::sync::Arc;

use futures_util::{stream, StreamExt, TryStreamExt};
use parking_lot::RwLock;

use crate::error::{Error, Result};
use crate::providers::EmbeddingProvider;
use crate::types::Chunk;

/// A scored search hit
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub chunk: Chunk,
    pub score: f32,
}

/// Vector store holding all chunks of a single document.
///
/// Chunks and their vectors are inserted during indexing and never mutated
/// afterwards; searches run against a consistent snapshot under the lock.
pub struct VectorStore {
    embedder: Arc<dyn EmbeddingProvider>,
    entries: RwLock<Vec<(Chunk, Vec<f32>)>>,
}

impl VectorStore {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            embedder,
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Insert a chunk with its vector. Every vector in a store must have the
    /// same length as the first one inserted.
    pub fn insert(&self, chunk: Chunk, vector: Vec<f32>) -> Result<()> {
        let mut entries = self.entries.write();
        if let Some((_, first)) = entries.first() {
            if first.len() != vector.len() {
                return Err(Error::embedding(format!(
                    "Inconsistent embedding dimensions: expected {}, got {}",
                    first.len(),
                    vector.len()
                )));
            }
        }
        entries.push((chunk, vector));
        Ok(())
    }

    /// Embed all chunk texts and populate the store.
    ///
    /// Embedding runs with bounded concurrency but results keep chunk order.
    /// If any embedding fails the store is left untouched, so a document is
    /// either fully indexed or not at all.
    pub async fn build_from_chunks(&self, chunks: Vec<Chunk>, concurrency: usize) -> Result<usize> {
        let embedder = Arc::clone(&self.embedder);
        let texts: Vec<String> = chunks.iter().map(|chunk| chunk.text.clone()).collect();

        let vectors: Vec<Vec<f32>> = stream::iter(texts.into_iter().map(move |text| {
            let embedder = Arc::clone(&embedder);
            async move { embedder.embed(&text).await }
        }))
        .buffered(concurrency.max(1))
        .try_collect()
        .await?;

        let count = chunks.len();
        for (chunk, vector) in chunks.into_iter().zip(vectors) {
            self.insert(chunk, vector)?;
        }
        Ok(count)
    }

    /// Top-k chunks by cosine similarity to the query vector.
    ///
    /// Returns at most `min(k, len)` hits, best first; ties keep insertion
    /// order. An empty store yields an empty result, never an error.
    pub fn search_by_vector(&self, query: &[f32], k: usize) -> Vec<SearchHit> {
        let entries = self.entries.read();

        let mut hits: Vec<SearchHit> = entries
            .iter()
            .map(|(chunk, vector)| SearchHit {
                chunk: chunk.clone(),
                score: cosine_similarity(query, vector),
            })
            .collect();

        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(k);
        hits
    }

    /// Embed the query text, then search
    pub async fn search_by_text(&self, query: &str, k: usize) -> Result<Vec<SearchHit>> {
        let query_vector = self.embedder.embed(query).await?;
        Ok(self.search_by_vector(&query_vector, k))
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

/// Cosine similarity; zero-norm vectors score 0.0
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use uuid::Uuid;

    /// Maps known words to fixed unit vectors so similarity is predictable
    struct StubEmbedder;

    #[async_trait]
    impl EmbeddingProvider for StubEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            Ok(match text {
                t if t.contains("alpha") => vec![1.0, 0.0, 0.0],
                t if t.contains("beta") => vec![0.0, 1.0, 0.0],
                _ => vec![0.0, 0.0, 1.0],
            })
        }

        fn dimensions(&self) -> usize {
            3
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        fn name(&self) -> &str {
            "stub"
        }
    }

    fn store() -> VectorStore {
        VectorStore::new(Arc::new(StubEmbedder))
    }

    fn chunk(text: &str, ordinal: u32) -> Chunk {
        Chunk::new(Uuid::new_v4(), text.to_string(), ordinal)
    }

    #[test]
    fn cosine_handles_zero_norm() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn rejects_inconsistent_dimensions() {
        let store = store();
        store.insert(chunk("a", 0), vec![1.0, 0.0]).unwrap();
        let result = store.insert(chunk("b", 1), vec![1.0, 0.0, 0.0]);
        assert!(matches!(result, Err(Error::Embedding(_))));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn empty_store_returns_no_hits() {
        let hits = store().search_by_vector(&[1.0, 0.0, 0.0], 5);
        assert!(hits.is_empty());
    }

    #[test]
    fn returns_at_most_k_hits_best_first() {
        let store = store();
        store.insert(chunk("a", 0), vec![1.0, 0.0, 0.0]).unwrap();
        store.insert(chunk("b", 1), vec![0.0, 1.0, 0.0]).unwrap();
        store.insert(chunk("c", 2), vec![0.9, 0.1, 0.0]).unwrap();

        let hits = store.search_by_vector(&[1.0, 0.0, 0.0], 2);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].chunk.text, "a");
        assert_eq!(hits[1].chunk.text, "c");

        // k larger than the store is clamped
        let hits = store.search_by_vector(&[1.0, 0.0, 0.0], 10);
        assert_eq!(hits.len(), 3);
    }

    #[test]
    fn ties_keep_insertion_order() {
        let store = store();
        store.insert(chunk("first", 0), vec![1.0, 0.0, 0.0]).unwrap();
        store.insert(chunk("second", 1), vec![1.0, 0.0, 0.0]).unwrap();

        let hits = store.search_by_vector(&[1.0, 0.0, 0.0], 2);
        assert_eq!(hits[0].chunk.text, "first");
        assert_eq!(hits[1].chunk.text, "second");
    }

    #[tokio::test]
    async fn build_from_chunks_keeps_order() {
        let store = store();
        let doc = Uuid::new_v4();
        let chunks = vec![
            Chunk::new(doc, "alpha one".to_string(), 0),
            Chunk::new(doc, "beta two".to_string(), 1),
            Chunk::new(doc, "gamma three".to_string(), 2),
        ];

        let count = store.build_from_chunks(chunks, 2).await.unwrap();
        assert_eq!(count, 3);
        assert_eq!(store.len(), 3);

        let hits = store.search_by_vector(&[0.0, 1.0, 0.0], 1);
        assert_eq!(hits[0].chunk.text, "beta two");
        assert_eq!(hits[0].chunk.ordinal, 1);
    }

    #[tokio::test]
    async fn build_runs_inside_a_spawned_task() {
        let store = Arc::new(store());
        let doc = Uuid::new_v4();
        let chunks = vec![
            Chunk::new(doc, "alpha".to_string(), 0),
            Chunk::new(doc, "beta".to_string(), 1),
        ];

        // The pipeline runs this inside tokio::spawn, so the future must be
        // Send + 'static
        let handle = tokio::spawn({
            let store = Arc::clone(&store);
            async move { store.build_from_chunks(chunks, 2).await }
        });

        assert_eq!(handle.await.unwrap().unwrap(), 2);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn search_by_text_embeds_the_query() {
        let store = store();
        store.insert(chunk("alpha doc", 0), vec![1.0, 0.0, 0.0]).unwrap();
        store.insert(chunk("beta doc", 1), vec![0.0, 1.0, 0.0]).unwrap();

        let hits = store.search_by_text("tell me about beta", 1).await.unwrap();
        assert_eq!(hits[0].chunk.text, "beta doc");
    }
}
