//! Indexing state machine and shared status table

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle state of a document's index.
///
/// Valid transitions: Pending -> Indexing -> Completed | Failed.
/// Completed and Failed are terminal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum IndexingState {
    /// Accepted, indexing not yet started
    Pending,
    /// Extraction, chunking, and embedding in progress
    Indexing,
    /// Index is ready to query
    Completed { chunk_count: usize },
    /// Indexing failed; the document is not queryable
    Failed { error: String },
}

impl IndexingState {
    /// Terminal states are never overwritten by later transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed { .. } | Self::Failed { .. })
    }
}

/// Concurrent map from document id to indexing state.
///
/// Reads during transitions see either the old or the new state, never a
/// partial one. Lookups for ids that were never registered return `None`,
/// which callers surface as "unknown".
#[derive(Debug, Default)]
pub struct StatusTable {
    states: DashMap<Uuid, IndexingState>,
}

impl StatusTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a document as accepted for indexing
    pub fn set_pending(&self, document_id: Uuid) {
        self.states.insert(document_id, IndexingState::Pending);
    }

    /// Mark indexing as started
    pub fn mark_indexing(&self, document_id: Uuid) {
        self.transition(document_id, IndexingState::Indexing);
    }

    /// Mark indexing as completed with the final chunk count
    pub fn complete(&self, document_id: Uuid, chunk_count: usize) {
        self.transition(document_id, IndexingState::Completed { chunk_count });
    }

    /// Mark indexing as failed
    pub fn fail(&self, document_id: Uuid, error: impl Into<String>) {
        self.transition(document_id, IndexingState::Failed { error: error.into() });
    }

    fn transition(&self, document_id: Uuid, next: IndexingState) {
        let mut entry = self.states.entry(document_id).or_insert(next.clone());
        if !entry.is_terminal() {
            *entry = next;
        }
    }

    /// Current state, or `None` if the id was never registered
    pub fn get(&self, document_id: &Uuid) -> Option<IndexingState> {
        self.states.get(document_id).map(|s| s.value().clone())
    }

    /// Drop the record entirely (document deleted)
    pub fn remove(&self, document_id: &Uuid) {
        self.states.remove(document_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walks_the_happy_path() {
        let table = StatusTable::new();
        let id = Uuid::new_v4();

        assert_eq!(table.get(&id), None);

        table.set_pending(id);
        assert_eq!(table.get(&id), Some(IndexingState::Pending));

        table.mark_indexing(id);
        assert_eq!(table.get(&id), Some(IndexingState::Indexing));

        table.complete(id, 7);
        assert_eq!(table.get(&id), Some(IndexingState::Completed { chunk_count: 7 }));
    }

    #[test]
    fn terminal_states_are_sticky() {
        let table = StatusTable::new();
        let id = Uuid::new_v4();

        table.set_pending(id);
        table.fail(id, "boom");
        table.mark_indexing(id);
        table.complete(id, 3);

        assert_eq!(
            table.get(&id),
            Some(IndexingState::Failed { error: "boom".to_string() })
        );
    }

    #[test]
    fn remove_forgets_the_document() {
        let table = StatusTable::new();
        let id = Uuid::new_v4();

        table.set_pending(id);
        table.remove(&id);
        assert_eq!(table.get(&id), None);
    }
}
