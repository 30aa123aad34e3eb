//! Similarity search over vectorized events (C7, spec.md §4.7 query path).

use pgvector::Vector;

use crate::common::OrchestratorError;
use crate::kernel::store::{EmbeddingMatch, Store};

use super::embedder::EmbeddingClient;

#[derive(Debug, Default, Clone)]
pub struct SearchFilters {
    pub job_id: Option<String>,
    pub event_type: Option<String>,
}

/// Read-only query path: embed the query text, then nearest-neighbor search.
pub struct VectorSearch {
    store: Store,
    embedder: EmbeddingClient,
}

impl VectorSearch {
    pub fn new(store: Store, embedder: EmbeddingClient) -> Self {
        Self { store, embedder }
    }

    pub async fn search(
        &self,
        query_text: &str,
        top_k: i64,
        filters: SearchFilters,
    ) -> Result<Vec<EmbeddingMatch>, OrchestratorError> {
        let mut vectors = self
            .embedder
            .embed_batch(std::slice::from_ref(&query_text.to_string()))
            .await
            .map_err(|e| OrchestratorError::Internal(anyhow::anyhow!(e)))?;

        let query_vector = vectors
            .pop()
            .ok_or_else(|| OrchestratorError::Internal(anyhow::anyhow!("embedding service returned no vector")))?;

        self.store
            .search_embeddings(Vector::from(query_vector), top_k, filters.job_id, filters.event_type)
            .await
    }
}
