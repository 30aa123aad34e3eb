//! Chunk + embed + upsert for a job's events (C7, spec.md §4.7).

use pgvector::Vector;
use tracing::warn;

use crate::common::{JobId, OrchestratorError};
use crate::kernel::store::{JobEventRow, Store};

use super::chunker::chunk_document;
use super::document::build_document;
use super::embedder::EmbeddingClient;

const SOURCE_TABLE: &str = "crew_job_event";

/// Outcome of vectorizing one job's event log.
#[derive(Debug, Clone, Default)]
pub struct VectorizationSummary {
    pub chunks_written: usize,
    pub degraded_chunk_count: usize,
}

pub struct VectorizationPipeline {
    store: Store,
    embedder: EmbeddingClient,
}

impl VectorizationPipeline {
    pub fn new(store: Store, embedder: EmbeddingClient) -> Self {
        Self { store, embedder }
    }

    /// Vectorizes every event of `job_id`, upserting one row per chunk keyed
    /// by `(source_table, source_id, chunk_index)` (spec.md §4.7).
    ///
    /// `source_id` is `"{job_id}:{seq}"` — the pair that uniquely identifies
    /// one event row, since the vector store's identity tuple only has room
    /// for a single `source_id` component.
    pub async fn vectorize_job(&self, job_id: JobId) -> Result<VectorizationSummary, OrchestratorError> {
        let events = self.store.list_events(job_id, 0).await?;
        let mut summary = VectorizationSummary::default();

        for event in events {
            summary.merge(self.vectorize_event(&event).await?);
        }

        Ok(summary)
    }

    async fn vectorize_event(&self, event: &JobEventRow) -> Result<VectorizationSummary, OrchestratorError> {
        let document = build_document(event.event_type, event.event_time, &event.event_data);
        let chunks = chunk_document(&document);
        let source_id = format!("{}:{}", event.job_id, event.seq);

        let mut summary = VectorizationSummary::default();
        if chunks.is_empty() {
            return Ok(summary);
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let (vectors, degraded) = match self.embedder.embed_batch(&texts).await {
            Ok(vectors) => (vectors, false),
            Err(e) => {
                warn!(job_id = %event.job_id, seq = event.seq, error = %e,
                    "embedding failed after retries, substituting zero vectors");
                (
                    texts.iter().map(|_| self.embedder.zero_vector()).collect(),
                    true,
                )
            }
        };

        for (chunk, vector) in chunks.iter().zip(vectors.into_iter()) {
            let mut metadata = serde_json::json!({
                "job_id": event.job_id,
                "event_type": event.event_type.as_str(),
                "chunk_offset": chunk.offset,
            });
            if degraded {
                metadata["embedding_degraded"] = serde_json::Value::Bool(true);
                summary.degraded_chunk_count += 1;
            }

            self.store
                .upsert_embedding(
                    SOURCE_TABLE,
                    &source_id,
                    chunk.index as i32,
                    &chunk.text,
                    Vector::from(vector),
                    metadata,
                )
                .await?;
            summary.chunks_written += 1;
        }

        Ok(summary)
    }
}

impl VectorizationSummary {
    fn merge(&mut self, other: VectorizationSummary) {
        self.chunks_written += other.chunks_written;
        self.degraded_chunk_count += other.degraded_chunk_count;
    }
}
