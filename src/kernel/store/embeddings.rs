//! Vector store operations backing C7 (spec.md §3 EmbeddingRecord, §4.7, §6.5).

use anyhow::Result;
use pgvector::Vector;
use serde::Serialize;
use sqlx::FromRow;

use super::Store;
use crate::common::OrchestratorError;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct EmbeddingMatch {
    pub source_table: String,
    pub source_id: String,
    pub chunk_index: i32,
    pub chunk_text: String,
    pub metadata: serde_json::Value,
    pub distance: f64,
}

impl Store {
    /// Inserts or updates the embedding keyed by `(source_table, source_id,
    /// chunk_index)` (spec.md §4.7 idempotency rule).
    pub async fn upsert_embedding(
        &self,
        source_table: &str,
        source_id: &str,
        chunk_index: i32,
        chunk_text: &str,
        embedding: Vector,
        metadata: serde_json::Value,
    ) -> Result<(), OrchestratorError> {
        sqlx::query(
            r#"
            INSERT INTO event_embeddings (source_table, source_id, chunk_index, chunk_text, embedding, metadata, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, NOW())
            ON CONFLICT (source_table, source_id, chunk_index)
            DO UPDATE SET chunk_text = EXCLUDED.chunk_text,
                          embedding = EXCLUDED.embedding,
                          metadata = EXCLUDED.metadata,
                          updated_at = NOW()
            "#,
        )
        .bind(source_table)
        .bind(source_id)
        .bind(chunk_index)
        .bind(chunk_text)
        .bind(embedding)
        .bind(metadata)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    /// Cosine-distance nearest-neighbor search with optional metadata filters
    /// (spec.md §4.7 similarity search; read-only).
    pub async fn search_embeddings(
        &self,
        query: Vector,
        top_k: i64,
        job_id_filter: Option<String>,
        event_type_filter: Option<String>,
    ) -> Result<Vec<EmbeddingMatch>, OrchestratorError> {
        let rows = sqlx::query_as::<_, EmbeddingMatch>(
            r#"
            SELECT source_table, source_id, chunk_index, chunk_text, metadata,
                   (embedding <=> $1) AS distance
            FROM event_embeddings
            WHERE ($2::text IS NULL OR metadata->>'job_id' = $2)
              AND ($3::text IS NULL OR metadata->>'event_type' = $3)
            ORDER BY embedding <=> $1
            LIMIT $4
            "#,
        )
        .bind(query)
        .bind(job_id_filter)
        .bind(event_type_filter)
        .bind(top_k)
        .fetch_all(self.pool())
        .await?;

        Ok(rows)
    }
}
