//! Append-only event log operations (part of C1; see spec.md §3 JobEvent, §4.6).

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use super::Store;
use crate::common::{JobId, OrchestratorError};
use crate::kernel::events::types::EventType;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct JobEventRow {
    pub job_id: JobId,
    pub seq: i64,
    pub event_type: EventType,
    pub event_data: serde_json::Value,
    pub event_time: DateTime<Utc>,
}

impl Store {
    /// Appends an event, assigning the next gap-free `seq` under a row lock on the job.
    ///
    /// Must be called inside the same transaction as any sibling write (e.g.
    /// `create_job`'s `job_created` event) to keep both atomic.
    pub async fn append_event(
        &self,
        tx: &mut sqlx::PgConnection,
        job_id: JobId,
        event_type: EventType,
        event_data: serde_json::Value,
    ) -> Result<JobEventRow, OrchestratorError> {
        sqlx::query("SELECT job_id FROM crew_jobs WHERE job_id = $1 FOR UPDATE")
            .bind(job_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(OrchestratorError::NotFound)?;

        let next_seq: i64 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(seq), 0) + 1 FROM crew_job_event WHERE job_id = $1",
        )
        .bind(job_id)
        .fetch_one(&mut *tx)
        .await?;

        let row = sqlx::query_as::<_, JobEventRow>(
            r#"
            INSERT INTO crew_job_event (job_id, seq, event_type, event_data, event_time)
            VALUES ($1, $2, $3, $4, NOW())
            RETURNING job_id, seq, event_type, event_data, event_time
            "#,
        )
        .bind(job_id)
        .bind(next_seq)
        .bind(event_type)
        .bind(event_data)
        .fetch_one(&mut *tx)
        .await?;

        Ok(row)
    }

    /// Appends an event in its own transaction (the common case from a handler's sink).
    pub async fn append_event_standalone(
        &self,
        job_id: JobId,
        event_type: EventType,
        event_data: serde_json::Value,
    ) -> Result<JobEventRow, OrchestratorError> {
        let mut tx = self.pool().begin().await?;
        let row = self.append_event(&mut tx, job_id, event_type, event_data).await?;
        tx.commit().await?;
        Ok(row)
    }

    pub async fn list_events(
        &self,
        job_id: JobId,
        since_seq: i64,
    ) -> Result<Vec<JobEventRow>, OrchestratorError> {
        let rows = sqlx::query_as::<_, JobEventRow>(
            r#"
            SELECT job_id, seq, event_type, event_data, event_time
            FROM crew_job_event
            WHERE job_id = $1 AND seq > $2
            ORDER BY seq ASC
            "#,
        )
        .bind(job_id)
        .bind(since_seq)
        .fetch_all(self.pool())
        .await?;

        Ok(rows)
    }
}
