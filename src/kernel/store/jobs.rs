//! Job persistence operations (C1, spec.md §4.1).

use anyhow::Result;
use chrono::{DateTime, Utc};

use super::Store;
use crate::common::{ActorId, ActorType, ClientId, JobId, OrchestratorError};
use crate::kernel::events::types::EventType;
use crate::kernel::jobs::job::{Job, JobStatus};

const JOB_COLUMNS: &str = r#"job_id, job_key, object_type, payload, client_id, actor_type, actor_id,
       status, result, last_error, attempts, max_attempts, not_before, cancel_requested,
       worker_id, notes, queued_at, started_at, finished_at"#;

impl Store {
    /// Inserts a job row in `queued` and appends its `job_created` event atomically.
    ///
    /// `max_attempts` is resolved by the caller (handler override, else
    /// `Config.default_max_attempts`) before the job is persisted (spec.md §4.4).
    pub async fn create_job(
        &self,
        job_key: &str,
        object_type: &str,
        payload: serde_json::Value,
        client_id: ClientId,
        actor_type: ActorType,
        actor_id: ActorId,
        max_attempts: i32,
    ) -> Result<Job, OrchestratorError> {
        let mut tx = self.pool().begin().await?;

        let job_id = JobId::new();
        let job = sqlx::query_as::<_, Job>(&format!(
            r#"
            INSERT INTO crew_jobs (job_id, job_key, object_type, payload, client_id, actor_type, actor_id,
                                    status, attempts, max_attempts, cancel_requested, queued_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'queued', 0, $8, false, NOW())
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .bind(job_id)
        .bind(job_key)
        .bind(object_type)
        .bind(&payload)
        .bind(&client_id)
        .bind(actor_type)
        .bind(&actor_id)
        .bind(max_attempts)
        .fetch_one(&mut *tx)
        .await?;

        self.append_event(
            &mut tx,
            job.job_id,
            EventType::JobCreated,
            serde_json::json!({ "job_key": job_key }),
        )
        .await?;

        tx.commit().await?;
        Ok(job)
    }

    /// Atomically claims the oldest ready `queued` job and transitions it to
    /// `running`, stamping it with the claiming worker (spec.md §4.1
    /// `claim_next_job(worker_id, now) -> job | none`).
    pub async fn claim_next_job(
        &self,
        worker_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Job>, OrchestratorError> {
        let job = sqlx::query_as::<_, Job>(&format!(
            r#"
            WITH candidate AS (
                SELECT job_id
                FROM crew_jobs
                WHERE status = 'queued' AND (not_before IS NULL OR not_before <= $1)
                ORDER BY queued_at ASC
                LIMIT 1
                FOR UPDATE SKIP LOCKED
            )
            UPDATE crew_jobs
            SET status = 'running', started_at = $1, attempts = attempts + 1, worker_id = $2
            WHERE job_id IN (SELECT job_id FROM candidate)
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .bind(now)
        .bind(worker_id)
        .fetch_optional(self.pool())
        .await?;

        Ok(job)
    }

    /// Conditional `running -> {completed, failed, cancelled}` transition.
    pub async fn finalize_job(
        &self,
        job_id: JobId,
        status: JobStatus,
        result: Option<serde_json::Value>,
        last_error: Option<String>,
    ) -> Result<Job, OrchestratorError> {
        debug_assert!(status.is_terminal());

        let job = sqlx::query_as::<_, Job>(&format!(
            r#"
            UPDATE crew_jobs
            SET status = $1, result = $2, last_error = $3, finished_at = NOW()
            WHERE job_id = $4 AND status = 'running'
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .bind(status)
        .bind(&result)
        .bind(&last_error)
        .bind(job_id)
        .fetch_optional(self.pool())
        .await?;

        job.ok_or(OrchestratorError::InvalidStateTransition)
    }

    /// Conditional `running -> queued` transition for a retry.
    pub async fn requeue_job(
        &self,
        job_id: JobId,
        not_before: DateTime<Utc>,
        last_error: Option<String>,
    ) -> Result<Job, OrchestratorError> {
        let job = sqlx::query_as::<_, Job>(&format!(
            r#"
            UPDATE crew_jobs
            SET status = 'queued', not_before = $1, last_error = $2,
                started_at = NULL, cancel_requested = false, worker_id = NULL
            WHERE job_id = $3 AND status = 'running'
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .bind(not_before)
        .bind(&last_error)
        .bind(job_id)
        .fetch_optional(self.pool())
        .await?;

        job.ok_or(OrchestratorError::InvalidStateTransition)
    }

    pub async fn get_job(&self, job_id: JobId) -> Result<Option<Job>, OrchestratorError> {
        let job = sqlx::query_as::<_, Job>(&format!(
            "SELECT {JOB_COLUMNS} FROM crew_jobs WHERE job_id = $1"
        ))
        .bind(job_id)
        .fetch_optional(self.pool())
        .await?;

        Ok(job)
    }

    /// Cancels a `queued` job immediately; transitions straight to `cancelled` (spec.md §4.4).
    pub async fn cancel_queued_job(&self, job_id: JobId) -> Result<Option<Job>, OrchestratorError> {
        let job = sqlx::query_as::<_, Job>(&format!(
            r#"
            UPDATE crew_jobs
            SET status = 'cancelled', last_error = 'cancelled before start', finished_at = NOW()
            WHERE job_id = $1 AND status = 'queued'
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .bind(job_id)
        .fetch_optional(self.pool())
        .await?;

        Ok(job)
    }

    /// Sets the cooperative cancel flag on a `running` job.
    pub async fn request_cancel_running(&self, job_id: JobId) -> Result<Option<Job>, OrchestratorError> {
        let job = sqlx::query_as::<_, Job>(&format!(
            r#"
            UPDATE crew_jobs
            SET cancel_requested = true
            WHERE job_id = $1 AND status = 'running'
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .bind(job_id)
        .fetch_optional(self.pool())
        .await?;

        Ok(job)
    }
}
