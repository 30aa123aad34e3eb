//! The job engine: claim → dispatch → finalize (spec.md §4.4).

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::common::OrchestratorError;
use crate::kernel::dispatch::{DispatchRegistry, HandlerContext, HandlerMetadata};
use crate::kernel::events::{EventSink, EventType};
use crate::kernel::store::Store;

use super::job::{Job, JobStatus};
use super::retry::RetryPolicy;

pub struct JobEngine {
    store: Store,
    dispatch: Arc<DispatchRegistry>,
    sink: Arc<dyn EventSink>,
}

impl JobEngine {
    pub fn new(store: Store, dispatch: Arc<DispatchRegistry>, sink: Arc<dyn EventSink>) -> Self {
        Self {
            store,
            dispatch,
            sink,
        }
    }

    /// Claims and executes a single job, if one is ready. Returns whether a job was found.
    pub async fn run_once(&self, worker_id: &str) -> anyhow::Result<bool> {
        let Some(job) = self.store.claim_next_job(worker_id, Utc::now()).await? else {
            return Ok(false);
        };

        let job_id = job.job_id;
        let job_key = job.job_key.clone();
        if let Err(e) = self.execute_claimed(job, worker_id).await {
            error!(job_id = %job_id, job_key = %job_key, worker_id = %worker_id, error = %e, "job engine failed to process claimed job");
        }
        Ok(true)
    }

    async fn execute_claimed(&self, job: Job, worker_id: &str) -> anyhow::Result<()> {
        let handler = self.dispatch.resolve(&job.job_key, &job.object_type);

        let Some(handler) = handler else {
            warn!(job_id = %job.job_id, job_key = %job.job_key, worker_id = %worker_id, "no handler registered for job_key");
            self.sink
                .emit(
                    job.job_id,
                    EventType::Error,
                    serde_json::json!({ "category": OrchestratorError::HandlerNotFound(job.job_key.clone()).category(), "job_key": job.job_key }),
                )
                .await?;
            self.finalize_failed(&job, "no handler registered for job_key").await?;
            return Ok(());
        };

        let metadata = handler.metadata();
        let cancel = CancellationToken::new();
        let ctx = HandlerContext {
            job_id: job.job_id,
            cancel: cancel.clone(),
            sink: self.sink.clone(),
        };

        // Cooperative cancellation: poll the store for cancel_requested while the
        // handler runs and flip the token the handler observes (spec.md §4.4, §5).
        let poll_store = self.store.clone();
        let poll_job_id = job.job_id;
        let poll_cancel = cancel.clone();
        let poller = tokio::spawn(async move {
            loop {
                tokio::time::sleep(StdDuration::from_millis(500)).await;
                match poll_store.get_job(poll_job_id).await {
                    Ok(Some(current)) if current.cancel_requested => {
                        poll_cancel.cancel();
                        break;
                    }
                    Ok(Some(_)) => continue,
                    _ => break,
                }
            }
        });

        let outcome = tokio::time::timeout(
            metadata.max_wall_time,
            handler.execute(job.payload.clone(), ctx),
        )
        .await;
        poller.abort();

        match outcome {
            Err(_elapsed) => {
                self.handle_failure(&job, worker_id, OrchestratorError::DeadlineExceeded, &metadata)
                    .await
            }
            Ok(Ok(result)) => {
                // Handler may have returned normally after a late cancel request; the
                // result is discarded and the job finalizes as cancelled (spec.md §4.4).
                let refreshed = self.store.get_job(job.job_id).await?;
                if refreshed.map(|j| j.cancel_requested).unwrap_or(false) {
                    self.finalize_cancelled(&job).await
                } else {
                    self.sink
                        .emit(
                            job.job_id,
                            EventType::JobFinalized,
                            serde_json::json!({ "outcome": "completed" }),
                        )
                        .await?;
                    self.store
                        .finalize_job(job.job_id, JobStatus::Completed, Some(result), None)
                        .await?;
                    info!(job_id = %job.job_id, job_key = %job.job_key, worker_id = %worker_id, "job completed");
                    Ok(())
                }
            }
            Ok(Err(err)) => self.handle_failure(&job, worker_id, err, &metadata).await,
        }
    }

    /// `retryable` is `OrchestratorError::is_retryable` unless the handler's
    /// own `metadata().retryable_errors` names this error's category, in
    /// which case that override wins (spec.md §4.5 "retryable errors").
    fn is_retryable_for(err: &OrchestratorError, metadata: &HandlerMetadata) -> bool {
        if metadata.retryable_errors.is_empty() {
            err.is_retryable()
        } else {
            metadata.retryable_errors.contains(&err.category())
        }
    }

    async fn handle_failure(
        &self,
        job: &Job,
        worker_id: &str,
        err: OrchestratorError,
        metadata: &HandlerMetadata,
    ) -> anyhow::Result<()> {
        self.sink
            .emit(
                job.job_id,
                EventType::Error,
                serde_json::json!({ "category": err.category(), "message": err.to_string() }),
            )
            .await?;

        // A handler's own `max_attempts` override wins over the job's stored
        // value only when the job was created before the handler declared one;
        // normally `job.max_attempts` already reflects it (spec.md §4.4).
        let max_attempts = metadata.max_attempts.unwrap_or(job.max_attempts);
        let policy = RetryPolicy::with_max_attempts(max_attempts);

        if Self::is_retryable_for(&err, metadata) && policy.should_retry(job.attempts) {
            let delay = policy.backoff(job.attempts);
            warn!(
                job_id = %job.job_id, job_key = %job.job_key, worker_id = %worker_id,
                attempts = job.attempts, category = err.category(),
                "retrying job after failure: {err}"
            );
            self.store
                .requeue_job(job.job_id, Utc::now() + delay, Some(err.to_string()))
                .await?;
            Ok(())
        } else {
            self.finalize_failed(job, &err.to_string()).await
        }
    }

    async fn finalize_failed(&self, job: &Job, reason: &str) -> anyhow::Result<()> {
        self.sink
            .emit(
                job.job_id,
                EventType::JobFinalized,
                serde_json::json!({ "outcome": "failed" }),
            )
            .await?;
        self.store
            .finalize_job(job.job_id, JobStatus::Failed, None, Some(reason.to_string()))
            .await?;
        Ok(())
    }

    async fn finalize_cancelled(&self, job: &Job) -> anyhow::Result<()> {
        self.sink
            .emit(
                job.job_id,
                EventType::JobFinalized,
                serde_json::json!({ "outcome": "cancelled" }),
            )
            .await?;
        self.store
            .finalize_job(job.job_id, JobStatus::Cancelled, None, Some("cancelled".to_string()))
            .await?;
        Ok(())
    }
}
