//! Job HTTP API (spec.md §6.1).

use std::sync::Arc;

use axum::extract::{Extension, Path, State};
use axum::Json;
use serde::Serialize;
use serde_json::Value;

use crate::common::{ActorId, ActorType, ClientId, JobId, OrchestratorError};
use crate::kernel::jobs::JobStatus;
use crate::kernel::ServerKernel;
use crate::server::middleware::AuthUser;

#[derive(Serialize)]
pub struct CreateJobResponse {
    job_id: JobId,
    status: JobStatus,
}

pub async fn create_job(
    State(kernel): State<Arc<ServerKernel>>,
    Extension(_caller): Extension<AuthUser>,
    Json(payload): Json<Value>,
) -> Result<Json<CreateJobResponse>, OrchestratorError> {
    let outcome = kernel.schema_registry.validate(&payload, None).await?;
    if !outcome.valid {
        return Err(OrchestratorError::Validation(outcome.errors));
    }

    let job_key = payload
        .get("job_key")
        .and_then(Value::as_str)
        .ok_or_else(|| OrchestratorError::Validation(vec!["job_key must be a string".to_string()]))?
        .to_string();
    let client_id = ClientId::from(required_str(&payload, "client_user_id")?);
    let actor_id = ActorId::from(required_str(&payload, "actor_id")?);
    let actor_type: ActorType = serde_json::from_value(
        payload
            .get("actor_type")
            .cloned()
            .ok_or_else(|| OrchestratorError::Validation(vec!["actor_type is required".to_string()]))?,
    )
    .map_err(|e| OrchestratorError::Validation(vec![format!("invalid actor_type: {e}")]))?;

    let object_type = outcome.object_type.unwrap_or_else(|| "crew".to_string());

    // Per-handler retry budget wins when the resolved handler declares one;
    // otherwise the configured default applies (spec.md §4.4).
    let max_attempts = kernel
        .dispatch
        .resolve(&job_key, &object_type)
        .and_then(|handler| handler.metadata().max_attempts)
        .unwrap_or(kernel.config.default_max_attempts);

    let job = kernel
        .store
        .create_job(
            &job_key,
            &object_type,
            payload,
            client_id,
            actor_type,
            actor_id,
            max_attempts,
        )
        .await?;

    Ok(Json(CreateJobResponse {
        job_id: job.job_id,
        status: job.status,
    }))
}

fn required_str(payload: &Value, field: &str) -> Result<String, OrchestratorError> {
    payload
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| OrchestratorError::Validation(vec![format!("{field} must be a string")]))
}

#[derive(Serialize)]
pub struct EventView {
    seq: i64,
    event_type: &'static str,
    event_time: chrono::DateTime<chrono::Utc>,
    event_data: Value,
}

#[derive(Serialize)]
pub struct JobView {
    job_id: JobId,
    job_key: String,
    status: JobStatus,
    queued_at: chrono::DateTime<chrono::Utc>,
    started_at: Option<chrono::DateTime<chrono::Utc>>,
    finished_at: Option<chrono::DateTime<chrono::Utc>>,
    attempts: i32,
    last_error: Option<String>,
    result: Option<Value>,
    events: Vec<EventView>,
}

pub async fn get_job(
    State(kernel): State<Arc<ServerKernel>>,
    Extension(_caller): Extension<AuthUser>,
    Path(job_id): Path<JobId>,
) -> Result<Json<JobView>, OrchestratorError> {
    let job = kernel
        .store
        .get_job(job_id)
        .await?
        .ok_or(OrchestratorError::NotFound)?;
    let events = kernel.store.list_events(job_id, 0).await?;

    Ok(Json(JobView {
        job_id: job.job_id,
        job_key: job.job_key,
        status: job.status,
        queued_at: job.queued_at,
        started_at: job.started_at,
        finished_at: job.finished_at,
        attempts: job.attempts,
        last_error: job.last_error,
        result: job.result,
        events: events
            .into_iter()
            .map(|e| EventView {
                seq: e.seq,
                event_type: e.event_type.as_str(),
                event_time: e.event_time,
                event_data: e.event_data,
            })
            .collect(),
    }))
}

#[derive(Serialize)]
pub struct CancelResponse {
    status: JobStatus,
}

pub async fn cancel_job(
    State(kernel): State<Arc<ServerKernel>>,
    Extension(_caller): Extension<AuthUser>,
    Path(job_id): Path<JobId>,
) -> Result<Json<CancelResponse>, OrchestratorError> {
    let job = kernel
        .store
        .get_job(job_id)
        .await?
        .ok_or(OrchestratorError::NotFound)?;

    let status = match job.status {
        JobStatus::Queued => {
            let cancelled = kernel
                .store
                .cancel_queued_job(job_id)
                .await?
                .ok_or(OrchestratorError::AlreadyTerminal)?;
            cancelled.status
        }
        JobStatus::Running => {
            kernel
                .store
                .request_cancel_running(job_id)
                .await?
                .ok_or(OrchestratorError::AlreadyTerminal)?;
            JobStatus::Running
        }
        _ => return Err(OrchestratorError::AlreadyTerminal),
    };

    Ok(Json(CancelResponse { status }))
}
