//! The error taxonomy from spec.md §7, as a single `thiserror` enum.
//!
//! Internal plumbing between components still uses `anyhow::Result` (see
//! every `kernel/jobs/*` and `kernel/dispatch/*` module); this enum exists at
//! the boundaries that need to make a *caller-visible* or *retry* decision:
//! the HTTP layer (maps to a status code + JSON body) and the job engine
//! (maps to a retry/terminal decision).

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("validation failed: {0:?}")]
    Validation(Vec<String>),

    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("no handler registered for job_key {0:?}")]
    HandlerNotFound(String),

    #[error("handler reported a transient condition: {0}")]
    HandlerTransient(String),

    #[error("crew execution failed: {0}")]
    CrewExecutionError(String),

    #[error("remote crew service unavailable: {0}")]
    RemoteCrewUnavailable(String),

    #[error("metadata store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("handler exceeded its deadline")]
    DeadlineExceeded,

    #[error("job is not in a state that allows this transition")]
    InvalidStateTransition,

    #[error("duplicate request")]
    Duplicate,

    #[error("job not found")]
    NotFound,

    #[error("job is already terminal")]
    AlreadyTerminal,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl OrchestratorError {
    /// Whether this category should be retried by the job engine (spec.md §7).
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            OrchestratorError::StoreUnavailable(_)
                | OrchestratorError::HandlerTransient(_)
                | OrchestratorError::RemoteCrewUnavailable(_)
        )
    }

    /// The stable category tag surfaced on error events and in logs (spec.md §7:
    /// "caller-visible failures carry a stable category tag plus a free-text message").
    pub fn category(&self) -> &'static str {
        match self {
            OrchestratorError::Validation(_) => "Validation",
            OrchestratorError::Authentication(_) => "Authentication",
            OrchestratorError::HandlerNotFound(_) => "HandlerNotFound",
            OrchestratorError::HandlerTransient(_) => "HandlerTransient",
            OrchestratorError::CrewExecutionError(_) => "CrewExecutionError",
            OrchestratorError::RemoteCrewUnavailable(_) => "RemoteCrewUnavailable",
            OrchestratorError::StoreUnavailable(_) => "StoreUnavailable",
            OrchestratorError::DeadlineExceeded => "DeadlineExceeded",
            OrchestratorError::InvalidStateTransition => "InvalidStateTransition",
            OrchestratorError::Duplicate => "Duplicate",
            OrchestratorError::NotFound => "NotFound",
            OrchestratorError::AlreadyTerminal => "AlreadyTerminal",
            OrchestratorError::Internal(_) => "Internal",
        }
    }
}

impl From<sqlx::Error> for OrchestratorError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) | sqlx::Error::Tls(_) => {
                OrchestratorError::StoreUnavailable(err.to_string())
            }
            sqlx::Error::RowNotFound => OrchestratorError::NotFound,
            other => OrchestratorError::Internal(anyhow::Error::new(other)),
        }
    }
}

impl From<reqwest::Error> for OrchestratorError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() {
            OrchestratorError::RemoteCrewUnavailable(err.to_string())
        } else if let Some(status) = err.status() {
            match status {
                StatusCode::NOT_FOUND => OrchestratorError::HandlerNotFound(err.to_string()),
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    OrchestratorError::Authentication(err.to_string())
                }
                s if s.is_server_error() => OrchestratorError::RemoteCrewUnavailable(err.to_string()),
                _ => OrchestratorError::CrewExecutionError(err.to_string()),
            }
        } else {
            OrchestratorError::RemoteCrewUnavailable(err.to_string())
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    details: Vec<String>,
}

impl IntoResponse for OrchestratorError {
    fn into_response(self) -> axum::response::Response {
        let (status, message, details) = match &self {
            OrchestratorError::Validation(errors) => {
                (StatusCode::BAD_REQUEST, "validation failed".to_string(), errors.clone())
            }
            OrchestratorError::Authentication(_) => {
                (StatusCode::UNAUTHORIZED, "authentication failed".to_string(), vec![])
            }
            OrchestratorError::HandlerNotFound(job_key) => (
                StatusCode::BAD_REQUEST,
                format!("no schema or handler found for job_key {job_key:?}"),
                vec![],
            ),
            OrchestratorError::NotFound => {
                (StatusCode::NOT_FOUND, "job not found".to_string(), vec![])
            }
            OrchestratorError::AlreadyTerminal => (
                StatusCode::CONFLICT,
                "job is already in a terminal state".to_string(),
                vec![],
            ),
            OrchestratorError::Duplicate => {
                (StatusCode::CONFLICT, "duplicate request".to_string(), vec![])
            }
            OrchestratorError::InvalidStateTransition => (
                StatusCode::CONFLICT,
                "job transition rejected".to_string(),
                vec![],
            ),
            OrchestratorError::StoreUnavailable(_)
            | OrchestratorError::RemoteCrewUnavailable(_)
            | OrchestratorError::HandlerTransient(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "a dependency is temporarily unavailable".to_string(),
                vec![],
            ),
            OrchestratorError::CrewExecutionError(_)
            | OrchestratorError::DeadlineExceeded
            | OrchestratorError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal error".to_string(),
                vec![],
            ),
        };

        (status, Json(ErrorBody { error: message, details })).into_response()
    }
}
