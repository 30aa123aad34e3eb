//! The handler contract a crew implements (spec.md §4.5).

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::common::{JobId, OrchestratorError};
use crate::kernel::events::sink::EventSink;

/// Static facts about a handler, resolved at registration time (spec.md §4.5:
/// "a `metadata()` descriptor (name, version, expected scopes, max_wall_time,
/// retryable errors)").
#[derive(Debug, Clone)]
pub struct HandlerMetadata {
    pub name: &'static str,
    pub version: &'static str,
    pub expected_scopes: &'static [&'static str],
    pub max_wall_time: Duration,
    /// Per-handler retry budget override; `None` defers to `Config.default_max_attempts`
    /// (spec.md §4.4: "Retry policy (per handler, default applies when unspecified)").
    pub max_attempts: Option<i32>,
    /// Error categories (`OrchestratorError::category()`) this handler's own
    /// failures should be retried for. Empty defers to `OrchestratorError::is_retryable`.
    pub retryable_errors: &'static [&'static str],
}

impl Default for HandlerMetadata {
    fn default() -> Self {
        Self {
            name: "",
            version: "1",
            expected_scopes: &[],
            max_wall_time: Duration::from_secs(600),
            max_attempts: None,
            retryable_errors: &[],
        }
    }
}

/// What a handler needs from the engine to execute cooperatively (spec.md §5).
#[derive(Clone)]
pub struct HandlerContext {
    pub job_id: JobId,
    pub cancel: CancellationToken,
    pub sink: Arc<dyn EventSink>,
}

impl HandlerContext {
    pub fn is_cancel_requested(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Any crew handler, in-process or a thin wrapper around a remote call.
#[async_trait]
pub trait Handler: Send + Sync {
    fn metadata(&self) -> HandlerMetadata;

    async fn execute(
        &self,
        payload: serde_json::Value,
        ctx: HandlerContext,
    ) -> Result<serde_json::Value, OrchestratorError>;
}
