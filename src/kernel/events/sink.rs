//! The sink interface a handler uses to emit events (spec.md §4.6, Glossary: Sink).
//!
//! Emission is synchronous from the handler's perspective: writes serialize to
//! the metadata store in the calling task. There is deliberately no in-memory
//! buffer — if the store is unavailable the call blocks up to `deadline`, then
//! fails with `StoreUnavailable` rather than buffering unboundedly.

use async_trait::async_trait;
use std::time::Duration;

use crate::common::{JobId, OrchestratorError};
use crate::kernel::store::Store;

use super::types::EventType;

#[async_trait]
pub trait EventSink: Send + Sync {
    async fn emit(
        &self,
        job_id: JobId,
        event_type: EventType,
        data: serde_json::Value,
    ) -> Result<(), OrchestratorError>;
}

pub struct PgEventSink {
    store: Store,
    deadline: Duration,
}

impl PgEventSink {
    pub fn new(store: Store, deadline: Duration) -> Self {
        Self { store, deadline }
    }
}

#[async_trait]
impl EventSink for PgEventSink {
    async fn emit(
        &self,
        job_id: JobId,
        event_type: EventType,
        data: serde_json::Value,
    ) -> Result<(), OrchestratorError> {
        tokio::time::timeout(self.deadline, self.store.append_event_standalone(job_id, event_type, data))
            .await
            .map_err(|_| OrchestratorError::StoreUnavailable("event sink deadline exceeded".to_string()))?
            .map(|_row| ())
    }
}
