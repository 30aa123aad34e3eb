//! Concrete local handler for `job_key = "hello_crew"`.
//!
//! A minimal crew registered at boot so the orchestrator has at least one
//! real `job_key → handler` binding outside of `gen_crew` (spec.md §8 S1,
//! S4). It greets the caller named in the payload and returns.

use async_trait::async_trait;
use std::time::Duration;

use crate::common::OrchestratorError;

use super::handler::{Handler, HandlerContext, HandlerMetadata};

pub struct HelloCrewHandler;

#[async_trait]
impl Handler for HelloCrewHandler {
    fn metadata(&self) -> HandlerMetadata {
        HandlerMetadata {
            name: "hello_crew",
            max_wall_time: Duration::from_secs(30),
            ..Default::default()
        }
    }

    async fn execute(
        &self,
        payload: serde_json::Value,
        _ctx: HandlerContext,
    ) -> Result<serde_json::Value, OrchestratorError> {
        let name = payload
            .get("name")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("world");

        Ok(serde_json::json!({ "greeting": format!("hello, {name}") }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::JobId;
    use crate::kernel::events::sink::EventSink;
    use crate::kernel::events::types::EventType;
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;

    struct NoopSink;

    #[async_trait]
    impl EventSink for NoopSink {
        async fn emit(
            &self,
            _job_id: JobId,
            _event_type: EventType,
            _data: serde_json::Value,
        ) -> Result<(), OrchestratorError> {
            Ok(())
        }
    }

    fn ctx() -> HandlerContext {
        HandlerContext {
            job_id: JobId::new(),
            cancel: CancellationToken::new(),
            sink: Arc::new(NoopSink),
        }
    }

    #[tokio::test]
    async fn greets_the_named_caller() {
        let result = HelloCrewHandler
            .execute(serde_json::json!({ "name": "ada" }), ctx())
            .await
            .unwrap();
        assert_eq!(result, serde_json::json!({ "greeting": "hello, ada" }));
    }

    #[tokio::test]
    async fn defaults_to_world_when_name_is_absent() {
        let result = HelloCrewHandler.execute(serde_json::json!({}), ctx()).await.unwrap();
        assert_eq!(result, serde_json::json!({ "greeting": "hello, world" }));
    }
}
