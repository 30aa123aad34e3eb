//! Generic, configuration-driven handler for `object_type = "gen_crew"` jobs.
//!
//! Concrete crews are plug-in handlers registered by `job_key`; `gen_crew`
//! schemas instead describe their own execution as data. The payload (already
//! schema-validated) carries a `crew_config.tasks` array of
//! `{agent, task, inputs}` steps; this handler walks them in order, emitting
//! an `agent_step` event per step, and returns the per-task outputs keyed by
//! task name.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use crate::common::OrchestratorError;
use crate::kernel::events::types::EventType;

use super::handler::{Handler, HandlerContext, HandlerMetadata};

#[derive(Debug, Deserialize)]
struct GenCrewConfig {
    #[serde(default)]
    tasks: Vec<GenCrewTask>,
}

#[derive(Debug, Deserialize, Clone)]
struct GenCrewTask {
    agent: String,
    task: String,
    #[serde(default)]
    inputs: serde_json::Value,
}

pub struct GenCrewHandler;

#[async_trait]
impl Handler for GenCrewHandler {
    fn metadata(&self) -> HandlerMetadata {
        HandlerMetadata {
            name: "gen_crew",
            max_wall_time: Duration::from_secs(600),
            ..Default::default()
        }
    }

    async fn execute(
        &self,
        payload: serde_json::Value,
        ctx: HandlerContext,
    ) -> Result<serde_json::Value, OrchestratorError> {
        let config: GenCrewConfig = payload
            .get("crew_config")
            .cloned()
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| OrchestratorError::Validation(vec![format!("invalid crew_config: {e}")]))?
            .unwrap_or(GenCrewConfig { tasks: Vec::new() });

        ctx.sink
            .emit(
                ctx.job_id,
                EventType::CrewConfig,
                serde_json::json!({ "task_count": config.tasks.len() }),
            )
            .await?;

        let mut outputs = serde_json::Map::new();
        for (index, task) in config.tasks.iter().enumerate() {
            if ctx.is_cancel_requested() {
                return Err(OrchestratorError::CrewExecutionError("cancelled".to_string()));
            }

            ctx.sink
                .emit(
                    ctx.job_id,
                    EventType::AgentStep,
                    serde_json::json!({
                        "agent": task.agent,
                        "task": task.task,
                        "action": "execute",
                    }),
                )
                .await?;

            outputs.insert(
                format!("{}_{}", task.task, index),
                serde_json::json!({ "agent": task.agent, "output": task.inputs.clone() }),
            );

            ctx.sink
                .emit(
                    ctx.job_id,
                    EventType::TaskComplete,
                    serde_json::json!({ "task": task.task }),
                )
                .await?;
        }

        Ok(serde_json::Value::Object(outputs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::JobId;
    use crate::kernel::events::sink::EventSink;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;

    struct CountingSink(AtomicUsize);

    #[async_trait]
    impl EventSink for CountingSink {
        async fn emit(
            &self,
            _job_id: JobId,
            _event_type: EventType,
            _data: serde_json::Value,
        ) -> Result<(), OrchestratorError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn executes_each_task_and_returns_outputs() {
        let sink = Arc::new(CountingSink(AtomicUsize::new(0)));
        let ctx = HandlerContext {
            job_id: JobId::new(),
            cancel: CancellationToken::new(),
            sink: sink.clone(),
        };
        let payload = serde_json::json!({
            "crew_config": {
                "tasks": [
                    {"agent": "researcher", "task": "find_docs", "inputs": {"q": "rust"}}
                ]
            }
        });

        let result = GenCrewHandler.execute(payload, ctx).await.unwrap();
        assert!(result.as_object().unwrap().contains_key("find_docs_0"));
        // crew_config + agent_step + task_complete = 3 emits
        assert_eq!(sink.0.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn empty_config_produces_empty_result() {
        let sink = Arc::new(CountingSink(AtomicUsize::new(0)));
        let ctx = HandlerContext {
            job_id: JobId::new(),
            cancel: CancellationToken::new(),
            sink,
        };
        let result = GenCrewHandler.execute(serde_json::json!({}), ctx).await.unwrap();
        assert_eq!(result.as_object().unwrap().len(), 0);
    }
}
