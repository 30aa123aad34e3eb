//! The closed set of event types a job's execution log can contain (spec.md §4.6).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "event_type", rename_all = "snake_case")]
pub enum EventType {
    JobCreated,
    CrewConfig,
    AgentStep,
    TaskComplete,
    CrewMessage,
    CrewExecutionLogs,
    Error,
    JobFinalized,
}

impl EventType {
    pub fn as_str(self) -> &'static str {
        match self {
            EventType::JobCreated => "job_created",
            EventType::CrewConfig => "crew_config",
            EventType::AgentStep => "agent_step",
            EventType::TaskComplete => "task_complete",
            EventType::CrewMessage => "crew_message",
            EventType::CrewExecutionLogs => "crew_execution_logs",
            EventType::Error => "error",
            EventType::JobFinalized => "job_finalized",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn as_str_matches_spec_names() {
        assert_eq!(EventType::JobCreated.as_str(), "job_created");
        assert_eq!(EventType::JobFinalized.as_str(), "job_finalized");
        assert_eq!(EventType::CrewExecutionLogs.as_str(), "crew_execution_logs");
    }
}
