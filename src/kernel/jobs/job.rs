//! The `Job` record and its state machine (spec.md §3, §4.4).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use typed_builder::TypedBuilder;

use crate::common::{ActorId, ActorType, ClientId, JobId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "job_status", rename_all = "snake_case")]
pub enum JobStatus {
    #[default]
    Queued,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    /// Terminals are absorbing (spec.md I1): no transition leaves them.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled
        )
    }
}

/// A unit of work driven through the state machine by the job engine.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TypedBuilder)]
#[builder(field_defaults(setter(into)))]
pub struct Job {
    #[builder(default = JobId::new())]
    pub job_id: JobId,
    pub job_key: String,
    /// The resolved schema's `object_type` at intake time (spec.md §4.2, §4.5);
    /// stashed on the job so dispatch does not need to re-resolve the schema.
    #[builder(default = "crew".to_string())]
    pub object_type: String,
    pub payload: serde_json::Value,
    pub client_id: ClientId,
    pub actor_type: ActorType,
    pub actor_id: ActorId,

    #[builder(default)]
    pub status: JobStatus,
    #[builder(default, setter(strip_option))]
    pub result: Option<serde_json::Value>,
    #[builder(default, setter(strip_option))]
    pub last_error: Option<String>,
    #[builder(default = 0)]
    pub attempts: i32,
    #[builder(default = 3)]
    pub max_attempts: i32,

    #[builder(default, setter(strip_option))]
    pub not_before: Option<DateTime<Utc>>,
    #[builder(default = false)]
    pub cancel_requested: bool,
    /// Identifies the runner that currently holds (or last held) the claim
    /// on this job (spec.md §4.1 `claim_next_job(worker_id, now)`).
    #[builder(default, setter(strip_option))]
    pub worker_id: Option<String>,

    #[builder(default, setter(strip_option))]
    pub notes: Option<String>,

    #[builder(default = Utc::now())]
    pub queued_at: DateTime<Utc>,
    #[builder(default, setter(strip_option))]
    pub started_at: Option<DateTime<Utc>>,
    #[builder(default, setter(strip_option))]
    pub finished_at: Option<DateTime<Utc>>,
}

impl Job {
    /// Whether this job is ready to be claimed right now.
    pub fn is_ready(&self, now: DateTime<Utc>) -> bool {
        self.status == JobStatus::Queued && self.not_before.map_or(true, |t| t <= now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Job {
        Job::builder()
            .job_key("hello_crew")
            .payload(serde_json::json!({}))
            .client_id(ClientId::from("u1".to_string()))
            .actor_type(ActorType::Human)
            .actor_id(ActorId::from("a1".to_string()))
            .build()
    }

    #[test]
    fn new_job_starts_queued_with_zero_attempts() {
        let job = sample();
        assert_eq!(job.status, JobStatus::Queued);
        assert_eq!(job.attempts, 0);
        assert_eq!(job.max_attempts, 3);
    }

    #[test]
    fn new_job_is_ready_without_not_before() {
        assert!(sample().is_ready(Utc::now()));
    }

    #[test]
    fn job_with_future_not_before_is_not_ready() {
        let mut job = sample();
        job.not_before = Some(Utc::now() + chrono::Duration::seconds(30));
        assert!(!job.is_ready(Utc::now()));
    }

    #[test]
    fn terminal_statuses_are_absorbing() {
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(JobStatus::Cancelled.is_terminal());
        assert!(!JobStatus::Queued.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
    }
}
