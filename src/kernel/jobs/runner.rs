//! Background polling loop that drives the job engine (spec.md §4.4, §5).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{error, info};
use uuid::Uuid;

use super::engine::JobEngine;

/// Configuration for a single runner instance.
#[derive(Debug, Clone)]
pub struct JobRunnerConfig {
    /// How long to sleep after a poll finds nothing to claim.
    pub poll_interval: Duration,
    pub worker_id: String,
}

impl Default for JobRunnerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            worker_id: format!("runner-{}", Uuid::new_v4()),
        }
    }
}

impl JobRunnerConfig {
    pub fn with_worker_id(worker_id: impl Into<String>) -> Self {
        Self {
            worker_id: worker_id.into(),
            ..Default::default()
        }
    }
}

/// Background service that repeatedly claims and executes jobs via a `JobEngine`.
///
/// Concurrency across runners is handled by `FOR UPDATE SKIP LOCKED` at claim
/// time (spec.md §5); several `JobRunner`s may poll the same table safely.
pub struct JobRunner {
    engine: Arc<JobEngine>,
    config: JobRunnerConfig,
    shutdown: Arc<AtomicBool>,
}

impl JobRunner {
    pub fn new(engine: Arc<JobEngine>) -> Self {
        Self::with_config(engine, JobRunnerConfig::default())
    }

    pub fn with_config(engine: Arc<JobEngine>, config: JobRunnerConfig) -> Self {
        Self {
            engine,
            config,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        self.shutdown.clone()
    }

    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Runs until `request_shutdown` is called.
    pub async fn run(self) -> Result<()> {
        info!(worker_id = %self.config.worker_id, "job runner starting");

        loop {
            if self.is_shutdown_requested() {
                break;
            }

            match self.engine.run_once(&self.config.worker_id).await {
                Ok(true) => continue,
                Ok(false) => tokio::time::sleep(self.config.poll_interval).await,
                Err(e) => {
                    error!(worker_id = %self.config.worker_id, error = %e, "poll failed");
                    tokio::time::sleep(self.config.poll_interval).await;
                }
            }
        }

        info!(worker_id = %self.config.worker_id, "job runner stopped");
        Ok(())
    }

    /// Convenience wrapper that also listens for Ctrl+C.
    pub async fn run_until_shutdown(self) -> Result<()> {
        let shutdown = self.shutdown_handle();
        tokio::spawn(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("received shutdown signal");
            shutdown.store(true, Ordering::SeqCst);
        });

        self.run().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_have_a_generated_worker_id() {
        let config = JobRunnerConfig::default();
        assert!(config.worker_id.starts_with("runner-"));
    }

    #[test]
    fn with_worker_id_overrides_the_generated_one() {
        let config = JobRunnerConfig::with_worker_id("worker-a");
        assert_eq!(config.worker_id, "worker-a");
    }
}
