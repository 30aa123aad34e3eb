//! Entry point for the crew job orchestration server.

use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crew_orchestrator::kernel::jobs::{JobRunner, JobRunnerConfig};
use crew_orchestrator::kernel::ServerKernel;
use crew_orchestrator::Config;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,crew_orchestrator=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("starting crew job orchestration server");

    let config = Config::from_env().context("failed to load configuration")?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("failed to connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("failed to run migrations")?;

    let port = config.port;
    let batch_size = config.worker_batch_size;
    let poll_interval = config.worker_poll_interval;

    let kernel = Arc::new(ServerKernel::new(config, pool));

    let runner_config = JobRunnerConfig {
        poll_interval,
        worker_id: format!("runner-{}", uuid::Uuid::new_v4()),
    };
    let runner = JobRunner::with_config(kernel.engine.clone(), runner_config);
    tracing::info!(batch_size, "starting background job runner");
    tokio::spawn(async move {
        if let Err(e) = runner.run_until_shutdown().await {
            tracing::error!(error = %e, "job runner exited with error");
        }
    });

    let app = crew_orchestrator::server::app::build_app(kernel);

    let addr = format!("0.0.0.0:{port}");
    tracing::info!(%addr, "listening");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("failed to bind to address")?;

    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
