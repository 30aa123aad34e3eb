//! `GET /health` (spec.md §6.1).

use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::{http::StatusCode, Json};
use serde::Serialize;

use crate::kernel::ServerKernel;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    checks: Checks,
}

#[derive(Serialize)]
struct Checks {
    db: &'static str,
    schema_registry: &'static str,
    embedding_service: &'static str,
}

/// Pings the database with a short deadline; schema registry health piggybacks
/// on the same connection since it has no separate process, and the embedding
/// service is reported `unknown` rather than probed on every health check (a
/// probe there would make `/health` latency depend on a third party).
pub async fn health_handler(State(kernel): State<Arc<ServerKernel>>) -> (StatusCode, Json<HealthResponse>) {
    let db_ok = tokio::time::timeout(
        Duration::from_secs(3),
        sqlx::query("SELECT 1").execute(kernel.store.pool()),
    )
    .await
    .map(|r| r.is_ok())
    .unwrap_or(false);

    let status = if db_ok { "ok" } else { "degraded" };
    let status_code = if db_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status_code,
        Json(HealthResponse {
            status,
            checks: Checks {
                db: if db_ok { "ok" } else { "unreachable" },
                schema_registry: if db_ok { "ok" } else { "unreachable" },
                embedding_service: "unknown",
            },
        }),
    )
}
