//! Router assembly (spec.md §6.1).

use std::sync::Arc;
use std::time::Duration;

use axum::http::{
    header::{AUTHORIZATION, CONTENT_TYPE},
    Method,
};
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::kernel::ServerKernel;
use crate::server::middleware::jwt_auth_middleware;
use crate::server::routes::{cancel_job, create_job, get_job, health_handler};

/// Builds the axum `Router`, wiring every route from spec.md §6.1.
pub fn build_app(kernel: Arc<ServerKernel>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);

    // spec.md §6.1: every endpoint, including /health, requires a bearer token.
    let authenticated = Router::new()
        .route("/crew_job", post(create_job))
        .route("/crew_job/:job_id", get(get_job))
        .route("/crew_job/:job_id/cancel", post(cancel_job))
        .route("/health", get(health_handler))
        .route_layer(middleware::from_fn_with_state(kernel.clone(), jwt_auth_middleware));

    Router::new()
        .merge(authenticated)
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(kernel)
}
