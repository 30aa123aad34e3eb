use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::time::Duration;

/// Application configuration loaded from environment variables.
///
/// Parsed once at startup; every component that needs it is handed an owned
/// copy or a reference through its constructor rather than reading the
/// environment itself.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,

    pub jwt_secret: String,
    pub jwt_issuer: String,
    /// Scope every caller-presented token must carry (spec.md §4.3).
    pub required_scope: String,

    /// Controls C5's remote-vs-local dispatch policy.
    pub use_remote_crews: bool,
    pub fallback_to_local: bool,
    pub remote_crew_base_url: Option<String>,
    pub remote_crew_token_ttl_secs: i64,

    pub embedding_service_url: String,
    pub embedding_model: String,
    pub embedding_dimension: usize,

    pub worker_batch_size: i64,
    pub worker_poll_interval: Duration,
    pub default_max_attempts: i32,
    pub default_max_wall_time: Duration,
}

impl Config {
    /// Load configuration from environment variables, loading a `.env` file
    /// first if present (development convenience only).
    pub fn from_env() -> Result<Self> {
        let _ = dotenv();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,

            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            jwt_issuer: env::var("JWT_ISSUER")
                .unwrap_or_else(|_| "crew-orchestrator".to_string()),
            required_scope: env::var("REQUIRED_SCOPE")
                .unwrap_or_else(|_| crate::kernel::auth::INTERNAL_SCOPE.to_string()),

            use_remote_crews: env_bool("USE_REMOTE_CREWS", false)?,
            fallback_to_local: env_bool("FALLBACK_TO_LOCAL", true)?,
            remote_crew_base_url: env::var("REMOTE_CREW_BASE_URL").ok(),
            remote_crew_token_ttl_secs: env::var("REMOTE_CREW_TOKEN_TTL_SECS")
                .unwrap_or_else(|_| "3600".to_string())
                .parse()
                .context("REMOTE_CREW_TOKEN_TTL_SECS must be a valid number")?,

            embedding_service_url: env::var("EMBEDDING_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:9000".to_string()),
            embedding_model: env::var("EMBEDDING_MODEL")
                .unwrap_or_else(|_| "text-embedding-3-small".to_string()),
            embedding_dimension: env::var("EMBEDDING_DIMENSION")
                .unwrap_or_else(|_| "1536".to_string())
                .parse()
                .context("EMBEDDING_DIMENSION must be a valid number")?,

            worker_batch_size: env::var("WORKER_BATCH_SIZE")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("WORKER_BATCH_SIZE must be a valid number")?,
            worker_poll_interval: Duration::from_millis(
                env::var("WORKER_POLL_INTERVAL_MS")
                    .unwrap_or_else(|_| "1000".to_string())
                    .parse()
                    .context("WORKER_POLL_INTERVAL_MS must be a valid number")?,
            ),
            default_max_attempts: env::var("DEFAULT_MAX_ATTEMPTS")
                .unwrap_or_else(|_| "3".to_string())
                .parse()
                .context("DEFAULT_MAX_ATTEMPTS must be a valid number")?,
            default_max_wall_time: Duration::from_secs(
                env::var("DEFAULT_MAX_WALL_TIME_SECS")
                    .unwrap_or_else(|_| "600".to_string())
                    .parse()
                    .context("DEFAULT_MAX_WALL_TIME_SECS must be a valid number")?,
            ),
        })
    }
}

fn env_bool(key: &str, default: bool) -> Result<bool> {
    match env::var(key) {
        Ok(v) => v
            .parse()
            .with_context(|| format!("{key} must be \"true\" or \"false\"")),
        Err(_) => Ok(default),
    }
}
