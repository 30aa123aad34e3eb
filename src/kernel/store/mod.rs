//! Metadata Store Access (C1, spec.md §4.1).
//!
//! A narrow set of transactional operations over `crew_jobs`, `crew_job_event`,
//! `object_schemas`, and `client_secrets`. Everything else in the kernel reaches
//! the database only through this module.

mod embeddings;
mod events;
mod jobs;
mod schemas;
mod secrets;

pub use embeddings::EmbeddingMatch;
pub use events::JobEventRow;
pub use schemas::SchemaDescriptor;

use sqlx::PgPool;

/// Handle to the metadata store. Cheap to clone (wraps a pool).
#[derive(Clone)]
pub struct Store {
    pool: PgPool,
}

impl Store {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}
