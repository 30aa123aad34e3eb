//! Client-scoped secrets KV (§6.4, §9 open question: one canonical lookup path).
//!
//! Per spec.md §9, the per-client database URL is resolved exactly one way —
//! a `client_secrets` row keyed by `client_id` with `secret_key = 'database_url'`.
//! Other resolution paths seen in the source system are treated as legacy and
//! are not supported here.

use anyhow::Result;

use super::Store;
use crate::common::{ClientId, OrchestratorError};

impl Store {
    /// Reads a client-scoped secret. Returns `None` if absent (spec.md §6.4).
    pub async fn get_secret(
        &self,
        client_id: &ClientId,
        secret_key: &str,
    ) -> Result<Option<String>, OrchestratorError> {
        let value: Option<String> = sqlx::query_scalar(
            r#"
            SELECT secret_value
            FROM client_secrets
            WHERE client_id = $1 AND secret_key = $2
            "#,
        )
        .bind(client_id)
        .bind(secret_key)
        .fetch_optional(self.pool())
        .await?;

        Ok(value)
    }
}
