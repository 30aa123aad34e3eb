//! Schema descriptor lookups backing the schema registry (C2, spec.md §3, §4.2).

use anyhow::Result;
use serde::Serialize;
use sqlx::FromRow;

use super::Store;
use crate::common::{OrchestratorError, SchemaId};

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SchemaDescriptor {
    pub schema_id: SchemaId,
    pub name: String,
    pub object_type: String,
    pub schema: serde_json::Value,
    /// Human-readable description carried alongside the schema, surfaced in
    /// `ValidationOutcome` for operator friendliness (spec.md §3 SchemaDescriptor).
    pub description: Option<String>,
    pub version: i32,
    pub is_active: bool,
}

impl Store {
    /// Exact-match lookup on `(name, object_type)`, active version only (spec.md §4.2 rule 3).
    ///
    /// `object_type` is restricted to `crew`/`gen_crew` at the call site; this
    /// method does not enforce the allowed set so schema seeding/admin tooling
    /// can also use it for `crew_context` descriptors.
    pub async fn find_active_schema(
        &self,
        name: &str,
        object_type: &str,
    ) -> Result<Option<SchemaDescriptor>, OrchestratorError> {
        let row = sqlx::query_as::<_, SchemaDescriptor>(
            r#"
            SELECT schema_id, name, object_type, schema, description, version, is_active
            FROM object_schemas
            WHERE name = $1 AND object_type = $2 AND is_active = true
            LIMIT 1
            "#,
        )
        .bind(name)
        .bind(object_type)
        .fetch_optional(self.pool())
        .await?;

        Ok(row)
    }
}
