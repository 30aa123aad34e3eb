//! Schema resolution and validation (C2, spec.md §4.2).

use serde_json::Value;

use crate::common::{OrchestratorError, SchemaId};
use crate::kernel::store::{SchemaDescriptor, Store};

const CORE_REQUIRED_FIELDS: &[&str] = &["job_key", "client_user_id", "actor_type", "actor_id"];
const CANDIDATE_OBJECT_TYPES: &[&str] = &["crew", "gen_crew"];

/// Result of validating an inbound payload against its resolved schema.
#[derive(Debug, Clone)]
pub struct ValidationOutcome {
    pub valid: bool,
    pub schema_name: String,
    pub schema_id: Option<SchemaId>,
    pub object_type: Option<String>,
    /// The resolved schema's human description, if it carries one. Kept
    /// alongside `schema_name` so callers can render it in error responses
    /// without a second lookup (spec.md §3 SchemaDescriptor).
    pub schema_description: Option<String>,
    pub errors: Vec<String>,
    pub validated_data: Option<Value>,
}

/// Resolves `(name, object_type)` schema descriptors and validates payloads
/// against them. Deliberately uncached (spec.md §4.2: freshness over latency).
pub struct SchemaRegistry {
    store: Store,
}

impl SchemaRegistry {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Validates `payload` against the schema resolved for it.
    ///
    /// Resolution order (spec.md §4.2): an explicit `schema_name` wins; else the
    /// payload's own `job_key` field names the schema. Core fields are checked
    /// before the JSON schema runs, and short-circuit on their own.
    pub async fn validate(
        &self,
        payload: &Value,
        explicit_schema_name: Option<&str>,
    ) -> Result<ValidationOutcome, OrchestratorError> {
        let core_errors = validate_core_fields(payload);
        if !core_errors.is_empty() {
            return Ok(ValidationOutcome {
                valid: false,
                schema_name: explicit_schema_name.unwrap_or("").to_string(),
                schema_id: None,
                object_type: None,
                schema_description: None,
                errors: core_errors,
                validated_data: None,
            });
        }

        let schema_name = match explicit_schema_name {
            Some(name) => name.to_string(),
            None => payload
                .get("job_key")
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    OrchestratorError::Validation(vec![
                        "no schema_name supplied and payload has no job_key".to_string(),
                    ])
                })?
                .to_string(),
        };

        let descriptor = self.resolve(&schema_name).await?;

        let Some(descriptor) = descriptor else {
            return Err(OrchestratorError::HandlerNotFound(schema_name));
        };

        let schema_errors = validate_against_json_schema(&descriptor.schema, payload)?;
        let valid = schema_errors.is_empty();

        Ok(ValidationOutcome {
            valid,
            schema_name: descriptor.name.clone(),
            schema_id: Some(descriptor.schema_id),
            object_type: Some(descriptor.object_type.clone()),
            schema_description: descriptor.description.clone(),
            errors: schema_errors,
            validated_data: valid.then(|| payload.clone()),
        })
    }

    /// Exact-match lookup on `name`, trying each allowed `object_type` in turn
    /// (spec.md §4.2 rule 3, Data Model §3: identity is `(name, object_type)`).
    async fn resolve(&self, name: &str) -> Result<Option<SchemaDescriptor>, OrchestratorError> {
        for object_type in CANDIDATE_OBJECT_TYPES {
            if let Some(descriptor) = self.store.find_active_schema(name, object_type).await? {
                return Ok(Some(descriptor));
            }
        }
        Ok(None)
    }
}

fn validate_core_fields(payload: &Value) -> Vec<String> {
    let mut errors = Vec::new();
    let Some(obj) = payload.as_object() else {
        return CORE_REQUIRED_FIELDS
            .iter()
            .map(|f| format!("missing required core field: {f}"))
            .collect();
    };

    for field in CORE_REQUIRED_FIELDS {
        match obj.get(*field) {
            None | Some(Value::Null) => {
                errors.push(format!("missing required core field: {field}"))
            }
            Some(Value::String(s)) if s.trim().is_empty() => {
                errors.push(format!("core field '{field}' cannot be empty"))
            }
            _ => {}
        }
    }
    errors
}

fn validate_against_json_schema(
    schema: &Value,
    instance: &Value,
) -> Result<Vec<String>, OrchestratorError> {
    let validator = jsonschema::validator_for(schema)
        .map_err(|e| OrchestratorError::Internal(anyhow::anyhow!("invalid schema: {e}")))?;

    let errors: Vec<String> = validator
        .iter_errors(instance)
        .map(|e| format!("{e}"))
        .collect();

    Ok(errors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_fields_missing_are_all_reported() {
        let payload = serde_json::json!({});
        let errors = validate_core_fields(&payload);
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn core_fields_empty_string_is_rejected() {
        let payload = serde_json::json!({
            "job_key": "hello_crew",
            "client_user_id": "",
            "actor_type": "human",
            "actor_id": "a1",
        });
        let errors = validate_core_fields(&payload);
        assert_eq!(errors, vec!["core field 'client_user_id' cannot be empty"]);
    }

    #[test]
    fn core_fields_present_and_non_empty_pass() {
        let payload = serde_json::json!({
            "job_key": "hello_crew",
            "client_user_id": "u1",
            "actor_type": "human",
            "actor_id": "a1",
        });
        assert!(validate_core_fields(&payload).is_empty());
    }

    #[test]
    fn json_schema_violations_are_aggregated() {
        let schema = serde_json::json!({
            "type": "object",
            "required": ["foo", "bar"],
            "properties": {
                "foo": { "type": "string" },
                "bar": { "type": "number" },
            }
        });
        let instance = serde_json::json!({});
        let errors = validate_against_json_schema(&schema, &instance).unwrap();
        assert!(errors.len() >= 2);
    }
}
