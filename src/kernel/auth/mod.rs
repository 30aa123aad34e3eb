pub mod jwt;

pub use jwt::{Claims, JwtService, INTERNAL_SCOPE};

use crate::common::OrchestratorError;

/// Checks that `claims` carries `required_scope` (spec.md §4.3).
pub fn require_scope(claims: &Claims, required_scope: &str) -> Result<(), OrchestratorError> {
    if claims.has_scope(required_scope) {
        Ok(())
    } else {
        Err(OrchestratorError::Authentication(format!(
            "missing required scope {required_scope:?}"
        )))
    }
}
