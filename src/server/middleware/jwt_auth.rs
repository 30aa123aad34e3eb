//! Request authentication (C3, spec.md §4.3, §6.1: auth on every endpoint).

use std::sync::Arc;

use axum::{extract::State, middleware::Next, response::IntoResponse};

use crate::common::OrchestratorError;
use crate::kernel::auth::{require_scope, Claims};
use crate::kernel::ServerKernel;

/// Re-exported for handlers that want the verified caller's claims.
pub type AuthUser = Claims;

/// Verifies the `Authorization: Bearer <jwt>` header and inserts the decoded
/// [`Claims`] into the request extensions. Unlike a best-effort auth layer,
/// every route under this middleware requires a valid token — there is no
/// public/anonymous path (spec.md §6.1).
pub async fn jwt_auth_middleware(
    State(kernel): State<Arc<ServerKernel>>,
    mut request: axum::http::Request<axum::body::Body>,
    next: Next,
) -> axum::response::Response {
    match extract_claims(&request, &kernel) {
        Ok(claims) => {
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(err) => err.into_response(),
    }
}

fn extract_claims(
    request: &axum::http::Request<axum::body::Body>,
    kernel: &ServerKernel,
) -> Result<Claims, OrchestratorError> {
    let header = request
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| OrchestratorError::Authentication("missing Authorization header".to_string()))?;

    let value = header
        .to_str()
        .map_err(|_| OrchestratorError::Authentication("Authorization header is not valid UTF-8".to_string()))?;

    let token = value.strip_prefix("Bearer ").unwrap_or(value);

    let claims = kernel
        .jwt
        .verify_token(token)
        .map_err(|e| OrchestratorError::Authentication(e.to_string()))?;

    require_scope(&claims, &kernel.config.required_scope)?;

    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_token_fails_verification() {
        let jwt = crate::kernel::auth::JwtService::new("secret", "crew-orchestrator".to_string());
        assert!(jwt.verify_token("").is_err());
    }

    #[test]
    fn bearer_prefix_is_stripped_before_verification() {
        let jwt = crate::kernel::auth::JwtService::new("secret", "crew-orchestrator".to_string());
        let header_value = "Bearer not-a-real-token";
        let stripped = header_value.strip_prefix("Bearer ").unwrap_or(header_value);
        assert_eq!(stripped, "not-a-real-token");
        assert!(jwt.verify_token(stripped).is_err());
    }

    #[test]
    fn token_without_required_scope_is_rejected() {
        let jwt = crate::kernel::auth::JwtService::new("secret", "crew-orchestrator".to_string());
        let token = jwt.create_token_for("u1", vec!["other_scope".to_string()], 60).unwrap();
        let claims = jwt.verify_token(&token).unwrap();
        assert!(require_scope(&claims, crate::kernel::auth::INTERNAL_SCOPE).is_err());
    }

    #[test]
    fn token_with_required_scope_is_accepted() {
        let jwt = crate::kernel::auth::JwtService::new("secret", "crew-orchestrator".to_string());
        let token = jwt
            .create_token_for("u1", vec![crate::kernel::auth::INTERNAL_SCOPE.to_string()], 60)
            .unwrap();
        let claims = jwt.verify_token(&token).unwrap();
        assert!(require_scope(&claims, crate::kernel::auth::INTERNAL_SCOPE).is_ok());
    }
}
