//! JWT verification and minting (C3, spec.md §4.3).

use anyhow::Result;
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::{ActorId, ActorType, ClientId};

/// Claims carried by both caller-presented and internally-minted tokens.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub scopes: Vec<String>,
    pub exp: i64,
    pub iat: i64,
    pub iss: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_user_id: Option<ClientId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor_type: Option<ActorType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor_id: Option<ActorId>,
}

impl Claims {
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.iter().any(|s| s == scope)
    }
}

/// Scope the dispatch layer requires on its own internally-minted tokens.
pub const INTERNAL_SCOPE: &str = "sparkjar_internal";

#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
}

impl JwtService {
    pub fn new(secret: &str, issuer: String) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer,
        }
    }

    /// Verifies a caller-presented token (HMAC-SHA256, fixed algorithm per spec.md §4.3).
    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(jsonwebtoken::Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(Into::into)
    }

    /// Mints a short-lived internal token for dispatch-layer-to-remote-service calls.
    pub fn mint_internal_token(&self, ttl_secs: i64) -> Result<(String, i64)> {
        let now = Utc::now();
        let exp = (now + chrono::Duration::seconds(ttl_secs)).timestamp();

        let claims = Claims {
            sub: "crew-orchestrator".to_string(),
            scopes: vec![INTERNAL_SCOPE.to_string()],
            exp,
            iat: now.timestamp(),
            iss: self.issuer.clone(),
            client_user_id: None,
            actor_type: None,
            actor_id: None,
        };

        let token = encode(&Header::new(jsonwebtoken::Algorithm::HS256), &claims, &self.encoding_key)?;
        Ok((token, exp))
    }

    /// Test/seed helper for minting a token with arbitrary claims.
    #[cfg(test)]
    pub fn create_token_for(&self, sub: &str, scopes: Vec<String>, ttl_secs: i64) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: sub.to_string(),
            scopes,
            exp: (now + chrono::Duration::seconds(ttl_secs)).timestamp(),
            iat: now.timestamp(),
            iss: self.issuer.clone(),
            client_user_id: None,
            actor_type: None,
            actor_id: None,
        };
        Ok(encode(&Header::new(jsonwebtoken::Algorithm::HS256), &claims, &self.encoding_key)?)
    }

    pub fn jti() -> String {
        Uuid::new_v4().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mint_and_verify_internal_token() {
        let svc = JwtService::new("test_secret", "crew-orchestrator".to_string());
        let (token, _exp) = svc.mint_internal_token(3600).unwrap();
        let claims = svc.verify_token(&token).unwrap();
        assert!(claims.has_scope(INTERNAL_SCOPE));
    }

    #[test]
    fn wrong_secret_fails_verification() {
        let svc1 = JwtService::new("secret1", "crew-orchestrator".to_string());
        let svc2 = JwtService::new("secret2", "crew-orchestrator".to_string());
        let token = svc1.create_token_for("u1", vec!["x".to_string()], 60).unwrap();
        assert!(svc2.verify_token(&token).is_err());
    }

    #[test]
    fn missing_scope_is_detectable() {
        let svc = JwtService::new("secret", "crew-orchestrator".to_string());
        let token = svc.create_token_for("u1", vec!["other_scope".to_string()], 60).unwrap();
        let claims = svc.verify_token(&token).unwrap();
        assert!(!claims.has_scope(INTERNAL_SCOPE));
    }
}
