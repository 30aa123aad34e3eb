//! Remote crew execution client (C5, spec.md §4.5, §6.2).

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::common::OrchestratorError;
use crate::kernel::auth::JwtService;
use crate::kernel::events::EventType;

use super::handler::{Handler, HandlerContext, HandlerMetadata};

/// Attempts against the remote service before falling back to the local
/// handler (spec.md §4.5 S4: "remote service returns HTTP 503 three times").
const REMOTE_RETRY_ATTEMPTS: u32 = 3;

#[derive(Debug, Serialize)]
struct ExecuteCrewRequest<'a> {
    crew_name: &'a str,
    inputs: serde_json::Value,
    request_id: String,
}

#[derive(Debug, Deserialize)]
struct ExecuteCrewResponse {
    success: bool,
    #[serde(default)]
    result: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<String>,
}

struct CachedToken {
    token: String,
    expires_at: i64,
}

/// Thread-safe cache for the internal bearer token (spec.md §4.5 "Token cache").
struct TokenCache {
    jwt: Arc<JwtService>,
    ttl_secs: i64,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenCache {
    fn new(jwt: Arc<JwtService>, ttl_secs: i64) -> Self {
        Self {
            jwt,
            ttl_secs,
            cached: Mutex::new(None),
        }
    }

    /// Returns a cached token until `exp - 5 minutes`, otherwise mints a fresh one.
    async fn get(&self) -> Result<String, OrchestratorError> {
        let mut guard = self.cached.lock().await;
        let now = Utc::now().timestamp();
        if let Some(cached) = guard.as_ref() {
            if cached.expires_at - 300 > now {
                return Ok(cached.token.clone());
            }
        }
        let (token, exp) = self
            .jwt
            .mint_internal_token(self.ttl_secs)
            .map_err(OrchestratorError::Internal)?;
        *guard = Some(CachedToken {
            token: token.clone(),
            expires_at: exp,
        });
        Ok(token)
    }

    async fn force_refresh(&self) -> Result<String, OrchestratorError> {
        *self.cached.lock().await = None;
        self.get().await
    }
}

/// Dispatches to the remote crew-execution service, with optional local fallback
/// (spec.md §4.5). Implements [`Handler`] so it can sit in the same registry slot
/// as an in-process handler.
pub struct RemoteCrewHandler {
    crew_name: &'static str,
    base_url: String,
    client: reqwest::Client,
    tokens: TokenCache,
    fallback_to_local: bool,
    local: Option<Arc<dyn Handler>>,
}

impl RemoteCrewHandler {
    pub fn new(
        crew_name: &'static str,
        base_url: String,
        client: reqwest::Client,
        jwt: Arc<JwtService>,
        token_ttl_secs: i64,
        fallback_to_local: bool,
        local: Option<Arc<dyn Handler>>,
    ) -> Self {
        Self {
            crew_name,
            base_url,
            client,
            tokens: TokenCache::new(jwt, token_ttl_secs),
            fallback_to_local,
            local,
        }
    }

    async fn call_remote(
        &self,
        payload: &serde_json::Value,
        request_id: &str,
        retry_on_auth_failure: bool,
    ) -> Result<serde_json::Value, OrchestratorError> {
        let token = self.tokens.get().await?;

        let response = self
            .client
            .post(format!("{}/execute_crew", self.base_url))
            .bearer_auth(&token)
            .header("X-Request-ID", request_id)
            .json(&ExecuteCrewRequest {
                crew_name: self.crew_name,
                inputs: payload.clone(),
                request_id: request_id.to_string(),
            })
            .send()
            .await
            .map_err(map_remote_transport_error)?;

        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(OrchestratorError::HandlerNotFound(self.crew_name.to_string()));
        }
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            if retry_on_auth_failure {
                self.tokens.force_refresh().await?;
                return Box::pin(self.call_remote(payload, request_id, false)).await;
            }
            return Err(OrchestratorError::Authentication(
                "remote crew service rejected internal token".to_string(),
            ));
        }
        if status.is_server_error() {
            return Err(OrchestratorError::RemoteCrewUnavailable(format!(
                "remote crew service returned {status}"
            )));
        }

        let body: ExecuteCrewResponse = response.json().await.map_err(OrchestratorError::from)?;
        if body.success {
            Ok(body.result.unwrap_or(serde_json::Value::Null))
        } else {
            Err(OrchestratorError::CrewExecutionError(
                body.error.unwrap_or_else(|| "remote crew reported failure".to_string()),
            ))
        }
    }
}

fn map_remote_transport_error(err: reqwest::Error) -> OrchestratorError {
    if err.is_timeout() || err.is_connect() {
        OrchestratorError::RemoteCrewUnavailable(err.to_string())
    } else {
        OrchestratorError::from(err)
    }
}

#[async_trait]
impl Handler for RemoteCrewHandler {
    fn metadata(&self) -> HandlerMetadata {
        HandlerMetadata {
            name: self.crew_name,
            ..Default::default()
        }
    }

    async fn execute(
        &self,
        payload: serde_json::Value,
        ctx: HandlerContext,
    ) -> Result<serde_json::Value, OrchestratorError> {
        let request_id = ctx.job_id.to_string();
        let mut last_unavailable = None;

        // Retries the remote call on its own, recording one `error` event per
        // failed attempt, before falling back to the local handler (spec.md
        // §4.5 S4: "three `error` events recorded with category
        // `RemoteCrewUnavailable`, then `completed` via local handler"). A
        // RemoteCrewUnavailable that survives every attempt without a local
        // fallback propagates to the engine, which applies its own retry/
        // finalize decision on the next claim.
        for attempt in 1..=REMOTE_RETRY_ATTEMPTS {
            match self.call_remote(&payload, &request_id, true).await {
                Ok(result) => return Ok(result),
                Err(OrchestratorError::RemoteCrewUnavailable(reason)) => {
                    let err = OrchestratorError::RemoteCrewUnavailable(reason);
                    ctx.sink
                        .emit(
                            ctx.job_id,
                            EventType::Error,
                            serde_json::json!({
                                "category": err.category(),
                                "message": err.to_string(),
                                "attempt": attempt,
                            }),
                        )
                        .await?;
                    last_unavailable = Some(err.to_string());
                }
                Err(other) => return Err(other),
            }
        }

        if self.fallback_to_local {
            if let Some(local) = &self.local {
                return local.execute(payload, ctx).await;
            }
        }
        Err(OrchestratorError::RemoteCrewUnavailable(
            last_unavailable.unwrap_or_else(|| "remote crew service unavailable".to_string()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::JobId;
    use crate::kernel::events::sink::EventSink;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct NoopSink;

    #[async_trait]
    impl EventSink for NoopSink {
        async fn emit(
            &self,
            _job_id: JobId,
            _event_type: crate::kernel::events::types::EventType,
            _data: serde_json::Value,
        ) -> Result<(), OrchestratorError> {
            Ok(())
        }
    }

    fn ctx() -> HandlerContext {
        HandlerContext {
            job_id: JobId::new(),
            cancel: tokio_util::sync::CancellationToken::new(),
            sink: Arc::new(NoopSink),
        }
    }

    fn jwt() -> Arc<JwtService> {
        Arc::new(JwtService::new("test-secret", "crew-orchestrator".to_string()))
    }

    #[tokio::test]
    async fn successful_response_is_returned_as_is() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/execute_crew"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "result": {"answer": 42},
            })))
            .mount(&server)
            .await;

        let handler = RemoteCrewHandler::new(
            "gen_crew",
            server.uri(),
            reqwest::Client::new(),
            jwt(),
            300,
            false,
            None,
        );

        let result = handler.execute(serde_json::json!({}), ctx()).await.unwrap();
        assert_eq!(result, serde_json::json!({"answer": 42}));
    }

    #[tokio::test]
    async fn server_error_falls_back_to_local_handler_when_enabled() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/execute_crew"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        struct LocalStub;
        #[async_trait]
        impl Handler for LocalStub {
            fn metadata(&self) -> HandlerMetadata {
                HandlerMetadata::default()
            }
            async fn execute(
                &self,
                _payload: serde_json::Value,
                _ctx: HandlerContext,
            ) -> Result<serde_json::Value, OrchestratorError> {
                Ok(serde_json::json!({"local": true}))
            }
        }

        let handler = RemoteCrewHandler::new(
            "gen_crew",
            server.uri(),
            reqwest::Client::new(),
            jwt(),
            300,
            true,
            Some(Arc::new(LocalStub)),
        );

        let result = handler.execute(serde_json::json!({}), ctx()).await.unwrap();
        assert_eq!(result, serde_json::json!({"local": true}));
    }

    #[tokio::test]
    async fn server_error_without_fallback_is_reported_as_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/execute_crew"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let handler = RemoteCrewHandler::new(
            "gen_crew",
            server.uri(),
            reqwest::Client::new(),
            jwt(),
            300,
            false,
            None,
        );

        let err = handler.execute(serde_json::json!({}), ctx()).await.unwrap_err();
        assert!(matches!(err, OrchestratorError::RemoteCrewUnavailable(_)));
    }
}
