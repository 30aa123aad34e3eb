//! HTTP client for the external embedding service (C7, spec.md §4.7, §6.3).

use rand::Rng;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::warn;

const MAX_ATTEMPTS: u32 = 5;
const BACKOFF_BASE: Duration = Duration::from_secs(1);

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    inputs: &'a [String],
    model: &'a str,
}

/// Embeds batches of text via `POST /embed` (spec.md §6.3).
///
/// On repeated failure, callers fall back to a zero vector to preserve
/// indexing progress (spec.md §4.7); this type only performs the retried
/// HTTP call and surfaces the final error for that decision to be made by
/// the pipeline.
#[derive(Clone)]
pub struct EmbeddingClient {
    client: Client,
    base_url: String,
    model: String,
    dimension: usize,
}

impl EmbeddingClient {
    pub fn new(client: Client, base_url: String, model: String, dimension: usize) -> Self {
        Self {
            client,
            base_url,
            model,
            dimension,
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// A vector of the right dimension for degraded fallback, per spec.md §4.7.
    pub fn zero_vector(&self) -> Vec<f32> {
        vec![0.0; self.dimension]
    }

    /// Requests embeddings for `inputs`, retrying transient failures with
    /// exponential backoff (base 1s, up to 5 attempts, full jitter).
    pub async fn embed_batch(&self, inputs: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.try_embed_batch(inputs).await {
                Ok(vectors) => return Ok(vectors),
                Err(e) if attempt >= MAX_ATTEMPTS => return Err(e),
                Err(e) => {
                    warn!(attempt, error = %e, "embedding request failed, retrying");
                    tokio::time::sleep(backoff_delay(attempt)).await;
                }
            }
        }
    }

    async fn try_embed_batch(&self, inputs: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        let response = self
            .client
            .post(format!("{}/embed", self.base_url))
            .json(&EmbedRequest {
                inputs,
                model: &self.model,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            anyhow::bail!("embedding service returned {}", response.status());
        }

        let vectors: Vec<Vec<f32>> = response.json().await?;
        Ok(vectors)
    }
}

fn backoff_delay(attempt: u32) -> Duration {
    let exp_ms = BACKOFF_BASE.as_millis().saturating_mul(1u128 << attempt.min(10));
    let capped = exp_ms.min(Duration::from_secs(30).as_millis());
    let jittered = rand::thread_rng().gen_range(0..=capped.max(1)) as u64;
    Duration::from_millis(jittered)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_vector_matches_configured_dimension() {
        let client = EmbeddingClient::new(Client::new(), "http://x".into(), "m".into(), 1536);
        assert_eq!(client.zero_vector().len(), 1536);
    }

    #[test]
    fn backoff_never_exceeds_cap() {
        for attempt in 1..=5 {
            assert!(backoff_delay(attempt) <= Duration::from_secs(30));
        }
    }
}
