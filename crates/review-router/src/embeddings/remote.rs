//! OpenAI-compatible `/embeddings` client.
//!
//! Retry strategy: 429, 5xx, timeouts and connection failures go through the
//! shared [`RetryPolicy`]; other client errors fail immediately.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use super::EmbeddingModel;
use crate::error::LlmError;
use crate::llm::RetryPolicy;

pub struct RemoteEmbeddings {
    endpoint: String,
    api_key: String,
    model: String,
    dimension: usize,
    timeout_secs: u64,
    retry: RetryPolicy,
    client: Client,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Deserialize)]
struct EmbeddingItem {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

impl RemoteEmbeddings {
    pub fn new(
        base_url: &str,
        api_key: String,
        model: String,
        dimension: usize,
        timeout_secs: u64,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build embeddings HTTP client")?;

        Ok(Self {
            endpoint: format!("{}/embeddings", base_url.trim_end_matches('/')),
            api_key,
            model,
            dimension,
            timeout_secs,
            retry: RetryPolicy::exponential(4, Duration::from_secs(1), 2),
            client,
        })
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn request(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
        let body = serde_json::json!({
            "model": self.model,
            "input": texts,
        });

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout {
                        secs: self.timeout_secs,
                    }
                } else {
                    LlmError::Connection {
                        reason: format!("request to {} failed: {}", self.endpoint, e),
                    }
                }
            })?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(LlmError::from_status(status.as_u16(), text));
        }

        parse_embeddings(&text)
    }
}

/// Decode `data[].embedding`, ordered by `data[].index`.
fn parse_embeddings(body: &str) -> Result<Vec<Vec<f32>>, LlmError> {
    let mut parsed: EmbeddingResponse =
        serde_json::from_str(body).map_err(|e| LlmError::MalformedResponse {
            reason: format!("invalid embeddings response: {}", e),
        })?;
    parsed.data.sort_by_key(|item| item.index);
    Ok(parsed.data.into_iter().map(|item| item.embedding).collect())
}

#[async_trait]
impl EmbeddingModel for RemoteEmbeddings {
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_documents(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| anyhow::anyhow!("embeddings endpoint returned no vectors"))
    }

    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let vectors = self
            .retry
            .run("embeddings", LlmError::is_transient, || self.request(texts))
            .await?;

        if vectors.len() != texts.len() {
            anyhow::bail!(
                "embeddings endpoint returned {} vectors for {} inputs",
                vectors.len(),
                texts.len()
            );
        }
        if let Some(bad) = vectors.iter().find(|v| v.len() != self.dimension) {
            anyhow::bail!(
                "embedding dimension mismatch: expected {}, got {}",
                self.dimension,
                bad.len()
            );
        }
        Ok(vectors)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
