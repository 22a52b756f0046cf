//! OpenAI-compatible chat-completions provider.
//!
//! Works against any endpoint exposing `POST {base_url}/chat/completions`
//! (OpenAI, OpenRouter, Together, Ollama, self-hosted gateways).

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use super::{CompletionRequest, LanguageModel};
use crate::config::LlmSettings;
use crate::error::LlmError;

/// External API provider
pub struct ExternalProvider {
    endpoint: String,
    api_key: String,
    model: String,
    timeout_secs: u64,
    client: Client,
}

impl ExternalProvider {
    /// Create new external provider
    pub fn new(base_url: &str, api_key: String, model: String, timeout_secs: u64) -> Result<Self, LlmError> {
        let client = Client::builder()
            .connect_timeout(std::time::Duration::from_secs(15))
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .pool_idle_timeout(std::time::Duration::from_secs(90))
            .tcp_nodelay(true)
            .build()
            .map_err(|e| LlmError::NotConfigured {
                reason: format!("failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key,
            model,
            timeout_secs,
            client,
        })
    }

    /// Build a provider from settings, reading the API key from the
    /// configured environment variable.
    pub fn from_settings(settings: &LlmSettings) -> Result<Self, LlmError> {
        let api_key = settings.api_key().ok_or_else(|| LlmError::NotConfigured {
            reason: format!("{} environment variable not set", settings.api_key_env),
        })?;
        Self::new(&settings.base_url, api_key, settings.model.clone(), settings.timeout_secs)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Parse a response body as JSON, returning a clear error if the server returned HTML.
    async fn parse_json_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
        endpoint: &str,
    ) -> Result<T, LlmError> {
        let status = response.status();
        let body = response.text().await.map_err(|e| LlmError::MalformedResponse {
            reason: format!("failed to read response body from {}: {}", endpoint, e),
        })?;
        parse_body(&body, status.as_u16(), endpoint)
    }

    fn map_send_error(&self, e: reqwest::Error) -> LlmError {
        if e.is_timeout() {
            LlmError::Timeout { secs: self.timeout_secs }
        } else if e.is_connect() {
            LlmError::Connection {
                reason: format!("failed to connect to {}: {}", self.endpoint, e),
            }
        } else {
            LlmError::Connection {
                reason: format!("request to {} failed: {}", self.endpoint, e),
            }
        }
    }
}

fn parse_body<T: serde::de::DeserializeOwned>(body: &str, status: u16, endpoint: &str) -> Result<T, LlmError> {
    let trimmed = body.trim_start();
    if trimmed.starts_with('<') {
        let preview: String = trimmed.chars().take(200).collect();
        return Err(LlmError::MalformedResponse {
            reason: format!(
                "endpoint {} returned HTML instead of JSON (HTTP {}): {}",
                endpoint, status, preview
            ),
        });
    }
    serde_json::from_str::<T>(body).map_err(|e| {
        let preview: String = body.chars().take(300).collect();
        LlmError::MalformedResponse {
            reason: format!("failed to parse JSON from {} (HTTP {}): {}. Body: {}", endpoint, status, e, preview),
        }
    })
}

fn extract_content(result: OpenAIResponse) -> Result<String, LlmError> {
    result
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| LlmError::MalformedResponse {
            reason: "response contained no choices".to_string(),
        })
}

#[async_trait]
impl LanguageModel for ExternalProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        let body = json!({
            "model": self.model,
            "messages": request.messages,
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
            "stream": false
        });

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let error = response.text().await.unwrap_or_default();
            return Err(LlmError::from_status(status.as_u16(), error));
        }

        let result: OpenAIResponse = Self::parse_json_response(response, &self.endpoint).await?;
        extract_content(result)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIMessage {
    content: Option<String>,
}
