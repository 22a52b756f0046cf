//! Language model boundary.
//!
//! The core only ever needs one operation from a model: complete a short
//! list of chat messages into text. Providers implement [`LanguageModel`];
//! callers hold them as `Arc<dyn LanguageModel>` so tests can swap in
//! scripted fakes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::LlmError;

pub mod external;
pub mod retry;

pub use external::ExternalProvider;
pub use retry::RetryPolicy;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// A chat message with role and content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: ChatRole::System, content: content.into() }
    }
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: ChatRole::User, content: content.into() }
    }
    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: ChatRole::Assistant, content: content.into() }
    }
}

/// One non-streaming completion call.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: usize,
}

impl CompletionRequest {
    /// Deterministic (temperature 0) request.
    pub fn deterministic(messages: Vec<ChatMessage>, max_tokens: usize) -> Self {
        Self {
            messages,
            temperature: 0.0,
            max_tokens,
        }
    }

    /// Single user-turn prompt.
    pub fn prompt(prompt: impl Into<String>, max_tokens: usize) -> Self {
        Self::deterministic(vec![ChatMessage::user(prompt)], max_tokens)
    }
}

/// Core trait for completion providers.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError>;

    /// Model identifier, for logging.
    fn model_name(&self) -> &str;
}

/// Quick token estimate (chars / 4).
pub fn estimate_tokens(text: &str) -> usize {
    (text.len() + 3) / 4
}
