//! In-process fakes for unit tests.

use std::collections::{HashMap, VecDeque};

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::LlmError;
use crate::llm::{CompletionRequest, LanguageModel};
use crate::reranking::Reranker;

/// Replays scripted replies in order, then repeats `fallback` (or fails
/// with a permanent error once the script runs out).
pub struct ScriptedModel {
    replies: Mutex<VecDeque<Result<String, LlmError>>>,
    fallback: Option<Result<String, LlmError>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedModel {
    pub fn new(replies: Vec<Result<String, LlmError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            fallback: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn always(reply: &str) -> Self {
        Self {
            fallback: Some(Ok(reply.to_string())),
            ..Self::new(Vec::new())
        }
    }

    pub fn always_failing(error: LlmError) -> Self {
        Self {
            fallback: Some(Err(error)),
            ..Self::new(Vec::new())
        }
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        self.requests.lock().push(request.clone());
        if let Some(next) = self.replies.lock().pop_front() {
            return next;
        }
        match &self.fallback {
            Some(reply) => reply.clone(),
            None => Err(LlmError::Api {
                status: 400,
                body: "script exhausted".into(),
            }),
        }
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

/// Scores candidates from a content → logit table; unknown content scores
/// `default`.
pub struct TableReranker {
    scores: HashMap<String, f32>,
    default: f32,
    calls: Mutex<usize>,
}

impl TableReranker {
    pub fn new(scores: &[(&str, f32)], default: f32) -> Self {
        Self {
            scores: scores.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            default,
            calls: Mutex::new(0),
        }
    }

    pub fn uniform(score: f32) -> Self {
        Self::new(&[], score)
    }

    pub fn call_count(&self) -> usize {
        *self.calls.lock()
    }
}

#[async_trait]
impl Reranker for TableReranker {
    async fn score(&self, _query: &str, candidates: &[String]) -> Result<Vec<f32>> {
        *self.calls.lock() += 1;
        Ok(candidates
            .iter()
            .map(|c| self.scores.get(c).copied().unwrap_or(self.default))
            .collect())
    }
}

pub struct FailingReranker;

#[async_trait]
impl Reranker for FailingReranker {
    async fn score(&self, _query: &str, _candidates: &[String]) -> Result<Vec<f32>> {
        anyhow::bail!("reranker model not loaded")
    }
}
