use std::sync::Arc;

use super::{FallbackReason, PatternRouter, RouteSource, RoutingDecision, SessionState, Worker};
use crate::llm::{ChatMessage, ChatRole, CompletionRequest, LanguageModel};

// ---------------------------------------------------------------------------
// Router Prompt
// ---------------------------------------------------------------------------

const SUPERVISOR_PROMPT: &str = r#"You are the Supervisor - AI Worker Coordinator.

MISSION: Analyze user question and select the most appropriate worker.

AVAILABLE WORKERS:
1. SENTIMENT - Sentiment analysis expert
   When: "analyze sentiment", "pain points", "customer complaints", "customer psychology"

2. RAG - Information retrieval expert
   When: "find reviews about...", "what customers say about...", "any reviews mentioning..."

3. SUMMARIZE - Summarization expert
   When: "summarize", "summary", "overview", "general view"

4. INSIGHT - Strategic analysis expert
   When: "insight", "recommendation", "strategy", "SWOT"

5. ANALYST - Data calculation AND CHART DRAWING expert
   When: "how many", "calculate average", "percentage", "statistics", "count", "mean", "draw chart", "graph", "plot"

6. CHAT - General assistant (fallback)
   When: General questions, greetings, unclear requests

RULES:
- Only return worker NAME (SENTIMENT, RAG, SUMMARIZE, INSIGHT, ANALYST, CHAT)
- NO explanation, NO extra words
- Prioritize ANALYST for numerical questions
- Prioritize RAG for specific search queries

EXAMPLES:
User: "How many positive reviews?"
Output: ANALYST

User: "Find reviews about battery"
Output: RAG

User: "Analyze customer sentiment"
Output: SENTIMENT

User: "Recommend product improvements"
Output: INSIGHT"#;

pub const DEFAULT_ROUTER_MAX_TOKENS: usize = 20;

/// Map a model reply onto a worker. Surrounding whitespace, quotes and
/// punctuation are ignored; anything else must be an exact worker name.
pub fn parse_worker_reply(reply: &str) -> Option<Worker> {
    let cleaned = reply
        .trim()
        .trim_matches(|c: char| !c.is_alphanumeric())
        .to_uppercase();
    Worker::from_name(&cleaned)
}

// ---------------------------------------------------------------------------
// Supervisor
// ---------------------------------------------------------------------------

/// Routes user messages to workers: keyword cascade first, language model
/// for anything the cascade does not recognise. Never fails; every path ends
/// in a [`RoutingDecision`].
pub struct Supervisor {
    patterns: PatternRouter,
    llm: Option<Arc<dyn LanguageModel>>,
    max_tokens: usize,
}

impl Supervisor {
    pub fn new(llm: Option<Arc<dyn LanguageModel>>) -> Self {
        Self {
            patterns: PatternRouter::new(),
            llm,
            max_tokens: DEFAULT_ROUTER_MAX_TOKENS,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn has_model(&self) -> bool {
        self.llm.is_some()
    }

    pub async fn route(&self, utterance: &str) -> RoutingDecision {
        let decision = if utterance.trim().is_empty() {
            RoutingDecision::fallback(FallbackReason::EmptyMessage)
        } else if let Some(rule) = self.patterns.classify(utterance) {
            RoutingDecision::pattern(rule)
        } else {
            self.route_with_model(utterance).await
        };

        match &decision.source {
            RouteSource::Pattern { rule } => {
                tracing::info!(worker = %decision.worker, rule = ?rule, "Routed by pattern")
            }
            RouteSource::LanguageModel { .. } => {
                tracing::info!(worker = %decision.worker, "Routed by language model")
            }
            RouteSource::Fallback { reason } => {
                tracing::info!(worker = %decision.worker, reason = ?reason, "Routed to fallback")
            }
        }
        decision
    }

    /// Route the last user turn of a conversation and record the decision
    /// in `state`. Earlier turns never influence the decision.
    pub async fn route_session(
        &self,
        state: &mut SessionState,
        messages: &[ChatMessage],
    ) -> RoutingDecision {
        let last_user = messages
            .iter()
            .rev()
            .find(|m| m.role == ChatRole::User)
            .map(|m| m.content.as_str())
            .unwrap_or("");
        let decision = self.route(last_user).await;

        tracing::debug!(
            session = %state.id,
            step = state.loop_step,
            worker = %decision.worker,
            "Session turn routed"
        );
        state.record(&decision);
        decision
    }

    async fn route_with_model(&self, utterance: &str) -> RoutingDecision {
        let Some(llm) = &self.llm else {
            return RoutingDecision::fallback(FallbackReason::NoModel);
        };

        let request = CompletionRequest::deterministic(
            vec![
                ChatMessage::system(SUPERVISOR_PROMPT),
                ChatMessage::user(format!("User question: {}", utterance)),
            ],
            self.max_tokens,
        );

        match llm.complete(&request).await {
            Ok(reply) => match parse_worker_reply(&reply) {
                Some(worker) => RoutingDecision {
                    worker,
                    source: RouteSource::LanguageModel {
                        reply: reply.trim().to_string(),
                    },
                },
                None => {
                    tracing::warn!(reply = %reply.trim(), "Unrecognised router reply, defaulting to CHAT");
                    RoutingDecision::fallback(FallbackReason::UnrecognizedReply {
                        reply: reply.trim().to_string(),
                    })
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, model = llm.model_name(), "Router model call failed");
                RoutingDecision::fallback(FallbackReason::ModelFailed {
                    error: e.to_string(),
                })
            }
        }
    }
}
