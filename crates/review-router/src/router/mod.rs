//! Supervisor routing.
//!
//! Every user message is assigned to exactly one [`Worker`]. A fixed cascade
//! of keyword rules handles the common phrasings without any model call; only
//! messages no rule recognises are sent to the language model.

pub mod patterns;
pub mod session;
pub mod supervisor;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use patterns::{PatternRouter, PatternRule};
pub use session::SessionState;
pub use supervisor::Supervisor;

/// Downstream analysis strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Worker {
    Sentiment,
    Rag,
    Summarize,
    Insight,
    Analyst,
    Chat,
}

impl Worker {
    pub const ALL: [Worker; 6] = [
        Worker::Sentiment,
        Worker::Rag,
        Worker::Summarize,
        Worker::Insight,
        Worker::Analyst,
        Worker::Chat,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sentiment => "SENTIMENT",
            Self::Rag => "RAG",
            Self::Summarize => "SUMMARIZE",
            Self::Insight => "INSIGHT",
            Self::Analyst => "ANALYST",
            Self::Chat => "CHAT",
        }
    }

    /// Exact, case-insensitive name lookup.
    pub fn from_name(name: &str) -> Option<Self> {
        let upper = name.trim().to_uppercase();
        Self::ALL.into_iter().find(|w| w.as_str() == upper)
    }
}

impl fmt::Display for Worker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why the router fell back to [`Worker::Chat`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FallbackReason {
    EmptyMessage,
    /// No rule matched and no language model is installed.
    NoModel,
    ModelFailed { error: String },
    /// The model answered with something other than a worker name.
    UnrecognizedReply { reply: String },
}

/// Which stage of the cascade produced a decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RouteSource {
    Pattern { rule: PatternRule },
    LanguageModel { reply: String },
    Fallback { reason: FallbackReason },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingDecision {
    pub worker: Worker,
    pub source: RouteSource,
}

impl RoutingDecision {
    pub fn pattern(rule: PatternRule) -> Self {
        Self {
            worker: rule.worker(),
            source: RouteSource::Pattern { rule },
        }
    }

    pub fn fallback(reason: FallbackReason) -> Self {
        Self {
            worker: Worker::Chat,
            source: RouteSource::Fallback { reason },
        }
    }

    pub fn used_model(&self) -> bool {
        matches!(
            self.source,
            RouteSource::LanguageModel { .. }
                | RouteSource::Fallback {
                    reason: FallbackReason::ModelFailed { .. } | FallbackReason::UnrecognizedReply { .. }
                }
        )
    }
}
