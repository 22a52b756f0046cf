//! Question routing, retrieval-augmented answering and gatekept analysis
//! over a corpus of customer reviews.
//!
//! [`ReviewAssistant`] is the usual entry point. The pieces it wires
//! together ([`Supervisor`], [`RagPipeline`], [`SmartSummarizer`]) are
//! public and usable on their own.

pub mod assistant;
pub mod cache;
pub mod config;
pub mod embeddings;
pub mod error;
pub mod llm;
pub mod processing;
pub mod rag;
pub mod reranking;
pub mod router;
pub mod storage;
pub mod summarizer;
pub mod text;
pub mod types;

#[cfg(test)]
mod test_support;

pub use assistant::{ReviewAssistant, ReviewAssistantBuilder};
pub use cache::AnswerCache;
pub use config::AssistantConfig;
pub use embeddings::{EmbeddingModel, HashingEmbeddings, RemoteEmbeddings};
pub use error::LlmError;
pub use llm::{ChatMessage, ChatRole, CompletionRequest, ExternalProvider, LanguageModel, RetryPolicy};
pub use processing::{ReviewChunker, ReviewRecord};
pub use rag::{RagPipeline, RagQuery};
pub use reranking::Reranker;
pub use router::{
    FallbackReason, RouteSource, RoutingDecision, SessionState, Supervisor, Worker,
};
pub use storage::{InMemoryIndex, VectorIndex};
pub use summarizer::{
    AnalysisDetail, AnalysisResult, Gatekeeper, GatekeeperResult, ReviewCategory,
    SmartSummarizer, Stats, TopicClassifier,
};
pub use types::{
    Document, DocumentMetadata, MetadataFilter, RagResult, ScoredDocument, SearchResult,
    Sentiment,
};

pub use anyhow::{Error, Result};
