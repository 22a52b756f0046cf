//! Retrieval-augmented answering over indexed reviews.

pub mod confidence;
pub mod dedup;
pub mod expansion;
pub mod pipeline;
pub mod query;
pub mod sentiment_filter;
pub mod synthesis;

pub use confidence::{confidence, sigmoid};
pub use expansion::QueryExpander;
pub use pipeline::{RagPipeline, LOW_CONFIDENCE_ANSWER, NO_DATA_ANSWER, RAW_CONTEXT_ANSWER};
pub use query::RagQuery;
pub use sentiment_filter::SentimentFilterDetector;
pub use synthesis::{build_context, AnswerSynthesizer, Synthesis};
