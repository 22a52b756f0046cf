#[cfg(feature = "cross-encoder")]
pub mod cross_encoder;

use anyhow::Result;
use async_trait::async_trait;

#[cfg(feature = "cross-encoder")]
pub use cross_encoder::CrossEncoderReranker;

/// Relevance scorer for (query, candidate) pairs.
///
/// Returns one unbounded logit per candidate, in input order. Higher means
/// more relevant; `0.0` is the 50% point once passed through a sigmoid.
#[async_trait]
pub trait Reranker: Send + Sync {
    async fn score(&self, query: &str, candidates: &[String]) -> Result<Vec<f32>>;
}
