use serde::{Deserialize, Serialize};

use crate::types::Sentiment;

pub const DEFAULT_TOP_K: usize = 5;

/// Options for one RAG query.
///
/// Defaults: top 5, reranking on, query expansion off, synthesis on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RagQuery {
    pub question: String,
    pub top_k: usize,
    pub sentiment_filter: Option<Sentiment>,
    pub use_reranking: bool,
    pub use_query_expansion: bool,
    pub synthesize: bool,
}

impl RagQuery {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            top_k: DEFAULT_TOP_K,
            sentiment_filter: None,
            use_reranking: true,
            use_query_expansion: false,
            synthesize: true,
        }
    }

    pub fn top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn sentiment_filter(mut self, sentiment: Option<Sentiment>) -> Self {
        self.sentiment_filter = sentiment;
        self
    }

    pub fn reranking(mut self, enabled: bool) -> Self {
        self.use_reranking = enabled;
        self
    }

    pub fn query_expansion(mut self, enabled: bool) -> Self {
        self.use_query_expansion = enabled;
        self
    }

    pub fn synthesize(mut self, enabled: bool) -> Self {
        self.synthesize = enabled;
        self
    }

    /// Key for the answer cache: normalised question plus every option that
    /// changes the result.
    pub fn cache_key(&self) -> String {
        let question = self
            .question
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        format!(
            "{}|k={}|s={}|r={}|x={}|y={}",
            question,
            self.top_k,
            self.sentiment_filter.map(|s| s.as_str()).unwrap_or("-"),
            self.use_reranking as u8,
            self.use_query_expansion as u8,
            self.synthesize as u8,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let q = RagQuery::new("late delivery");
        assert_eq!(q.top_k, 5);
        assert!(q.use_reranking);
        assert!(!q.use_query_expansion);
        assert!(q.synthesize);
        assert!(q.sentiment_filter.is_none());
    }

    #[test]
    fn test_cache_key_normalises_question() {
        let a = RagQuery::new("Late   Delivery ");
        let b = RagQuery::new("late delivery");
        assert_eq!(a.cache_key(), b.cache_key());
        assert_ne!(a.cache_key(), b.clone().top_k(2).cache_key());
        assert_ne!(
            b.cache_key(),
            b.clone().sentiment_filter(Some(Sentiment::Negative)).cache_key()
        );
    }
}
