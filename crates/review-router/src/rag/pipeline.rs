//! Multi-query retrieval, reranking, confidence and synthesis.
//!
//! `query` never fails: an empty index, missing reranker or missing model
//! each degrade to a documented fallback answer.

use std::sync::Arc;

use futures::future::join_all;

use super::confidence::confidence;
use super::dedup::merge_variant_hits;
use super::expansion::QueryExpander;
use super::query::RagQuery;
use super::synthesis::AnswerSynthesizer;
use crate::config::AssistantConfig;
use crate::llm::LanguageModel;
use crate::reranking::Reranker;
use crate::storage::VectorIndex;
use crate::types::{MetadataFilter, RagResult, ScoredDocument, SearchResult};

pub const NO_DATA_ANSWER: &str = "No data found.";
pub const RAW_CONTEXT_ANSWER: &str = "Returned raw context.";
pub const LOW_CONFIDENCE_ANSWER: &str =
    "I found some information but it may not be directly relevant to your question.";

pub struct RagPipeline {
    index: Arc<dyn VectorIndex>,
    reranker: Option<Arc<dyn Reranker>>,
    expander: Option<QueryExpander>,
    synthesizer: AnswerSynthesizer,
    candidate_multiplier: usize,
    confidence_threshold: f64,
}

impl RagPipeline {
    /// Retrieval only: no reranker, no model.
    pub fn new(index: Arc<dyn VectorIndex>) -> Self {
        Self {
            index,
            reranker: None,
            expander: None,
            synthesizer: AnswerSynthesizer::new(None),
            candidate_multiplier: 2,
            confidence_threshold: 0.4,
        }
    }

    pub fn from_config(
        index: Arc<dyn VectorIndex>,
        reranker: Option<Arc<dyn Reranker>>,
        llm: Option<Arc<dyn LanguageModel>>,
        config: &AssistantConfig,
    ) -> Self {
        let expander = llm.clone().map(|llm| {
            QueryExpander::new(llm)
                .with_variants(config.retrieval.expansion_variants)
                .with_max_tokens(config.llm.expansion_max_tokens)
        });
        let synthesizer = AnswerSynthesizer::new(llm)
            .with_retry(config.synthesis.retry.policy())
            .with_max_context_chars(config.synthesis.max_context_chars)
            .with_max_tokens(config.llm.synthesis_max_tokens);

        Self {
            index,
            reranker,
            expander,
            synthesizer,
            candidate_multiplier: config.retrieval.candidate_multiplier.max(1),
            confidence_threshold: config.synthesis.confidence_threshold,
        }
    }

    pub fn with_reranker(mut self, reranker: Arc<dyn Reranker>) -> Self {
        self.reranker = Some(reranker);
        self
    }

    /// Install a model for both query expansion and synthesis, keeping the
    /// synthesizer's other settings at their defaults.
    pub fn with_llm(mut self, llm: Arc<dyn LanguageModel>) -> Self {
        self.expander = Some(QueryExpander::new(llm.clone()));
        self.synthesizer = AnswerSynthesizer::new(Some(llm));
        self
    }

    pub fn with_synthesizer(mut self, synthesizer: AnswerSynthesizer) -> Self {
        self.synthesizer = synthesizer;
        self
    }

    pub fn with_confidence_threshold(mut self, threshold: f64) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    pub fn has_reranker(&self) -> bool {
        self.reranker.is_some()
    }

    pub async fn query(&self, request: &RagQuery) -> RagResult {
        let question = request.question.trim();
        if question.is_empty() || request.top_k == 0 {
            return RagResult {
                answer: NO_DATA_ANSWER.to_string(),
                sources: Vec::new(),
                query_variants: Vec::new(),
                confidence: 0.0,
                fallback: true,
            };
        }

        let variants = match (&self.expander, request.use_query_expansion) {
            (Some(expander), true) => expander.expand(question).await,
            _ => vec![question.to_string()],
        };

        let filter = request.sentiment_filter.map(MetadataFilter::sentiment);
        let pool = request.top_k.saturating_mul(self.candidate_multiplier);
        let candidates = self
            .multi_query_search(&variants, pool, filter.as_ref())
            .await;

        if candidates.is_empty() {
            tracing::info!(variants = variants.len(), "RAG query found no candidates");
            return RagResult {
                answer: NO_DATA_ANSWER.to_string(),
                sources: Vec::new(),
                query_variants: variants,
                confidence: 0.0,
                fallback: true,
            };
        }
        let candidate_count = candidates.len();

        let sources = if request.use_reranking {
            self.rerank(question, candidates, request.top_k).await
        } else {
            truncated(candidates, request.top_k)
        };

        let top_score = sources.first().and_then(|r| r.rerank_score);
        let rerank_failed = request.use_reranking && self.reranker.is_some() && top_score.is_none();
        let confidence = confidence(top_score);

        let (answer, answer_fallback) = if !request.synthesize {
            (RAW_CONTEXT_ANSWER.to_string(), false)
        } else if confidence > self.confidence_threshold {
            let synthesis = self.synthesizer.synthesize(question, &sources).await;
            (synthesis.answer, synthesis.fallback)
        } else {
            (LOW_CONFIDENCE_ANSWER.to_string(), true)
        };
        let fallback = rerank_failed || answer_fallback;

        tracing::info!(
            variants = variants.len(),
            candidates = candidate_count,
            returned = sources.len(),
            confidence = confidence,
            synthesized = request.synthesize && confidence > self.confidence_threshold,
            fallback = fallback,
            "RAG query complete"
        );

        RagResult {
            answer,
            sources,
            query_variants: variants,
            confidence,
            fallback,
        }
    }

    /// Search every variant concurrently, then merge in variant order with
    /// content-hash deduplication. A failing variant contributes nothing.
    pub async fn multi_query_search(
        &self,
        variants: &[String],
        k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Vec<SearchResult> {
        let searches = variants
            .iter()
            .map(|variant| self.index.similarity_search(variant, k, filter));
        let outcomes = join_all(searches).await;

        let per_variant: Vec<(String, Vec<ScoredDocument>)> = variants
            .iter()
            .zip(outcomes)
            .map(|(variant, outcome)| {
                let hits = outcome.unwrap_or_else(|e| {
                    tracing::warn!(variant = %variant, error = %e, "Variant search failed");
                    Vec::new()
                });
                (variant.clone(), hits)
            })
            .collect();

        merge_variant_hits(per_variant)
    }

    /// Attach cross-encoder scores, sort descending and keep `top_k`.
    /// Without a reranker, or when scoring fails, the first `top_k` pass
    /// through unscored.
    pub async fn rerank(&self, question: &str, results: Vec<SearchResult>, top_k: usize) -> Vec<SearchResult> {
        let Some(reranker) = &self.reranker else {
            return truncated(results, top_k);
        };

        let contents: Vec<String> = results.iter().map(|r| r.content().to_string()).collect();
        let scores = match reranker.score(question, &contents).await {
            Ok(scores) if scores.len() == results.len() => scores,
            Ok(scores) => {
                tracing::warn!(
                    expected = results.len(),
                    got = scores.len(),
                    "Reranker returned wrong number of scores, skipping rerank"
                );
                return truncated(results, top_k);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Reranking failed, keeping retrieval order");
                return truncated(results, top_k);
            }
        };

        let mut scored: Vec<SearchResult> = results
            .into_iter()
            .zip(scores)
            .map(|(mut r, s)| {
                r.rerank_score = Some(s);
                r
            })
            .collect();

        scored.sort_by(|a, b| {
            let a = a.rerank_score.unwrap_or(f32::NEG_INFINITY);
            let b = b.rerank_score.unwrap_or(f32::NEG_INFINITY);
            b.partial_cmp(&a).unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(top_k);
        scored
    }
}

fn truncated(mut results: Vec<SearchResult>, top_k: usize) -> Vec<SearchResult> {
    results.truncate(top_k);
    results
}
