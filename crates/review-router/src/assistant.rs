//! The review assistant: ingestion, routing, answering and analysis behind
//! one owned object.

use std::sync::Arc;

use anyhow::{anyhow, Result};

use crate::cache::AnswerCache;
use crate::config::AssistantConfig;
use crate::embeddings::{EmbeddingModel, HashingEmbeddings};
use crate::llm::{ChatMessage, ExternalProvider, LanguageModel};
use crate::processing::{ReviewChunker, ReviewRecord};
use crate::rag::{RagPipeline, RagQuery, SentimentFilterDetector};
use crate::reranking::Reranker;
use crate::router::{RoutingDecision, SessionState, Supervisor};
use crate::storage::{InMemoryIndex, VectorIndex};
use crate::summarizer::{AnalysisResult, SmartSummarizer, Stats};
use crate::types::{RagResult, Sentiment};

pub struct ReviewAssistant {
    index: Arc<dyn VectorIndex>,
    chunker: ReviewChunker,
    supervisor: Supervisor,
    pipeline: RagPipeline,
    summarizer: SmartSummarizer,
    cache: AnswerCache,
    sentiment_filter: SentimentFilterDetector,
    default_top_k: usize,
}

impl ReviewAssistant {
    pub fn builder() -> ReviewAssistantBuilder {
        ReviewAssistantBuilder::default()
    }

    /// Offline in-memory index plus the configured OpenAI-compatible model.
    /// A missing API key is not an error: every strategy has a model-free
    /// fallback.
    pub fn from_config(config: AssistantConfig) -> Result<Self> {
        let llm: Option<Arc<dyn LanguageModel>> = match ExternalProvider::from_settings(&config.llm) {
            Ok(provider) => Some(Arc::new(provider) as Arc<dyn LanguageModel>),
            Err(e) => {
                tracing::warn!(error = %e, "Running without a language model");
                None
            }
        };
        let mut builder = Self::builder().config(config);
        if let Some(llm) = llm {
            builder = builder.llm(llm);
        }
        builder.build()
    }

    pub async fn route(&self, utterance: &str) -> RoutingDecision {
        self.supervisor.route(utterance).await
    }

    pub async fn route_session(
        &self,
        state: &mut SessionState,
        messages: &[ChatMessage],
    ) -> RoutingDecision {
        self.supervisor.route_session(state, messages).await
    }

    /// Answers are cached per question and options until the next ingest.
    /// Fallback answers are not cached, so the next call tries again.
    pub async fn rag_query(&self, query: &RagQuery) -> RagResult {
        if let Some(hit) = self.cache.get(query) {
            return hit;
        }
        let result = self.pipeline.query(query).await;
        if !result.fallback && !result.sources.is_empty() {
            self.cache.put(query, result.clone());
        }
        result
    }

    /// Entry point for the search worker: default options plus a sentiment
    /// filter inferred from the wording of the question.
    pub async fn answer_search(&self, question: &str) -> RagResult {
        let filter = self.sentiment_filter.detect(question);
        if let Some(sentiment) = filter {
            tracing::debug!(sentiment = %sentiment, "Inferred sentiment filter");
        }
        let query = RagQuery::new(question)
            .top_k(self.default_top_k)
            .sentiment_filter(filter);
        self.rag_query(&query).await
    }

    pub async fn analyze_item(&self, text: &str, sentiment: Sentiment) -> AnalysisResult {
        self.summarizer.analyze_review(text, sentiment).await
    }

    pub async fn analyze_batch(&self, reviews: &[ReviewRecord]) -> Vec<AnalysisResult> {
        self.summarizer.analyze_batch(reviews).await
    }

    pub fn stats(&self) -> Stats {
        self.summarizer.stats()
    }

    /// Replace the indexed corpus with `records`. Returns the number of
    /// chunks indexed.
    pub async fn ingest(&self, records: &[ReviewRecord]) -> Result<usize> {
        let documents = self.chunker.chunk_records(records);
        let indexed = self.index.index(documents).await?;
        self.cache.clear();
        tracing::info!(reviews = records.len(), chunks = indexed, "Ingested reviews");
        Ok(indexed)
    }

    pub async fn document_count(&self) -> Result<usize> {
        self.index.count().await
    }

    pub fn has_model(&self) -> bool {
        self.supervisor.has_model()
    }

    pub fn has_reranker(&self) -> bool {
        self.pipeline.has_reranker()
    }
}

#[derive(Default)]
pub struct ReviewAssistantBuilder {
    config: AssistantConfig,
    index: Option<Arc<dyn VectorIndex>>,
    embedder: Option<Arc<dyn EmbeddingModel>>,
    reranker: Option<Arc<dyn Reranker>>,
    llm: Option<Arc<dyn LanguageModel>>,
}

impl ReviewAssistantBuilder {
    pub fn config(mut self, config: AssistantConfig) -> Self {
        self.config = config;
        self
    }

    /// Use a custom index. Overrides [`embedder`](Self::embedder).
    pub fn index(mut self, index: Arc<dyn VectorIndex>) -> Self {
        self.index = Some(index);
        self
    }

    /// Embedder for the default in-memory index.
    pub fn embedder(mut self, embedder: Arc<dyn EmbeddingModel>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    pub fn reranker(mut self, reranker: Arc<dyn Reranker>) -> Self {
        self.reranker = Some(reranker);
        self
    }

    pub fn llm(mut self, llm: Arc<dyn LanguageModel>) -> Self {
        self.llm = Some(llm);
        self
    }

    pub fn build(self) -> Result<ReviewAssistant> {
        let config = self.config;
        config.validate().map_err(|e| anyhow!("invalid configuration: {}", e))?;

        let index: Arc<dyn VectorIndex> = match self.index {
            Some(index) => index,
            None => {
                let embedder = self.embedder.unwrap_or_else(|| {
                    Arc::new(HashingEmbeddings::default()) as Arc<dyn EmbeddingModel>
                });
                Arc::new(InMemoryIndex::new(embedder))
            }
        };

        let supervisor = Supervisor::new(self.llm.clone())
            .with_max_tokens(config.llm.router_max_tokens);
        let pipeline = RagPipeline::from_config(index.clone(), self.reranker, self.llm.clone(), &config);
        let summarizer = SmartSummarizer::from_config(self.llm, &config);

        tracing::info!(
            model = supervisor.has_model(),
            reranker = pipeline.has_reranker(),
            cache = config.cache.enabled,
            "Review assistant ready"
        );

        Ok(ReviewAssistant {
            index,
            chunker: ReviewChunker::new(config.retrieval.chunk_size),
            supervisor,
            pipeline,
            summarizer,
            cache: AnswerCache::from_config(&config.cache),
            sentiment_filter: SentimentFilterDetector::new(),
            default_top_k: config.retrieval.default_top_k,
        })
    }
}
