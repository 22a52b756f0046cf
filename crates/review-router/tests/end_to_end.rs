use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use review_router::rag::{AnswerSynthesizer, RAW_CONTEXT_ANSWER};
use review_router::{
    CompletionRequest, Gatekeeper, HashingEmbeddings, InMemoryIndex, LanguageModel, LlmError,
    RagPipeline, RagQuery, Reranker, RetryPolicy, ReviewAssistant, ReviewCategory, ReviewRecord,
    Sentiment, SmartSummarizer, Supervisor, VectorIndex, Worker,
};

struct OverloadedModel {
    calls: AtomicUsize,
}

#[async_trait]
impl LanguageModel for OverloadedModel {
    async fn complete(&self, _request: &CompletionRequest) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(LlmError::Overloaded {
            status: 503,
            body: "overloaded".into(),
        })
    }

    fn model_name(&self) -> &str {
        "overloaded"
    }
}

struct FixedReplyModel(&'static str);

#[async_trait]
impl LanguageModel for FixedReplyModel {
    async fn complete(&self, _request: &CompletionRequest) -> Result<String, LlmError> {
        Ok(self.0.to_string())
    }

    fn model_name(&self) -> &str {
        "fixed"
    }
}

struct ConfidentReranker;

#[async_trait]
impl Reranker for ConfidentReranker {
    async fn score(&self, _query: &str, candidates: &[String]) -> anyhow::Result<Vec<f32>> {
        Ok(candidates.iter().map(|_| 4.0).collect())
    }
}

fn reviews() -> Vec<ReviewRecord> {
    vec![
        ReviewRecord::new(
            0,
            "My package arrived a week late and the delivery driver never called, a real problem",
            Sentiment::Negative,
            Some(1.0),
        ),
        ReviewRecord::new(1, "Love the prices and the fast checkout", Sentiment::Positive, Some(5.0)),
        ReviewRecord::new(2, "The app works, nothing special to report", Sentiment::Neutral, Some(3.0)),
    ]
}

async fn indexed() -> Arc<dyn VectorIndex> {
    let index = InMemoryIndex::new(Arc::new(HashingEmbeddings::default()));
    let documents = review_router::ReviewChunker::default().chunk_records(&reviews());
    index.index(documents).await.unwrap();
    Arc::new(index)
}

#[tokio::test]
async fn ingest_then_query_returns_raw_context() {
    let assistant = ReviewAssistant::builder().build().unwrap();
    assert_eq!(assistant.ingest(&reviews()).await.unwrap(), 3);

    let query = RagQuery::new("late delivery problem")
        .top_k(2)
        .reranking(false)
        .synthesize(false);
    let result = assistant.rag_query(&query).await;

    assert!(result.sources.len() <= 2);
    assert_eq!(result.sources[0].document.metadata.sentiment, Sentiment::Negative);
    assert_eq!(result.confidence, 0.5);
    assert_eq!(result.answer, RAW_CONTEXT_ANSWER);
    assert_eq!(result.query_variants, vec!["late delivery problem".to_string()]);
}

#[tokio::test]
async fn late_delivery_question_finds_the_complaint() {
    let assistant = ReviewAssistant::builder().build().unwrap();
    let fixture = vec![
        ReviewRecord::new(0, "Fast shipping, loved it!", Sentiment::Positive, None),
        ReviewRecord::new(
            1,
            "Package arrived 2 weeks late and support never replied",
            Sentiment::Negative,
            None,
        ),
        ReviewRecord::new(2, "It was okay I guess", Sentiment::Neutral, None),
    ];
    assert_eq!(assistant.ingest(&fixture).await.unwrap(), 3);

    let query = RagQuery::new("late delivery problem")
        .top_k(2)
        .reranking(false)
        .synthesize(false);
    let result = assistant.rag_query(&query).await;

    assert_eq!(result.sources.len(), 2);
    assert_eq!(result.sources[0].document.metadata.sentiment, Sentiment::Negative);
    assert_eq!(
        result.sources[0].content(),
        "Package arrived 2 weeks late and support never replied"
    );
    assert_eq!(result.confidence, 0.5);
    assert_eq!(result.answer, RAW_CONTEXT_ANSWER);
    assert!(!result.fallback);
}

#[tokio::test]
async fn router_scenarios_without_model() {
    let supervisor = Supervisor::new(None);
    let cases = [
        ("Draw a bar chart of ratings", Worker::Analyst),
        ("Find reviews about battery life", Worker::Rag),
        ("hi there", Worker::Chat),
        ("What's our SWOT?", Worker::Insight),
    ];
    for (utterance, expected) in cases {
        let decision = supervisor.route(utterance).await;
        assert_eq!(decision.worker, expected, "{}", utterance);
        assert!(!decision.used_model());
    }
}

#[tokio::test]
async fn identical_variants_deduplicate() {
    let pipeline = RagPipeline::new(indexed().await);

    let once = pipeline
        .multi_query_search(&["late delivery".to_string()], 3, None)
        .await;
    let twice = pipeline
        .multi_query_search(&["late delivery".to_string(), "late delivery".to_string()], 3, None)
        .await;

    assert_eq!(once.len(), twice.len());
    let ids: HashSet<_> = twice.iter().map(|r| r.document.id.clone()).collect();
    assert_eq!(ids.len(), twice.len());
}

#[tokio::test]
async fn overloaded_model_degrades_to_raw_context() {
    let model = Arc::new(OverloadedModel {
        calls: AtomicUsize::new(0),
    });
    let llm: Arc<dyn LanguageModel> = model.clone();
    let synthesizer = AnswerSynthesizer::new(Some(llm))
        .with_retry(RetryPolicy::exponential(3, Duration::from_millis(1), 2));
    let pipeline = RagPipeline::new(indexed().await)
        .with_reranker(Arc::new(ConfidentReranker))
        .with_synthesizer(synthesizer);

    let result = pipeline
        .query(&RagQuery::new("late delivery problem").top_k(1))
        .await;

    assert!(result.confidence > 0.9);
    assert!(result.answer.starts_with("Model is currently overloaded."));
    assert!(result.answer.contains("delivery driver never called"));
    assert!(result.fallback);
    assert_eq!(model.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn skip_rate_accounting() {
    let llm: Arc<dyn LanguageModel> = Arc::new(FixedReplyModel(
        r#"{"main_issue": "Delivery", "severity": "Low", "tags": ["Late Delivery"], "summary": "Late."}"#,
    ));
    let summarizer = SmartSummarizer::new(Gatekeeper::default(), Some(llm));

    let long_positive = vec!["nice"; 40].join(" ");
    let batch = vec![
        ReviewRecord::new(0, "Great", Sentiment::Positive, None),
        ReviewRecord::new(1, "Fine, quick and easy", Sentiment::Neutral, None),
        ReviewRecord::new(2, &long_positive, Sentiment::Positive, None),
        ReviewRecord::new(3, "Package never showed up", Sentiment::Negative, None),
        ReviewRecord::new(4, "Charged twice, support ignored me", Sentiment::Negative, None),
    ];
    let results = summarizer.analyze_batch(&batch).await;
    assert_eq!(results.len(), 5);

    let stats = summarizer.stats();
    let (k, s) = (5.0, 3.0);
    assert_eq!(stats.total, 5);
    assert_eq!(stats.skipped(), 3);
    assert!((stats.skip_rate() - s / k).abs() < 1e-12);
    assert!((stats.llm_call_rate() - (k - s) / k).abs() < 1e-12);
}

#[test]
fn negative_reviews_of_any_length_are_analyzed() {
    let gatekeeper = Gatekeeper::default();
    let short = gatekeeper.check("Worst service ever", Sentiment::Negative);
    let long = gatekeeper.check(&vec!["awful"; 200].join(" "), Sentiment::Negative);

    assert_eq!(short.category, ReviewCategory::AnalyzeNegative);
    assert_eq!(long.category, ReviewCategory::AnalyzeNegative);
    assert!(short.should_call_llm && long.should_call_llm);
}
