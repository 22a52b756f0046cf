//! Gatekept per-review analysis.
//!
//! Every review gets a keyword topic. Only reviews the [`Gatekeeper`]
//! flags (negative, or long and mixed) cost a language-model call; the rest
//! are answered locally.

pub mod analysis;
pub mod gatekeeper;
pub mod stats;
pub mod topic;

pub use analysis::{AnalysisDetail, AnalysisResult, IssueCategory, Severity};
pub use gatekeeper::{Gatekeeper, GatekeeperResult, ReviewCategory};
pub use stats::Stats;
pub use topic::{TopicClassifier, GENERAL_TOPIC};

use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::AssistantConfig;
use crate::error::LlmError;
use crate::llm::{ChatMessage, CompletionRequest, LanguageModel, RetryPolicy};
use crate::processing::ReviewRecord;
use crate::types::Sentiment;
use analysis::{
    parse_mixed_reply, parse_negative_reply, render_prompt, JSON_SYSTEM_PROMPT, MIXED_PROMPT,
    NEGATIVE_PROMPT,
};

pub const DEFAULT_ANALYSIS_MAX_TOKENS: usize = 300;

pub struct SmartSummarizer {
    gatekeeper: Gatekeeper,
    topics: TopicClassifier,
    llm: Option<Arc<dyn LanguageModel>>,
    max_tokens: usize,
    retry: RetryPolicy,
    stats: Mutex<Stats>,
}

impl SmartSummarizer {
    pub fn new(gatekeeper: Gatekeeper, llm: Option<Arc<dyn LanguageModel>>) -> Self {
        Self {
            gatekeeper,
            topics: TopicClassifier::new(),
            llm,
            max_tokens: DEFAULT_ANALYSIS_MAX_TOKENS,
            retry: RetryPolicy::none(),
            stats: Mutex::new(Stats::default()),
        }
    }

    pub fn from_config(llm: Option<Arc<dyn LanguageModel>>, config: &AssistantConfig) -> Self {
        Self::new(Gatekeeper::new(&config.gatekeeper), llm)
            .with_max_tokens(config.llm.analysis_max_tokens)
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Analysis calls are single-shot unless a policy is set here.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn gatekeeper(&self) -> &Gatekeeper {
        &self.gatekeeper
    }

    pub fn topics(&self) -> &TopicClassifier {
        &self.topics
    }

    /// Snapshot of the running counters.
    pub fn stats(&self) -> Stats {
        *self.stats.lock()
    }

    /// Never fails: model problems surface as
    /// [`AnalysisDetail::CallFailed`] or [`AnalysisDetail::ParseFailure`].
    pub async fn analyze_review(&self, text: &str, sentiment: Sentiment) -> AnalysisResult {
        let gate = self.gatekeeper.check(text, sentiment);
        let (topic, topic_confidence) = self.topics.classify(text);
        self.stats.lock().record(gate.category);

        tracing::debug!(
            category = gate.category.as_str(),
            words = gate.word_count,
            topic = %topic,
            reason = gate.reason,
            "Gatekeeper decision"
        );

        let detail = if gate.should_call_llm {
            self.analyze_with_model(text, gate.category).await
        } else {
            let summary = (gate.category == ReviewCategory::SkipTooShort).then(|| text.to_string());
            let tags = if sentiment == Sentiment::Positive && topic != GENERAL_TOPIC {
                vec![format!("Good {}", topic)]
            } else {
                Vec::new()
            };
            AnalysisDetail::Skipped { summary, tags }
        };

        AnalysisResult {
            original_text: text.to_string(),
            category: gate.category,
            topic,
            topic_confidence,
            detail,
        }
    }

    async fn analyze_with_model(&self, text: &str, category: ReviewCategory) -> AnalysisDetail {
        let Some(llm) = &self.llm else {
            tracing::warn!(category = category.as_str(), "No language model configured for review analysis");
            return AnalysisDetail::CallFailed {
                reason: "language model not configured".to_string(),
            };
        };

        let template = match category {
            ReviewCategory::AnalyzeNegative => NEGATIVE_PROMPT,
            _ => MIXED_PROMPT,
        };
        let request = CompletionRequest::deterministic(
            vec![
                ChatMessage::system(JSON_SYSTEM_PROMPT),
                ChatMessage::user(render_prompt(template, text)),
            ],
            self.max_tokens,
        );

        self.stats.lock().record_llm_call();
        let reply = self
            .retry
            .run("review_analysis", LlmError::is_transient, || llm.complete(&request))
            .await;

        let raw = match reply {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(category = category.as_str(), error = %e, "Review analysis call failed");
                return AnalysisDetail::CallFailed { reason: e.to_string() };
            }
        };

        let detail = match category {
            ReviewCategory::AnalyzeNegative => parse_negative_reply(&raw),
            _ => parse_mixed_reply(&raw),
        };
        if let AnalysisDetail::ParseFailure { error, .. } = &detail {
            tracing::warn!(category = category.as_str(), error = %error, "Could not parse analysis reply");
        }
        detail
    }

    /// Reviews are analyzed one after another; a failed item does not stop
    /// the batch.
    pub async fn analyze_batch(&self, reviews: &[ReviewRecord]) -> Vec<AnalysisResult> {
        let mut results = Vec::with_capacity(reviews.len());
        for review in reviews {
            results.push(self.analyze_review(&review.text, review.sentiment).await);
        }
        let stats = self.stats();
        tracing::info!(
            reviews = reviews.len(),
            llm_calls = stats.llm_calls,
            skip_rate = %stats.skip_rate_percent(),
            "Batch analysis finished"
        );
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedModel;
    use std::time::Duration;

    const NEGATIVE_REPLY: &str = r#"{"main_issue": "Delivery", "issue_detail": "Never arrived",
        "severity": "Medium", "tags": ["Lost Package"], "summary": "Package lost."}"#;

    fn summarizer(model: &Arc<ScriptedModel>) -> SmartSummarizer {
        let llm: Arc<dyn LanguageModel> = model.clone();
        SmartSummarizer::new(Gatekeeper::default(), Some(llm))
    }

    #[tokio::test]
    async fn test_short_positive_skips_model() {
        let model = Arc::new(ScriptedModel::always(NEGATIVE_REPLY));
        let s = summarizer(&model);
        let result = s.analyze_review("Fast delivery, great driver", Sentiment::Positive).await;

        assert_eq!(result.category, ReviewCategory::SkipTooShort);
        assert_eq!(result.topic, "Delivery");
        assert_eq!(
            result.detail,
            AnalysisDetail::Skipped {
                summary: Some("Fast delivery, great driver".into()),
                tags: vec!["Good Delivery".into()],
            }
        );
        assert_eq!(model.call_count(), 0);
    }

    #[tokio::test]
    async fn test_short_negative_calls_model() {
        let model = Arc::new(ScriptedModel::always(NEGATIVE_REPLY));
        let s = summarizer(&model);
        let result = s.analyze_review("Never arrived", Sentiment::Negative).await;

        assert_eq!(result.category, ReviewCategory::AnalyzeNegative);
        assert!(matches!(
            result.detail,
            AnalysisDetail::Negative { main_issue: IssueCategory::Delivery, severity: Some(Severity::Medium), .. }
        ));
        assert_eq!(result.tags(), ["Lost Package".to_string()]);

        let requests = model.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].temperature, 0.0);
        assert_eq!(requests[0].max_tokens, 300);
        assert_eq!(requests[0].messages[0].content, JSON_SYSTEM_PROMPT);
        assert!(requests[0].messages[1].content.contains("Never arrived"));
    }

    #[tokio::test]
    async fn test_parse_failure_is_explicit() {
        let model = Arc::new(ScriptedModel::always("sorry, no JSON today"));
        let s = summarizer(&model);
        let result = s.analyze_review("Terrible", Sentiment::Negative).await;
        assert!(result.is_failure());
        assert!(matches!(result.detail, AnalysisDetail::ParseFailure { .. }));
    }

    #[tokio::test]
    async fn test_without_model() {
        let s = SmartSummarizer::new(Gatekeeper::default(), None);
        let result = s.analyze_review("Awful", Sentiment::Negative).await;
        assert!(matches!(result.detail, AnalysisDetail::CallFailed { .. }));
        assert_eq!(s.stats().llm_calls, 0);
        assert_eq!(s.stats().analyzed_negative, 1);
    }

    #[tokio::test]
    async fn test_retries_count_as_one_call() {
        let model = Arc::new(ScriptedModel::new(vec![
            Err(LlmError::RateLimited { body: String::new() }),
            Ok(NEGATIVE_REPLY.to_string()),
        ]));
        let s = summarizer(&model)
            .with_retry(RetryPolicy::exponential(3, Duration::from_millis(1), 1));
        let result = s.analyze_review("Lost my parcel", Sentiment::Negative).await;
        assert!(!result.is_failure());
        assert_eq!(model.call_count(), 2);
        assert_eq!(s.stats().llm_calls, 1);
        assert_eq!(s.stats().llm_call_rate(), 1.0);
    }

    #[tokio::test]
    async fn test_batch_stats() {
        let model = Arc::new(ScriptedModel::always(
            r#"{"pros": ["Quick"], "cons": ["Late once"], "tags": [], "summary": "Mostly fine."}"#,
        ));
        let s = summarizer(&model);
        let long_mixed = format!("{} but the driver was late", vec!["fine"; 50].join(" "));
        let reviews = vec![
            ReviewRecord::new(0, "Great", Sentiment::Positive, None),
            ReviewRecord::new(1, &long_mixed, Sentiment::Positive, None),
            ReviewRecord::new(2, &vec!["good"; 20].join(" "), Sentiment::Neutral, None),
            ReviewRecord::new(3, "Broken and late", Sentiment::Negative, None),
        ];

        let results = s.analyze_batch(&reviews).await;
        assert_eq!(results.len(), 4);
        assert_eq!(results[1].category, ReviewCategory::AnalyzeMixed);
        assert!(matches!(results[1].detail, AnalysisDetail::Mixed { .. }));
        assert_eq!(results[3].category, ReviewCategory::AnalyzeNegative);

        let stats = s.stats();
        assert_eq!(stats.total, 4);
        assert_eq!(stats.skipped_short, 1);
        assert_eq!(stats.skipped_neutral, 1);
        assert_eq!(stats.analyzed_mixed, 1);
        assert_eq!(stats.analyzed_negative, 1);
        assert_eq!(stats.llm_calls, 2);
        assert_eq!(stats.skip_rate(), 0.5);
    }
}
