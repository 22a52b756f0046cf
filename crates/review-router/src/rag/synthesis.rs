use std::sync::Arc;

use crate::error::LlmError;
use crate::llm::{CompletionRequest, LanguageModel, RetryPolicy};
use crate::types::SearchResult;

pub const DEFAULT_MAX_CONTEXT_CHARS: usize = 3000;
pub const DEFAULT_SYNTHESIS_MAX_TOKENS: usize = 500;

const OVERLOADED_NOTE: &str = "Model is currently overloaded. Here's the raw information found:";
const FAILED_NOTE: &str = "The model could not answer this request. Here's the raw information found:";
const NO_MODEL_NOTE: &str = "No language model is configured. Here's the raw information found:";

/// Sources rendered as numbered reviews with their labels, cut to
/// `max_chars` characters.
pub fn build_context(results: &[SearchResult], max_chars: usize) -> String {
    let context = results
        .iter()
        .enumerate()
        .map(|(i, r)| {
            let meta = &r.document.metadata;
            format!(
                "[Review {}] (Sentiment: {}, Rating: {})\n{}",
                i + 1,
                meta.sentiment,
                meta.rating_label(),
                r.content()
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    match context.char_indices().nth(max_chars) {
        Some((cut, _)) => context[..cut].to_string(),
        None => context,
    }
}

fn build_answer_prompt(question: &str, context: &str) -> String {
    format!(
        "Answer the question based strictly on the reviews below.\n\n\
         QUESTION: {}\n\n\
         REVIEWS:\n{}\n\n\
         ANSWER (Concise, cite examples):",
        question, context
    )
}

/// What [`AnswerSynthesizer::synthesize`] produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Synthesis {
    pub answer: String,
    /// The model gave no answer; `answer` is raw context behind a note.
    pub fallback: bool,
}

impl Synthesis {
    fn answered(answer: String) -> Self {
        Self { answer, fallback: false }
    }

    fn raw_context(note: &str, context: &str) -> Self {
        Self {
            answer: format!("{}\n\n{}", note, context),
            fallback: true,
        }
    }
}

/// Grounded answer generation with bounded retries.
///
/// Never fails: when the model is missing, keeps failing, or rejects the
/// request, the answer is the raw context behind an explanatory note.
pub struct AnswerSynthesizer {
    llm: Option<Arc<dyn LanguageModel>>,
    retry: RetryPolicy,
    max_context_chars: usize,
    max_tokens: usize,
}

impl AnswerSynthesizer {
    pub fn new(llm: Option<Arc<dyn LanguageModel>>) -> Self {
        Self {
            llm,
            retry: RetryPolicy::default(),
            max_context_chars: DEFAULT_MAX_CONTEXT_CHARS,
            max_tokens: DEFAULT_SYNTHESIS_MAX_TOKENS,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_max_context_chars(mut self, max_context_chars: usize) -> Self {
        self.max_context_chars = max_context_chars;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub async fn synthesize(&self, question: &str, results: &[SearchResult]) -> Synthesis {
        let context = build_context(results, self.max_context_chars);

        let Some(llm) = &self.llm else {
            return Synthesis::raw_context(NO_MODEL_NOTE, &context);
        };

        let request = CompletionRequest::prompt(build_answer_prompt(question, &context), self.max_tokens);
        let outcome = self
            .retry
            .run("synthesis", LlmError::is_transient, || llm.complete(&request))
            .await;

        match outcome {
            Ok(answer) => Synthesis::answered(answer.trim().to_string()),
            Err(e) if e.is_transient() => {
                tracing::error!(
                    error = %e,
                    attempts = self.retry.max_attempts(),
                    "Synthesis retries exhausted, returning raw context"
                );
                Synthesis::raw_context(OVERLOADED_NOTE, &context)
            }
            Err(e) => {
                tracing::error!(error = %e, "Synthesis failed, returning raw context");
                Synthesis::raw_context(FAILED_NOTE, &context)
            }
        }
    }
}
