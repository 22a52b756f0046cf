use std::sync::Arc;

use crate::llm::{CompletionRequest, LanguageModel};

pub const DEFAULT_EXPANSION_VARIANTS: usize = 2;
pub const DEFAULT_EXPANSION_MAX_TOKENS: usize = 200;

/// Asks the language model for alternative phrasings of a search question.
pub struct QueryExpander {
    llm: Arc<dyn LanguageModel>,
    variants: usize,
    max_tokens: usize,
}

fn build_expansion_prompt(question: &str, variants: usize) -> String {
    format!(
        "Generate {} alternative search queries for: \"{}\".\n\
         Focus on synonyms related to Amazon e-commerce context (delivery, service, refund, Prime).\n\
         Return ONLY the queries, one per line, no numbering.",
        variants, question
    )
}

/// One query per non-empty line. List markers and wrapping quotes that
/// models add despite being told not to are stripped.
fn parse_variants(reply: &str, question: &str, limit: usize) -> Vec<String> {
    let original = question.trim().to_lowercase();
    let mut variants: Vec<String> = Vec::new();

    for line in reply.lines() {
        let cleaned = line
            .trim()
            .trim_start_matches(|c: char| c.is_ascii_digit() || matches!(c, '.' | ')' | '-' | '*'))
            .trim()
            .trim_matches('"')
            .trim();
        if cleaned.is_empty() || cleaned.to_lowercase() == original {
            continue;
        }
        if variants.iter().any(|v| v.eq_ignore_ascii_case(cleaned)) {
            continue;
        }
        variants.push(cleaned.to_string());
        if variants.len() == limit {
            break;
        }
    }

    variants
}

impl QueryExpander {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self {
            llm,
            variants: DEFAULT_EXPANSION_VARIANTS,
            max_tokens: DEFAULT_EXPANSION_MAX_TOKENS,
        }
    }

    pub fn with_variants(mut self, variants: usize) -> Self {
        self.variants = variants;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// The original question followed by up to `variants` alternatives.
    /// Any failure yields just the original question.
    pub async fn expand(&self, question: &str) -> Vec<String> {
        let mut queries = vec![question.to_string()];
        if self.variants == 0 {
            return queries;
        }

        let request = CompletionRequest::prompt(
            build_expansion_prompt(question, self.variants),
            self.max_tokens,
        );
        match self.llm.complete(&request).await {
            Ok(reply) => {
                let extra = parse_variants(&reply, question, self.variants);
                tracing::debug!(variants = ?extra, "Query expanded");
                queries.extend(extra);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Query expansion failed, using original query only");
            }
        }
        queries
    }
}
