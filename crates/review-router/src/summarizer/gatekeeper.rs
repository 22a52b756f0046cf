//! Per-review decision of whether a language-model call is worth paying for.

use serde::{Deserialize, Serialize};

use crate::config::GatekeeperConfig;
use crate::text::{word_count, KeywordSet};
use crate::types::Sentiment;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReviewCategory {
    /// Already summary-length.
    #[serde(rename = "skip_short")]
    SkipTooShort,
    /// Positive or neutral with nothing to dig into.
    #[serde(rename = "skip_neutral")]
    SkipNeutral,
    /// Extract the root cause.
    #[serde(rename = "negative")]
    AnalyzeNegative,
    /// Separate pros from cons.
    #[serde(rename = "mixed")]
    AnalyzeMixed,
}

impl ReviewCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SkipTooShort => "skip_short",
            Self::SkipNeutral => "skip_neutral",
            Self::AnalyzeNegative => "negative",
            Self::AnalyzeMixed => "mixed",
        }
    }

    pub fn needs_llm(&self) -> bool {
        matches!(self, Self::AnalyzeNegative | Self::AnalyzeMixed)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GatekeeperResult {
    pub category: ReviewCategory,
    pub should_call_llm: bool,
    pub reason: &'static str,
    pub word_count: usize,
    pub sentiment: Sentiment,
}

pub struct Gatekeeper {
    min_words: usize,
    mixed_min_words: usize,
    keyword_min_words: usize,
    contrast_words: KeywordSet,
    issue_keywords: KeywordSet,
}

impl Gatekeeper {
    pub fn new(config: &GatekeeperConfig) -> Self {
        Self {
            min_words: config.min_words,
            mixed_min_words: config.mixed_min_words,
            keyword_min_words: config.keyword_min_words,
            contrast_words: KeywordSet::whole_words(&config.contrast_words),
            issue_keywords: KeywordSet::inflected(&config.issue_keywords),
        }
    }

    pub fn has_issue_keywords(&self, text: &str) -> bool {
        self.issue_keywords.matches_any(text)
    }

    fn is_mixed(&self, text: &str, sentiment: Sentiment, words: usize) -> bool {
        let is_long = words > self.mixed_min_words;
        let has_contrast = self.contrast_words.matches_any(text);
        let is_neutral = sentiment == Sentiment::Neutral;

        (has_contrast && is_long) || (is_neutral && is_long && self.has_issue_keywords(text))
    }

    /// Rules, first match wins:
    ///
    /// 1. negative sentiment, at any length
    /// 2. fewer than `min_words` words
    /// 3. long and contrasting, or long neutral with an issue keyword
    /// 4. an issue keyword in more than `keyword_min_words` words
    /// 5. everything else is skipped
    pub fn check(&self, text: &str, sentiment: Sentiment) -> GatekeeperResult {
        let words = word_count(text);
        let decide = |category: ReviewCategory, reason: &'static str| GatekeeperResult {
            category,
            should_call_llm: category.needs_llm(),
            reason,
            word_count: words,
            sentiment,
        };

        if sentiment == Sentiment::Negative {
            return decide(
                ReviewCategory::AnalyzeNegative,
                "Negative review - extract root cause",
            );
        }

        if words < self.min_words {
            return decide(
                ReviewCategory::SkipTooShort,
                "Review too short, already a summary",
            );
        }

        if self.is_mixed(text, sentiment, words) {
            return decide(
                ReviewCategory::AnalyzeMixed,
                "Mixed review - separate pros/cons",
            );
        }

        if words > self.keyword_min_words && self.has_issue_keywords(text) {
            return decide(
                ReviewCategory::AnalyzeMixed,
                "Contains issue keywords despite positive sentiment",
            );
        }

        decide(
            ReviewCategory::SkipNeutral,
            "Positive/Neutral review without issues",
        )
    }
}

impl Default for Gatekeeper {
    fn default() -> Self {
        Self::new(&GatekeeperConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filler(n: usize) -> String {
        vec!["word"; n].join(" ")
    }

    #[test]
    fn test_negative_preempts_length() {
        let gk = Gatekeeper::default();
        let short = gk.check("Never again", Sentiment::Negative);
        assert_eq!(short.category, ReviewCategory::AnalyzeNegative);
        assert!(short.should_call_llm);
        assert_eq!(short.word_count, 2);

        let long = gk.check(&filler(200), Sentiment::Negative);
        assert_eq!(long.category, ReviewCategory::AnalyzeNegative);
    }

    #[test]
    fn test_short_positive_skipped() {
        let result = Gatekeeper::default().check("Great service, fast delivery", Sentiment::Positive);
        assert_eq!(result.category, ReviewCategory::SkipTooShort);
        assert!(!result.should_call_llm);
    }

    #[test]
    fn test_long_contrast_is_mixed() {
        let text = format!("{} but the driver was rude", filler(50));
        let result = Gatekeeper::default().check(&text, Sentiment::Positive);
        assert_eq!(result.category, ReviewCategory::AnalyzeMixed);
        assert_eq!(result.reason, "Mixed review - separate pros/cons");
    }

    #[test]
    fn test_long_neutral_with_issue_is_mixed() {
        let text = format!("{} refund", filler(55));
        let result = Gatekeeper::default().check(&text, Sentiment::Neutral);
        assert_eq!(result.category, ReviewCategory::AnalyzeMixed);
        assert_eq!(result.reason, "Mixed review - separate pros/cons");
    }

    #[test]
    fn test_issue_keyword_over_threshold() {
        let text = format!("{} the package was late", filler(30));
        let result = Gatekeeper::default().check(&text, Sentiment::Positive);
        assert_eq!(result.category, ReviewCategory::AnalyzeMixed);
        assert_eq!(result.reason, "Contains issue keywords despite positive sentiment");
    }

    #[test]
    fn test_issue_keyword_under_threshold_skipped() {
        let text = format!("{} late", filler(15));
        let result = Gatekeeper::default().check(&text, Sentiment::Positive);
        assert_eq!(result.category, ReviewCategory::SkipNeutral);
    }

    #[test]
    fn test_keyword_boundaries() {
        // "button" and "butter" must not count as the contrast word "but"
        let text = format!("{} button butter", filler(60));
        let result = Gatekeeper::default().check(&text, Sentiment::Positive);
        assert_eq!(result.category, ReviewCategory::SkipNeutral);
    }

    #[test]
    fn test_stem_keyword() {
        let text = format!("{} so frustrating", filler(30));
        let result = Gatekeeper::default().check(&text, Sentiment::Positive);
        assert_eq!(result.category, ReviewCategory::AnalyzeMixed);
    }

    #[test]
    fn test_category_serde_names() {
        assert_eq!(
            serde_json::to_string(&ReviewCategory::SkipTooShort).unwrap(),
            "\"skip_short\""
        );
        assert_eq!(ReviewCategory::AnalyzeMixed.as_str(), "mixed");
    }
}
