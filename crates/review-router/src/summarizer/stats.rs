use serde::{Deserialize, Serialize};

use super::gatekeeper::ReviewCategory;

/// Running counters for one summarizer. Only ever incremented.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub total: u64,
    pub skipped_short: u64,
    pub skipped_neutral: u64,
    pub analyzed_negative: u64,
    pub analyzed_mixed: u64,
    /// Reviews sent to the model; retries of the same review are not
    /// counted again, so this never exceeds `total`.
    pub llm_calls: u64,
}

impl Stats {
    pub(crate) fn record(&mut self, category: ReviewCategory) {
        self.total += 1;
        match category {
            ReviewCategory::SkipTooShort => self.skipped_short += 1,
            ReviewCategory::SkipNeutral => self.skipped_neutral += 1,
            ReviewCategory::AnalyzeNegative => self.analyzed_negative += 1,
            ReviewCategory::AnalyzeMixed => self.analyzed_mixed += 1,
        }
    }

    pub(crate) fn record_llm_call(&mut self) {
        self.llm_calls += 1;
    }

    pub fn skipped(&self) -> u64 {
        self.skipped_short + self.skipped_neutral
    }

    /// Fraction of reviews answered without a model call; 0 when empty.
    pub fn skip_rate(&self) -> f64 {
        ratio(self.skipped(), self.total)
    }

    pub fn llm_call_rate(&self) -> f64 {
        ratio(self.llm_calls, self.total)
    }

    /// `"12.5%"`
    pub fn skip_rate_percent(&self) -> String {
        format!("{:.1}%", self.skip_rate() * 100.0)
    }

    pub fn llm_call_rate_percent(&self) -> String {
        format!("{:.1}%", self.llm_call_rate() * 100.0)
    }
}

fn ratio(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64
    }
}
