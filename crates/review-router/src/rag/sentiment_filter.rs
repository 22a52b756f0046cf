use crate::text::KeywordSet;
use crate::types::Sentiment;

const NEGATIVE_CUES: &[&str] = &[
    "negative", "bad", "complaint", "complaints", "problem", "problems", "issue",
    "issues", "angry", "terrible", "worst", "hate", "disappointed",
];

const POSITIVE_CUES: &[&str] = &[
    "positive", "good", "great", "love", "excellent", "best", "amazing",
    "wonderful", "happy", "satisfied",
];

/// Infers which reviews a question is about from its wording.
///
/// Complaint words select negative reviews and win over praise words;
/// otherwise praise words select positive reviews.
#[derive(Debug, Clone)]
pub struct SentimentFilterDetector {
    negative: KeywordSet,
    positive: KeywordSet,
}

impl SentimentFilterDetector {
    pub fn new() -> Self {
        Self {
            negative: KeywordSet::whole_words(NEGATIVE_CUES),
            positive: KeywordSet::whole_words(POSITIVE_CUES),
        }
    }

    pub fn detect(&self, question: &str) -> Option<Sentiment> {
        if self.negative.matches_any(question) {
            Some(Sentiment::Negative)
        } else if self.positive.matches_any(question) {
            Some(Sentiment::Positive)
        } else {
            None
        }
    }
}

impl Default for SentimentFilterDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect() {
        let d = SentimentFilterDetector::new();
        assert_eq!(d.detect("Show complaints about refunds"), Some(Sentiment::Negative));
        assert_eq!(d.detect("What do people love about Prime?"), Some(Sentiment::Positive));
        assert_eq!(d.detect("Reviews about delivery"), None);
    }

    #[test]
    fn test_negative_wins() {
        let d = SentimentFilterDetector::new();
        assert_eq!(d.detect("good or bad experiences"), Some(Sentiment::Negative));
    }

    #[test]
    fn test_whole_words_only() {
        // "badge", "goodness"
        assert_eq!(SentimentFilterDetector::new().detect("badge goodness"), None);
    }
}
