use serde::{Deserialize, Serialize};

use super::Worker;
use crate::text::KeywordSet;

/// Keyword rules, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternRule {
    Greeting,
    Chart,
    Numeric,
    Search,
    Sentiment,
    Summary,
    Insight,
}

impl PatternRule {
    pub fn worker(&self) -> Worker {
        match self {
            Self::Greeting => Worker::Chat,
            Self::Chart | Self::Numeric => Worker::Analyst,
            Self::Search => Worker::Rag,
            Self::Sentiment => Worker::Sentiment,
            Self::Summary => Worker::Summarize,
            Self::Insight => Worker::Insight,
        }
    }
}

const GREETING: &[&str] = &[
    "hello", "hi", "hey", "thanks", "thank you", "who are you", "what are you",
    "introduce yourself", "what can you do", "help me", "help", "guide",
    "how to use", "tutorial",
];

const CHART_TYPES: &[&str] = &[
    "treemap", "treemaps", "pie chart", "pie charts", "bar chart", "bar charts",
    "line chart", "line charts", "area chart", "area charts", "radar chart",
    "scatter", "scatter plot", "histogram", "histograms", "heatmap", "visualize",
    "visualise", "visualization", "visualisation",
];

const CREATION_VERBS: &[&str] = &["draw", "create", "make", "generate", "build", "plot"];

const CHART_NOUNS: &[&str] = &[
    "chart", "charts", "graph", "graphs", "plot", "plots", "diagram", "diagrams",
    "radar", "treemap",
];

const NUMERIC: &[&str] = &[
    "how many", "count", "counts", "calculat*", "comput*", "average", "averages",
    "mean", "median", "percent", "percentage", "percentages", "statistics", "stats",
];

const SEARCH: &[&str] = &[
    "search", "find", "look for", "show reviews", "reviews about", "mention",
    "mentions", "mentioned", "mentioning", "talk about", "talks about",
    "say about", "says about",
];

const SENTIMENT: &[&str] = &[
    "analyze sentiment", "analyse sentiment", "sentiment distribution",
    "sentiment breakdown", "emotion", "emotions", "feeling", "feelings", "mood",
];

/// Any of these blocks the sentiment rule so chart requests about sentiment
/// never reach the sentiment worker.
const CHART_WORDS: &[&str] = &[
    "chart", "charts", "graph", "graphs", "plot", "plots", "draw", "treemap",
    "pie", "bar",
];

const SUMMARY: &[&str] = &[
    "summary", "summaries", "summariz*", "summaris*", "overview", "brief",
    "key points", "main points", "highlights",
];

const INSIGHT: &[&str] = &[
    "insight", "insights", "recommend", "recommendation", "recommendations",
    "suggest", "suggestion", "suggestions", "strategy", "strategic", "swot",
    "improve", "improvement", "improvements", "action", "actions",
];

/// Deterministic first stage of the router. Pure function of the text.
///
/// Greeting and chart vocabularies match whole words only ("hi" must not
/// fire inside "shipping"); the other rules match word prefixes so verb
/// forms like "searching" or "recommended" still hit.
#[derive(Debug, Clone)]
pub struct PatternRouter {
    greeting: KeywordSet,
    chart_types: KeywordSet,
    creation_verbs: KeywordSet,
    chart_nouns: KeywordSet,
    numeric: KeywordSet,
    search: KeywordSet,
    sentiment: KeywordSet,
    chart_words: KeywordSet,
    summary: KeywordSet,
    insight: KeywordSet,
}

impl PatternRouter {
    pub fn new() -> Self {
        Self {
            greeting: KeywordSet::whole_words(GREETING),
            chart_types: KeywordSet::whole_words(CHART_TYPES),
            creation_verbs: KeywordSet::whole_words(CREATION_VERBS),
            chart_nouns: KeywordSet::whole_words(CHART_NOUNS),
            numeric: KeywordSet::prefixes(NUMERIC),
            search: KeywordSet::prefixes(SEARCH),
            sentiment: KeywordSet::prefixes(SENTIMENT),
            chart_words: KeywordSet::whole_words(CHART_WORDS),
            summary: KeywordSet::prefixes(SUMMARY),
            insight: KeywordSet::prefixes(INSIGHT),
        }
    }

    fn is_chart_request(&self, text: &str) -> bool {
        self.chart_types.matches_any(text)
            || (self.creation_verbs.matches_any(text) && self.chart_nouns.matches_any(text))
    }

    /// First matching rule, or `None` when the message needs the model.
    pub fn classify(&self, utterance: &str) -> Option<PatternRule> {
        let text = utterance.to_lowercase();

        if self.greeting.matches_any(&text) {
            Some(PatternRule::Greeting)
        } else if self.is_chart_request(&text) {
            Some(PatternRule::Chart)
        } else if self.numeric.matches_any(&text) {
            Some(PatternRule::Numeric)
        } else if self.search.matches_any(&text) {
            Some(PatternRule::Search)
        } else if self.sentiment.matches_any(&text) && !self.chart_words.matches_any(&text) {
            Some(PatternRule::Sentiment)
        } else if self.summary.matches_any(&text) {
            Some(PatternRule::Summary)
        } else if self.insight.matches_any(&text) {
            Some(PatternRule::Insight)
        } else {
            None
        }
    }
}

impl Default for PatternRouter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(text: &str) -> Option<Worker> {
        PatternRouter::new().classify(text).map(|r| r.worker())
    }

    #[test]
    fn test_greetings() {
        assert_eq!(route("hi there"), Some(Worker::Chat));
        assert_eq!(route("What can you do?"), Some(Worker::Chat));
        assert_eq!(route("Thank you!"), Some(Worker::Chat));
    }

    #[test]
    fn test_short_keywords_do_not_match_inside_words() {
        // "hi" in "shipping", "count" in "account"
        assert_eq!(
            PatternRouter::new().classify("Find complaints about shipping"),
            Some(PatternRule::Search)
        );
        assert_eq!(route("my account was locked"), None);
    }

    #[test]
    fn test_chart_requests() {
        assert_eq!(route("Draw a bar chart of ratings"), Some(Worker::Analyst));
        assert_eq!(route("Create a graph of reviews per month"), Some(Worker::Analyst));
        assert_eq!(route("pie chart please"), Some(Worker::Analyst));
        assert_eq!(
            PatternRouter::new().classify("visualize the ratings"),
            Some(PatternRule::Chart)
        );
    }

    #[test]
    fn test_creation_verb_alone_is_not_a_chart() {
        assert_ne!(
            PatternRouter::new().classify("Make a summary of complaints"),
            Some(PatternRule::Chart)
        );
        assert_eq!(route("Make a summary of complaints"), Some(Worker::Summarize));
    }

    #[test]
    fn test_chart_beats_sentiment() {
        assert_eq!(
            route("Draw a pie chart of the sentiment distribution"),
            Some(Worker::Analyst)
        );
        assert_eq!(route("Show the sentiment distribution"), Some(Worker::Sentiment));
        // Chart word present but no chart request: sentiment is blocked.
        assert_ne!(route("sentiment breakdown as a bar"), Some(Worker::Sentiment));
    }

    #[test]
    fn test_numeric_before_search() {
        assert_eq!(route("How many reviews mention refunds?"), Some(Worker::Analyst));
        assert_eq!(route("What is the average rating"), Some(Worker::Analyst));
    }

    #[test]
    fn test_search_phrases() {
        assert_eq!(route("Find reviews about battery life"), Some(Worker::Rag));
        assert_eq!(route("What do customers say about Prime?"), Some(Worker::Rag));
    }

    #[test]
    fn test_summary_and_insight() {
        assert_eq!(route("Give me an overview"), Some(Worker::Summarize));
        assert_eq!(route("What's our SWOT?"), Some(Worker::Insight));
        assert_eq!(route("Recommend improvements to delivery"), Some(Worker::Insight));
    }

    #[test]
    fn test_inflected_verbs_match() {
        assert_eq!(route("I am searching for delivery complaints"), Some(Worker::Rag));
        assert_eq!(route("Summarizing the refund complaints please"), Some(Worker::Summarize));
        assert_eq!(route("Which fixes are recommended?"), Some(Worker::Insight));
        assert_eq!(route("Calculating the rating spread"), Some(Worker::Analyst));
    }

    #[test]
    fn test_unmatched_needs_model() {
        assert_eq!(route("Why are people upset about Prime?"), None);
    }

    #[test]
    fn test_deterministic() {
        let router = PatternRouter::new();
        let text = "Draw a bar chart of ratings";
        assert_eq!(router.classify(text), router.classify(text));
    }
}
