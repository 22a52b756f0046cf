use serde::{Deserialize, Serialize};
use std::fmt;

/// Sentiment label attached to a review by the upstream labeler.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
    Unknown,
}

impl Sentiment {
    /// Lenient parse: anything other than the three known labels is `Unknown`.
    pub fn parse(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "positive" | "pos" => Self::Positive,
            "negative" | "neg" => Self::Negative,
            "neutral" => Self::Neutral,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
            Self::Neutral => "neutral",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentMetadata {
    pub sentiment: Sentiment,
    pub rating: Option<f32>,
    pub chunk_index: usize,
    pub total_chunks: usize,
    /// Row of the uploaded dataset this chunk came from.
    pub row_index: usize,
}

impl DocumentMetadata {
    pub fn rating_label(&self) -> String {
        match self.rating {
            Some(r) if r.fract() == 0.0 => format!("{:.0}", r),
            Some(r) => format!("{}", r),
            None => "N/A".to_string(),
        }
    }
}

/// An indexed text chunk. Immutable once indexed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    pub id: String,
    pub content: String,
    pub metadata: DocumentMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct MetadataFilter {
    pub sentiment: Option<Sentiment>,
}

impl MetadataFilter {
    pub fn sentiment(sentiment: Sentiment) -> Self {
        Self { sentiment: Some(sentiment) }
    }

    pub fn matches(&self, metadata: &DocumentMetadata) -> bool {
        match self.sentiment {
            Some(s) => metadata.sentiment == s,
            None => true,
        }
    }
}

/// A document returned by nearest-neighbour search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredDocument {
    pub document: Document,
    /// Cosine similarity to the query.
    pub score: f32,
}

/// A retrieval hit flowing through the RAG pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub document: Document,
    pub similarity: f32,
    /// Cross-encoder logit, present only after reranking.
    pub rerank_score: Option<f32>,
    /// The query variant that first retrieved this content.
    pub matched_query: String,
}

impl SearchResult {
    pub fn content(&self) -> &str {
        &self.document.content
    }
}

/// Outcome of one RAG query. Never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagResult {
    pub answer: String,
    pub sources: Vec<SearchResult>,
    pub query_variants: Vec<String>,
    /// In `[0, 1]`.
    pub confidence: f64,
    /// The answer is a stand-in (no data, hedge, raw context after a model
    /// failure, or unscored sources after a reranker failure). Not cached.
    #[serde(default)]
    pub fallback: bool,
}

impl RagResult {
    /// Render for a chat surface: answer, confidence, top three sources.
    pub fn to_markdown(&self) -> String {
        let mut parts = vec![
            self.answer.clone(),
            format!("\n_(Confidence: {:.0}%)_", self.confidence * 100.0),
            "\n---".to_string(),
            "\n**Sources:**".to_string(),
        ];

        if self.sources.is_empty() {
            parts.push("- No relevant sources found.".to_string());
        } else {
            for (i, src) in self.sources.iter().take(3).enumerate() {
                let meta = &src.document.metadata;
                let snippet: String = src
                    .content()
                    .chars()
                    .take(150)
                    .collect::<String>()
                    .replace('\n', " ");
                parts.push(format!(
                    "\n{}. **[{} | Rating: {}]** (relevance: {:.2})",
                    i + 1,
                    meta.sentiment.as_str().to_uppercase(),
                    meta.rating_label(),
                    src.rerank_score.unwrap_or(0.0)
                ));
                parts.push(format!("   {}...", snippet));
            }
        }

        parts.join("\n")
    }
}
