use serde::{Deserialize, Serialize};

use crate::types::{Document, DocumentMetadata, Sentiment};

/// One row of an uploaded review dataset, already labelled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub text: String,
    pub sentiment: Sentiment,
    #[serde(default)]
    pub rating: Option<f32>,
    /// Position in the source dataset.
    pub row: usize,
}

impl ReviewRecord {
    pub fn new(row: usize, text: impl Into<String>, sentiment: Sentiment, rating: Option<f32>) -> Self {
        Self {
            text: text.into(),
            sentiment,
            rating,
            row,
        }
    }
}

/// Splits reviews into fixed-size character windows.
///
/// Reviews up to `chunk_size` characters become a single document. Longer
/// ones are cut every `chunk_size` characters with no overlap; windows are
/// counted in `char`s so multi-byte text is never split mid-character.
pub struct ReviewChunker {
    chunk_size: usize,
}

impl ReviewChunker {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn split<'a>(&self, text: &'a str) -> Vec<&'a str> {
        if text.chars().count() <= self.chunk_size {
            return vec![text];
        }

        let mut windows = Vec::new();
        let mut start = 0;
        let mut chars_in_window = 0;
        for (offset, _) in text.char_indices() {
            if chars_in_window == self.chunk_size {
                windows.push(&text[start..offset]);
                start = offset;
                chars_in_window = 0;
            }
            chars_in_window += 1;
        }
        if start < text.len() {
            windows.push(&text[start..]);
        }
        windows
    }

    /// Documents for one record, ids `row_{row}_chunk_{i}`. Blank reviews
    /// produce nothing.
    pub fn chunk_record(&self, record: &ReviewRecord) -> Vec<Document> {
        if record.text.trim().is_empty() {
            return Vec::new();
        }

        let windows = self.split(&record.text);
        let total_chunks = windows.len();
        windows
            .into_iter()
            .enumerate()
            .map(|(chunk_index, window)| Document {
                id: format!("row_{}_chunk_{}", record.row, chunk_index),
                content: window.to_string(),
                metadata: DocumentMetadata {
                    sentiment: record.sentiment,
                    rating: record.rating,
                    chunk_index,
                    total_chunks,
                    row_index: record.row,
                },
            })
            .collect()
    }

    pub fn chunk_records(&self, records: &[ReviewRecord]) -> Vec<Document> {
        let documents: Vec<Document> = records.iter().flat_map(|r| self.chunk_record(r)).collect();
        tracing::debug!(
            rows = records.len(),
            chunks = documents.len(),
            chunk_size = self.chunk_size,
            "Chunked review records"
        );
        documents
    }
}

impl Default for ReviewChunker {
    fn default() -> Self {
        Self::new(500)
    }
}
