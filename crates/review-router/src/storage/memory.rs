//! In-memory [`VectorIndex`].
//!
//! Vectors live in a `Vec` behind a `parking_lot::RwLock`; search is
//! brute-force cosine similarity. Rebuilds embed the new corpus before taking
//! the write lock, so searches never wait on the embedder and never see a
//! partially built index.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use parking_lot::RwLock;

use super::VectorIndex;
use crate::embeddings::{cosine_similarity, EmbeddingModel};
use crate::types::{Document, MetadataFilter, ScoredDocument};

struct Entry {
    document: Document,
    vector: Vec<f32>,
}

pub struct InMemoryIndex {
    embedder: Arc<dyn EmbeddingModel>,
    entries: RwLock<Arc<Vec<Entry>>>,
    /// Serialises concurrent rebuilds.
    rebuild: tokio::sync::Mutex<()>,
}

impl InMemoryIndex {
    pub fn new(embedder: Arc<dyn EmbeddingModel>) -> Self {
        Self {
            embedder,
            entries: RwLock::new(Arc::new(Vec::new())),
            rebuild: tokio::sync::Mutex::new(()),
        }
    }

    pub fn embedder(&self) -> &Arc<dyn EmbeddingModel> {
        &self.embedder
    }

    fn snapshot(&self) -> Arc<Vec<Entry>> {
        self.entries.read().clone()
    }
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    async fn index(&self, documents: Vec<Document>) -> Result<usize> {
        let _guard = self.rebuild.lock().await;

        let texts: Vec<String> = documents.iter().map(|d| d.content.clone()).collect();
        let vectors = self
            .embedder
            .embed_documents(&texts)
            .await
            .context("failed to embed documents for indexing")?;

        if vectors.len() != documents.len() {
            anyhow::bail!(
                "embedder returned {} vectors for {} documents",
                vectors.len(),
                documents.len()
            );
        }

        let entries: Vec<Entry> = documents
            .into_iter()
            .zip(vectors)
            .map(|(document, vector)| Entry { document, vector })
            .collect();
        let count = entries.len();

        *self.entries.write() = Arc::new(entries);
        tracing::info!(documents = count, "Vector index rebuilt");
        Ok(count)
    }

    async fn similarity_search(
        &self,
        query: &str,
        k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<ScoredDocument>> {
        let entries = self.snapshot();
        if k == 0 || entries.is_empty() {
            return Ok(Vec::new());
        }

        let query_vector = self
            .embedder
            .embed_query(query)
            .await
            .context("failed to embed query")?;

        let mut scored: Vec<ScoredDocument> = entries
            .iter()
            .filter(|e| filter.map_or(true, |f| f.matches(&e.document.metadata)))
            .map(|e| ScoredDocument {
                document: e.document.clone(),
                score: cosine_similarity(&query_vector, &e.vector),
            })
            .collect();

        // Stable sort keeps insertion order among equal scores.
        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(k);

        tracing::debug!(
            k = k,
            hits = scored.len(),
            filtered = filter.is_some(),
            "Similarity search"
        );
        Ok(scored)
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.snapshot().len())
    }

    async fn clear(&self) -> Result<()> {
        let _guard = self.rebuild.lock().await;
        *self.entries.write() = Arc::new(Vec::new());
        Ok(())
    }
}
