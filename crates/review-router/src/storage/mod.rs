pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::types::{Document, MetadataFilter, ScoredDocument};

pub use memory::InMemoryIndex;

/// Nearest-neighbour store over review chunks.
///
/// `index` replaces the whole corpus; readers observe either the previous
/// corpus or the new one, never a mix.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    async fn index(&self, documents: Vec<Document>) -> Result<usize>;

    /// Up to `k` documents ordered by descending similarity to `query`.
    async fn similarity_search(
        &self,
        query: &str,
        k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<ScoredDocument>>;

    async fn count(&self) -> Result<usize>;

    async fn clear(&self) -> Result<()>;
}
