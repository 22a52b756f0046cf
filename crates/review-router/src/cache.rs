//! LRU cache of RAG answers, keyed by [`RagQuery::cache_key`].

use std::num::NonZeroUsize;

use lru::LruCache;
use parking_lot::Mutex;

use crate::config::CacheConfig;
use crate::rag::RagQuery;
use crate::types::RagResult;

pub struct AnswerCache {
    /// `None` when caching is switched off.
    entries: Option<Mutex<LruCache<String, RagResult>>>,
}

impl AnswerCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: NonZeroUsize::new(capacity).map(|cap| Mutex::new(LruCache::new(cap))),
        }
    }

    pub fn disabled() -> Self {
        Self { entries: None }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        if config.enabled {
            Self::new(config.capacity)
        } else {
            Self::disabled()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.entries.is_some()
    }

    pub fn get(&self, query: &RagQuery) -> Option<RagResult> {
        let entries = self.entries.as_ref()?;
        let hit = entries.lock().get(&query.cache_key()).cloned();
        if hit.is_some() {
            tracing::debug!(question = %query.question, "Answer cache hit");
        }
        hit
    }

    pub fn put(&self, query: &RagQuery, result: RagResult) {
        if let Some(entries) = &self.entries {
            entries.lock().put(query.cache_key(), result);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.as_ref().map_or(0, |e| e.lock().len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        if let Some(entries) = &self.entries {
            entries.lock().clear();
        }
    }
}
