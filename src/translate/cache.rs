//! In-memory translation cache with FIFO eviction

use lru::LruCache;
use std::num::NonZeroUsize;

use super::TranslationResult;

pub const DEFAULT_CAPACITY: usize = 500;

/// Bounded cache keyed by `text_source_target`.
///
/// Reads go through `peek` and never reorder entries: when full, the oldest
/// inserted key is evicted regardless of how often it was read.
#[derive(Debug)]
pub struct TranslationCache {
    inner: LruCache<String, TranslationResult>,
}

impl Default for TranslationCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl TranslationCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: LruCache::new(capacity),
        }
    }

    pub fn key(text: &str, source_lang: &str, target_lang: &str) -> String {
        format!("{}_{}_{}", text, source_lang, target_lang)
    }

    pub fn get(&self, key: &str) -> Option<&TranslationResult> {
        self.inner.peek(key)
    }

    /// Insert or replace. Replacing keeps the key's original position.
    pub fn set(&mut self, key: String, value: TranslationResult) {
        if let Some(existing) = self.inner.peek_mut(&key) {
            *existing = value;
            return;
        }

        if let Some((evicted, _)) = self.inner.push(key, value) {
            tracing::trace!("[Cache] Evicted {}", evicted);
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }
}
