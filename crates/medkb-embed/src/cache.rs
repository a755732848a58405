//! Bounded in-memory embedding cache.
//!
//! Entries are keyed by the wrapped provider's id plus the blake3 hash of
//! the input text, and evicted by moka's TinyLFU policy once `capacity`
//! entries are held. Reloading an unchanged knowledge base then costs no
//! provider calls, while a long-running session issuing many distinct
//! queries stays within the bound.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use moka::sync::Cache;

use medkb_core::error::EmbeddingError;
use medkb_core::traits::Embedder;
use medkb_core::types::Embedding;

pub struct CachedEmbedder {
    inner: Arc<dyn Embedder>,
    id: String,
    entries: Cache<String, Embedding>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: u64,
    pub hits: usize,
    pub misses: usize,
}

pub fn content_hash(text: &str) -> String {
    blake3::hash(text.as_bytes()).to_hex().to_string()
}

/// `(embedder id, content hash)` flattened into one key.
pub fn cache_key(embedder_id: &str, text: &str) -> String {
    format!("{embedder_id}:{}", content_hash(text))
}

impl CachedEmbedder {
    pub fn new(inner: Arc<dyn Embedder>, capacity: u64) -> Self {
        let id = format!("cached:{}", inner.id());
        Self {
            inner,
            id,
            entries: Cache::builder().max_capacity(capacity.max(1)).build(),
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    pub fn stats(&self) -> CacheStats {
        // entry_count lags until pending evictions are applied
        self.entries.run_pending_tasks();
        CacheStats {
            entries: self.entries.entry_count(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    pub fn clear(&self) {
        self.entries.invalidate_all();
        self.entries.run_pending_tasks();
    }
}

impl Embedder for CachedEmbedder {
    fn id(&self) -> &str { &self.id }

    fn dim(&self) -> usize { self.inner.dim() }

    fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        let key = cache_key(self.inner.id(), text);
        if let Some(v) = self.entries.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(v);
        }
        // Racing misses both compute; the later insert wins with an identical vector.
        self.misses.fetch_add(1, Ordering::Relaxed);
        let v = self.inner.embed(text)?;
        self.entries.insert(key, v.clone());
        Ok(v)
    }
}
