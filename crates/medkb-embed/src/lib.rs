//! medkb-embed
//!
//! Embedding providers behind [`medkb_core::traits::Embedder`]: a local
//! BGE-M3 model, a deterministic hash embedder, a caching wrapper and a
//! timeout helper for calling any of them from async code.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use medkb_core::config::{expand_path, EmbeddingProviderKind, EmbeddingSettings};
use medkb_core::traits::Embedder;

pub mod cache;
pub mod device;
pub mod hash;
pub mod model;
pub mod pool;
pub mod timeout;
pub mod tokenize;

pub use cache::{cache_key, CacheStats, CachedEmbedder};
pub use hash::HashEmbedder;
pub use model::{BgeM3Embedder, BGE_M3_DIM};
pub use pool::masked_mean_l2;
pub use timeout::embed_with_timeout;

/// True when `APP_USE_FAKE_EMBEDDINGS` is `1` or `true`.
pub fn fake_embeddings_requested() -> bool {
    std::env::var("APP_USE_FAKE_EMBEDDINGS")
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// Build the configured provider, wrapped in the cache when enabled.
pub fn build_embedder(settings: &EmbeddingSettings) -> Result<Arc<dyn Embedder>> {
    let provider = if fake_embeddings_requested() { EmbeddingProviderKind::Hash } else { settings.provider };
    let base: Arc<dyn Embedder> = match provider {
        EmbeddingProviderKind::Hash => Arc::new(HashEmbedder::new(settings.dim)),
        EmbeddingProviderKind::BgeM3 => {
            let dir: Option<PathBuf> = settings.model_dir.as_deref().map(expand_path);
            Arc::new(BgeM3Embedder::load(dir.as_deref())?)
        }
    };
    info!(embedder = base.id(), dim = base.dim(), cache = settings.cache, "embedding provider ready");
    if settings.cache {
        Ok(Arc::new(CachedEmbedder::new(base, settings.cache_capacity)))
    } else {
        Ok(base)
    }
}
