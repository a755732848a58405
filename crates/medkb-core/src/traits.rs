use crate::error::EmbeddingError;
use crate::types::Embedding;

/// Maps text to a fixed-length vector. Implementations are blocking and may
/// be slow; callers run them off the async executor.
pub trait Embedder: Send + Sync {
    /// Stable identifier for the provider/model (e.g. `hash:xxh64:d256`).
    fn id(&self) -> &str;
    /// Embedding dimensionality, identical for every call.
    fn dim(&self) -> usize;
    fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError>;

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>, EmbeddingError> {
        texts.iter().map(|t| self.embed(t)).collect()
    }
}

/// Opaque language-generation capability: prompt in, text out.
pub trait Generator: Send + Sync {
    fn generate(&self, prompt: &str) -> anyhow::Result<String>;
}
