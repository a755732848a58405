use std::sync::Arc;
use std::time::Duration;

use medkb_core::error::EmbeddingError;
use medkb_core::traits::Embedder;
use medkb_core::types::Embedding;

/// Run one blocking embedding call on the blocking pool, bounded by `timeout`.
///
/// On expiry the worker thread is left to finish on its own; its result is
/// discarded. A vector of the wrong length is reported as an error here so
/// callers never see it.
pub async fn embed_with_timeout(
    embedder: Arc<dyn Embedder>,
    text: String,
    timeout: Duration,
) -> Result<Embedding, EmbeddingError> {
    let expected = embedder.dim();
    let task = tokio::task::spawn_blocking(move || embedder.embed(&text));
    let vector = match tokio::time::timeout(timeout, task).await {
        Ok(Ok(result)) => result?,
        Ok(Err(join_err)) => return Err(EmbeddingError::Provider(format!("embedding task failed: {join_err}"))),
        Err(_) => return Err(EmbeddingError::Timeout(timeout)),
    };
    if vector.len() != expected {
        return Err(EmbeddingError::Dimension { expected, actual: vector.len() });
    }
    Ok(vector)
}
