use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{debug, warn};

use medkb_core::error::EmbeddingError;
use medkb_core::traits::Embedder;
use medkb_core::types::{Chunk, ChunkId, Embedding};
use medkb_embed::embed_with_timeout;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmbedOptions {
    pub timeout: Duration,
    /// Embedding calls in flight at once.
    pub concurrency: usize,
}

impl Default for EmbedOptions {
    fn default() -> Self { Self { timeout: Duration::from_secs(10), concurrency: 4 } }
}

/// Outcome of embedding a batch of chunks: the ones ready for the index and
/// the ones that were skipped.
#[derive(Debug, Default)]
pub struct EmbeddedBatch {
    pub records: Vec<(Chunk, Embedding)>,
    pub failed: Vec<(ChunkId, EmbeddingError)>,
}

/// Counts returned by ingestion. `rejected` covers chunks whose embedding
/// failed, timed out or had the wrong dimension.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub documents: usize,
    pub accepted: usize,
    pub rejected: usize,
}

impl IngestReport {
    pub fn merge(&mut self, other: IngestReport) {
        self.documents += other.documents;
        self.accepted += other.accepted;
        self.rejected += other.rejected;
    }
}

/// Embed `chunks` with at most `options.concurrency` calls in flight.
///
/// Output order follows input order. A failure affects only its own chunk:
/// it is logged and reported in `failed`, never aborting the batch.
pub async fn embed_chunks(embedder: &Arc<dyn Embedder>, chunks: Vec<Chunk>, options: &EmbedOptions) -> EmbeddedBatch {
    let timeout = options.timeout;
    let results: Vec<(Chunk, Result<Embedding, EmbeddingError>)> = stream::iter(chunks)
        .map(|chunk| {
            let embedder = Arc::clone(embedder);
            async move {
                let result = embed_with_timeout(embedder, chunk.text.clone(), timeout).await;
                (chunk, result)
            }
        })
        .buffered(options.concurrency.max(1))
        .collect()
        .await;

    let mut batch = EmbeddedBatch::default();
    for (chunk, result) in results {
        match result {
            Ok(embedding) => batch.records.push((chunk, embedding)),
            Err(e) => {
                warn!(id = %chunk.id, error = %e, "skipping chunk: embedding failed");
                batch.failed.push((chunk.id, e));
            }
        }
    }
    debug!(embedded = batch.records.len(), failed = batch.failed.len(), "embedded chunk batch");
    batch
}
