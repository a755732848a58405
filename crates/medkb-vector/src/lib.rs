//! medkb-vector
//!
//! Brute-force in-memory vector index over chunk embeddings, plus the
//! ingestion step that embeds chunks with bounded concurrency.

pub mod index;
pub mod ingest;
pub mod similarity;

pub use index::{fingerprint, record_key, AddReport, IndexRecord, IndexStats, ScoredChunk, VectorIndex};
pub use ingest::{embed_chunks, EmbedOptions, EmbeddedBatch, IngestReport};
pub use similarity::cosine_similarity;
