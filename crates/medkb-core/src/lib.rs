//! medkb-core
//!
//! Shared domain types, error kinds, provider traits, configuration and the
//! heading-aware chunker used by every other crate in the workspace.

pub mod chunker;
pub mod config;
pub mod error;
pub mod lexicon;
pub mod loader;
pub mod traits;
pub mod types;

pub use chunker::{Chunker, ChunkerConfig};
pub use error::{EmbeddingError, Error, Result};
pub use types::{Chunk, ChunkMetadata, ContentKind, Embedding, KnowledgeType, SourceDocument};
