use std::time::Duration;

use thiserror::Error;

/// Failure of the embedding provider for a single call.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EmbeddingError {
    #[error("embedding provider failed: {0}")]
    Provider(String),

    #[error("embedding timed out after {0:?}")]
    Timeout(Duration),

    #[error("embedding has {actual} dimensions, expected {expected}")]
    Dimension { expected: usize, actual: usize },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Dimension mismatch for '{id}': expected {expected}, got {actual}")]
    DimensionMismatch { id: String, expected: usize, actual: usize },

    #[error(transparent)]
    Embedding(#[from] EmbeddingError),
}

pub type Result<T> = std::result::Result<T, Error>;
