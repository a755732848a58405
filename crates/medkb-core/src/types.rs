//! Domain types shared by the chunker, the vector index and the retriever.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type ChunkId = String;
pub type Embedding = Vec<f32>;

/// Coarse shape of a chunk's content, decided once at chunking time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContentKind {
    Faq,
    Reference,
    Advice,
    General,
}

/// Knowledge area a source document belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KnowledgeType {
    Liver,
    Cardiovascular,
    Diabetes,
    General,
}

impl KnowledgeType {
    /// Derive the area from a source identifier such as `medical_knowledge_liver.txt`.
    pub fn from_source(source_id: &str) -> Self {
        let lower = source_id.to_lowercase();
        if lower.contains("liver") {
            Self::Liver
        } else if lower.contains("cardiovascular") {
            Self::Cardiovascular
        } else if lower.contains("diabetes") {
            Self::Diabetes
        } else {
            Self::General
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Liver => "LIVER",
            Self::Cardiovascular => "CARDIOVASCULAR",
            Self::Diabetes => "DIABETES",
            Self::General => "GENERAL",
        }
    }
}

/// Metadata attached to every chunk.
///
/// The fields the retriever reads are typed; anything else a caller wants to
/// carry along goes into `extra` and is flattened on serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkMetadata {
    pub source: String,
    #[serde(rename = "type")]
    pub knowledge_type: KnowledgeType,
    pub sequence: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_title: Option<String>,
    pub length: usize,
    pub created_at: DateTime<Utc>,
    pub content_kind: ContentKind,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// A chunk of a source document that is independently indexed.
///
/// `id` is `"{source}:{sequence}"` for chunks produced by the chunker and is
/// stable for as long as the record stays in the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: ChunkId,
    pub text: String,
    pub metadata: ChunkMetadata,
}

/// Raw document handed to ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDocument {
    pub source_id: String,
    pub content: String,
}

impl SourceDocument {
    pub fn new(source_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self { source_id: source_id.into(), content: content.into() }
    }
}

/// A chunk returned by retrieval together with both of its scores.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredResult {
    pub chunk: Chunk,
    pub vector_score: f32,
    pub heuristic_score: f64,
}
