//! Shared in-memory vector index.
//!
//! Records live in one `Vec` behind a `RwLock`: searches share the read
//! lock, while add/delete/clear take the write lock, so a search never sees
//! a half-applied mutation. Search is a linear scan, fine for a few thousand
//! chunks.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::Serialize;
use tracing::{debug, info, warn};

use medkb_core::error::Error;
use medkb_core::types::{Chunk, Embedding, KnowledgeType};

use crate::similarity::cosine_similarity;

#[derive(Debug, Clone)]
pub struct IndexRecord {
    pub chunk: Chunk,
    pub embedding: Embedding,
}

/// A chunk returned by [`VectorIndex::search_scored`] with its cosine similarity.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub similarity: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AddReport {
    pub added: usize,
    pub rejected: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexStats {
    pub total_chunks: usize,
    pub total_sources: usize,
    pub by_source: BTreeMap<String, usize>,
    pub by_type: BTreeMap<KnowledgeType, usize>,
}

/// Structural fingerprint of a chunk: blake3 over its source and text.
pub fn fingerprint(chunk: &Chunk) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(chunk.metadata.source.as_bytes());
    hasher.update(&[0]);
    hasher.update(chunk.text.as_bytes());
    hasher.finalize().to_hex().to_string()
}

/// Key used for deletion: the chunk id, or its fingerprint when the id is empty.
pub fn record_key(chunk: &Chunk) -> String {
    if chunk.id.is_empty() { fingerprint(chunk) } else { chunk.id.clone() }
}

pub struct VectorIndex {
    dim: usize,
    default_top_k: usize,
    records: RwLock<Vec<IndexRecord>>,
}

impl VectorIndex {
    pub fn new(dim: usize, default_top_k: usize) -> Self {
        Self { dim, default_top_k: default_top_k.max(1), records: RwLock::new(Vec::new()) }
    }

    pub fn dim(&self) -> usize { self.dim }

    pub fn default_top_k(&self) -> usize { self.default_top_k }

    fn read(&self) -> RwLockReadGuard<'_, Vec<IndexRecord>> {
        self.records.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<IndexRecord>> {
        self.records.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append records. Duplicate ids are kept; records whose embedding length
    /// differs from the index dimensionality are rejected and counted.
    pub fn add(&self, records: Vec<(Chunk, Embedding)>) -> AddReport {
        let mut report = AddReport::default();
        let mut accepted = Vec::with_capacity(records.len());
        for (chunk, embedding) in records {
            if embedding.len() != self.dim {
                let err = Error::DimensionMismatch { id: chunk.id.clone(), expected: self.dim, actual: embedding.len() };
                warn!(error = %err, "rejecting record");
                report.rejected += 1;
                continue;
            }
            accepted.push(IndexRecord { chunk, embedding });
        }
        report.added = accepted.len();
        let total = {
            let mut guard = self.write();
            guard.extend(accepted);
            guard.len()
        };
        debug!(added = report.added, rejected = report.rejected, total, "index add");
        report
    }

    /// Remove every record whose key is in `ids`. Unknown ids are ignored.
    pub fn delete(&self, ids: &HashSet<String>) -> usize {
        if ids.is_empty() {
            return 0;
        }
        let removed = self.remove_where(|r| ids.contains(&record_key(&r.chunk)));
        debug!(requested = ids.len(), removed, "index delete");
        removed
    }

    /// Remove every record that came from `source`.
    pub fn delete_source(&self, source: &str) -> usize {
        self.remove_where(|r| r.chunk.metadata.source == source)
    }

    pub fn clear(&self) -> usize {
        let removed = std::mem::take(&mut *self.write()).len();
        info!(removed, "index cleared");
        removed
    }

    fn remove_where(&self, pred: impl Fn(&IndexRecord) -> bool) -> usize {
        let mut guard = self.write();
        let before = guard.len();
        guard.retain(|r| !pred(r));
        before - guard.len()
    }

    pub fn len(&self) -> usize { self.read().len() }

    pub fn is_empty(&self) -> bool { self.read().is_empty() }

    /// The `top_k` most similar chunks, best first. `top_k == 0` uses the
    /// index default.
    pub fn search(&self, query: &[f32], top_k: usize) -> Vec<Chunk> {
        self.search_scored(query, top_k).into_iter().map(|hit| hit.chunk).collect()
    }

    /// Like [`search`](Self::search) but keeps each chunk's similarity.
    /// Ties keep scan (insertion) order.
    pub fn search_scored(&self, query: &[f32], top_k: usize) -> Vec<ScoredChunk> {
        let k = if top_k == 0 { self.default_top_k } else { top_k };
        let records = self.read();
        if records.is_empty() {
            debug!("search on empty index");
            return Vec::new();
        }
        if query.len() != self.dim {
            warn!(expected = self.dim, actual = query.len(), "query dimension mismatch; all records score 0");
        }

        let mut scored: Vec<(usize, f32)> = records
            .iter()
            .enumerate()
            .map(|(i, r)| (i, cosine_similarity(query, &r.embedding)))
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        scored.truncate(k);
        scored
            .into_iter()
            .map(|(i, similarity)| ScoredChunk { chunk: records[i].chunk.clone(), similarity })
            .collect()
    }

    pub fn stats(&self) -> IndexStats {
        let records = self.read();
        let mut stats = IndexStats { total_chunks: records.len(), ..IndexStats::default() };
        for r in records.iter() {
            *stats.by_source.entry(r.chunk.metadata.source.clone()).or_default() += 1;
            *stats.by_type.entry(r.chunk.metadata.knowledge_type).or_default() += 1;
        }
        stats.total_sources = stats.by_source.len();
        stats
    }

    /// Distinct source ids currently indexed.
    pub fn sources(&self) -> BTreeSet<String> {
        self.read().iter().map(|r| r.chunk.metadata.source.clone()).collect()
    }
}
