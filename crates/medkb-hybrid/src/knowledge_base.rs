//! Retrieval orchestrator.
//!
//! Query path: domain gate, query embedding (blocking pool, with timeout),
//! vector candidates, heuristic rescoring, floor, sort, limit. Ingest path:
//! chunk, embed with bounded concurrency, add. Neither path returns an error
//! to the caller; failures become counts or an `error` field.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use medkb_core::config::Settings;
use medkb_core::error::EmbeddingError;
use medkb_core::traits::Embedder;
use medkb_core::types::{Chunk, ScoredResult, SourceDocument};
use medkb_core::Chunker;
use medkb_embed::embed_with_timeout;
use medkb_rank::{DomainFilter, RelevanceScorer, ScoreBreakdown};
use medkb_vector::{embed_chunks, EmbedOptions, IndexStats, IngestReport, ScoredChunk, VectorIndex};

pub const NOT_IN_DOMAIN_MESSAGE: &str = "该问题不属于医学知识范畴";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub query: String,
    pub results: Vec<ScoredResult>,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SearchResponse {
    fn with_results(query: &str, results: Vec<ScoredResult>) -> Self {
        Self { query: query.to_string(), count: results.len(), results, message: None, error: None }
    }

    fn not_in_domain(query: &str) -> Self {
        Self { message: Some(NOT_IN_DOMAIN_MESSAGE.to_string()), ..Self::with_results(query, Vec::new()) }
    }

    fn failed(query: &str, error: String) -> Self {
        Self { error: Some(error), ..Self::with_results(query, Vec::new()) }
    }

    pub fn is_empty(&self) -> bool { self.results.is_empty() }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetrievalOptions {
    /// Vector candidates per query; 0 uses the index default.
    pub candidate_k: usize,
    /// Candidates scoring at or below this are dropped.
    pub relevance_floor: f64,
    pub max_results: usize,
    pub embed: EmbedOptions,
}

impl Default for RetrievalOptions {
    fn default() -> Self {
        Self { candidate_k: 0, relevance_floor: 30.0, max_results: 5, embed: EmbedOptions::default() }
    }
}

impl RetrievalOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            candidate_k: settings.retrieval.candidate_k,
            relevance_floor: settings.retrieval.relevance_floor,
            max_results: settings.retrieval.max_results,
            embed: EmbedOptions {
                timeout: Duration::from_millis(settings.embedding.timeout_ms),
                concurrency: settings.embedding.concurrency,
            },
        }
    }
}

/// A vector candidate with its full rule breakdown, whether or not it cleared
/// the relevance floor.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplainedCandidate {
    pub chunk_id: String,
    pub source: String,
    pub title: Option<String>,
    pub vector_score: f32,
    pub breakdown: ScoreBreakdown,
    pub kept: bool,
}

pub struct KnowledgeBase {
    chunker: Chunker,
    index: Arc<VectorIndex>,
    embedder: Arc<dyn Embedder>,
    scorer: RelevanceScorer,
    domain: DomainFilter,
    options: RetrievalOptions,
}

impl KnowledgeBase {
    /// A knowledge base with default chunking, scoring and retrieval options.
    pub fn new(embedder: Arc<dyn Embedder>, index: Arc<VectorIndex>) -> Self {
        if embedder.dim() != index.dim() {
            warn!(embedder = embedder.dim(), index = index.dim(), "embedder and index dimensions differ; every add will be rejected");
        }
        Self {
            chunker: Chunker::default(),
            index,
            embedder,
            scorer: RelevanceScorer::default(),
            domain: DomainFilter::default(),
            options: RetrievalOptions::default(),
        }
    }

    /// Build a fresh index sized for `embedder` and wire every component from `settings`.
    pub fn from_settings(settings: &Settings, embedder: Arc<dyn Embedder>) -> Self {
        let index = Arc::new(VectorIndex::new(embedder.dim(), settings.index.default_top_k));
        Self::new(embedder, index)
            .with_chunker(Chunker::new(settings.chunker.clone()))
            .with_scorer(RelevanceScorer::from_weights(&settings.scoring))
            .with_options(RetrievalOptions::from_settings(settings))
    }

    pub fn with_chunker(mut self, chunker: Chunker) -> Self {
        self.chunker = chunker;
        self
    }

    pub fn with_scorer(mut self, scorer: RelevanceScorer) -> Self {
        self.scorer = scorer;
        self
    }

    pub fn with_domain_filter(mut self, domain: DomainFilter) -> Self {
        self.domain = domain;
        self
    }

    pub fn with_options(mut self, options: RetrievalOptions) -> Self {
        self.options = options;
        self
    }

    pub fn index(&self) -> &Arc<VectorIndex> { &self.index }

    pub fn embedder(&self) -> &Arc<dyn Embedder> { &self.embedder }

    pub fn chunker(&self) -> &Chunker { &self.chunker }

    pub fn scorer(&self) -> &RelevanceScorer { &self.scorer }

    pub fn options(&self) -> &RetrievalOptions { &self.options }

    /// Chunk, embed and index `documents`. Chunks whose embedding fails or
    /// times out are skipped and counted as rejected.
    pub async fn ingest(&self, documents: &[SourceDocument]) -> IngestReport {
        let chunks: Vec<Chunk> = documents
            .iter()
            .flat_map(|doc| self.chunker.split(&doc.content, &doc.source_id))
            .collect();
        let produced = chunks.len();

        let batch = embed_chunks(&self.embedder, chunks, &self.options.embed).await;
        let failed = batch.failed.len();
        let added = self.index.add(batch.records);

        let report = IngestReport { documents: documents.len(), accepted: added.added, rejected: failed + added.rejected };
        info!(
            documents = report.documents,
            chunks = produced,
            accepted = report.accepted,
            rejected = report.rejected,
            "ingest complete"
        );
        report
    }

    /// Clear the index and ingest `documents` from scratch.
    pub async fn reload(&self, documents: &[SourceDocument]) -> IngestReport {
        let removed = self.index.clear();
        info!(removed, documents = documents.len(), "reloading knowledge base");
        self.ingest(documents).await
    }

    pub fn delete(&self, ids: &HashSet<String>) -> usize { self.index.delete(ids) }

    pub fn stats(&self) -> IndexStats { self.index.stats() }

    async fn candidates(&self, query: &str) -> Result<Vec<ScoredChunk>, EmbeddingError> {
        let embedding = embed_with_timeout(Arc::clone(&self.embedder), query.to_string(), self.options.embed.timeout).await?;
        Ok(self.index.search_scored(&embedding, self.options.candidate_k))
    }

    /// Ranked results for `query`, at most `max_results` of them.
    pub async fn search(&self, query: &str) -> SearchResponse {
        if !self.domain.is_in_domain(query) {
            info!(query, "query rejected by domain filter");
            return SearchResponse::not_in_domain(query);
        }

        let candidates = match self.candidates(query).await {
            Ok(c) => c,
            Err(e) => {
                warn!(query, error = %e, "query embedding failed");
                return SearchResponse::failed(query, e.to_string());
            }
        };
        let candidate_count = candidates.len();

        let mut results: Vec<ScoredResult> = candidates
            .into_iter()
            .filter_map(|hit| {
                let heuristic_score = self.scorer.score(&hit.chunk, query);
                debug!(id = %hit.chunk.id, vector = hit.similarity, heuristic = heuristic_score, "scored candidate");
                (heuristic_score > self.options.relevance_floor).then(|| ScoredResult {
                    chunk: hit.chunk,
                    vector_score: hit.similarity,
                    heuristic_score,
                })
            })
            .collect();
        results.sort_by(|a, b| b.heuristic_score.partial_cmp(&a.heuristic_score).unwrap_or(Ordering::Equal));
        results.truncate(self.options.max_results);

        info!(query, candidates = candidate_count, returned = results.len(), "search complete");
        SearchResponse::with_results(query, results)
    }

    /// Every vector candidate for `query` with its per-rule breakdown, in
    /// vector order. Out-of-domain queries yield nothing.
    pub async fn explain(&self, query: &str) -> Result<Vec<ExplainedCandidate>, EmbeddingError> {
        if !self.domain.is_in_domain(query) {
            return Ok(Vec::new());
        }
        let candidates = self.candidates(query).await?;
        Ok(candidates
            .into_iter()
            .map(|hit| {
                let breakdown = self.scorer.explain(&hit.chunk, query);
                ExplainedCandidate {
                    kept: breakdown.total > self.options.relevance_floor,
                    chunk_id: hit.chunk.id,
                    source: hit.chunk.metadata.source,
                    title: hit.chunk.metadata.title,
                    vector_score: hit.similarity,
                    breakdown,
                }
            })
            .collect())
    }
}
