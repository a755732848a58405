//! Rule-based relevance scoring.
//!
//! A score is the sum of `weight * hits` over an ordered list of rules. Each
//! rule only looks at a [`ScoringContext`], so rules can be tested (and
//! replaced) one at a time. Matching is case-insensitive: the context holds
//! lower-cased copies of the query, chunk text and title.

use std::ops::RangeInclusive;

use serde::Serialize;

use medkb_core::chunker::char_len;
use medkb_core::config::ScoringWeights;
use medkb_core::lexicon::{
    contains_any, count_present, ANSWER_MARKERS, CLINICAL_MODIFIERS, QUERY_KEYWORDS, QUESTION_MARKERS,
    REFERENCE_TERMS,
};
use medkb_core::types::Chunk;

const MODERATE_LENGTH: RangeInclusive<usize> = 100..=800;

pub struct ScoringContext {
    pub query: String,
    pub text: String,
    pub title: Option<String>,
    /// Chunk length in characters.
    pub length: usize,
}

impl ScoringContext {
    pub fn new(chunk: &Chunk, query: &str) -> Self {
        Self {
            query: query.to_lowercase(),
            text: chunk.text.to_lowercase(),
            title: chunk.metadata.title.as_deref().map(str::to_lowercase),
            length: char_len(&chunk.text),
        }
    }
}

pub type HitFn = fn(&ScoringContext) -> usize;

#[derive(Clone)]
pub struct Rule {
    pub name: &'static str,
    pub weight: f64,
    hits: HitFn,
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule").field("name", &self.name).field("weight", &self.weight).finish()
    }
}

impl Rule {
    pub fn new(name: &'static str, weight: f64, hits: HitFn) -> Self { Self { name, weight, hits } }

    pub fn hits(&self, ctx: &ScoringContext) -> usize { (self.hits)(ctx) }

    pub fn points(&self, ctx: &ScoringContext) -> f64 { self.weight * self.hits(ctx) as f64 }
}

/// One hit per query keyword found in both the query and the chunk.
pub fn domain_keyword_hits(ctx: &ScoringContext) -> usize {
    QUERY_KEYWORDS.iter().filter(|k| ctx.query.contains(*k) && ctx.text.contains(*k)).count()
}

pub fn question_marker_hits(ctx: &ScoringContext) -> usize { contains_any(&ctx.text, QUESTION_MARKERS) as usize }

pub fn answer_marker_hits(ctx: &ScoringContext) -> usize { contains_any(&ctx.text, ANSWER_MARKERS) as usize }

pub fn reference_range_hits(ctx: &ScoringContext) -> usize { contains_any(&ctx.text, REFERENCE_TERMS) as usize }

pub fn title_in_query_hits(ctx: &ScoringContext) -> usize {
    ctx.title.as_deref().is_some_and(|t| !t.is_empty() && ctx.query.contains(t)) as usize
}

pub fn moderate_length_hits(ctx: &ScoringContext) -> usize { MODERATE_LENGTH.contains(&ctx.length) as usize }

/// One hit per distinct modifier term.
pub fn clinical_modifier_hits(ctx: &ScoringContext) -> usize { count_present(&ctx.text, CLINICAL_MODIFIERS) }

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleHit {
    pub rule: &'static str,
    pub hits: usize,
    pub points: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub total: f64,
    pub rules: Vec<RuleHit>,
}

#[derive(Debug, Clone)]
pub struct RelevanceScorer {
    rules: Vec<Rule>,
}

impl Default for RelevanceScorer {
    fn default() -> Self { Self::from_weights(&ScoringWeights::default()) }
}

impl RelevanceScorer {
    /// The standard rule list, in evaluation order, with the given weights.
    pub fn from_weights(w: &ScoringWeights) -> Self {
        Self::with_rules(vec![
            Rule::new("domain_keyword", w.domain_keyword, domain_keyword_hits),
            Rule::new("question_marker", w.question_marker, question_marker_hits),
            Rule::new("answer_marker", w.answer_marker, answer_marker_hits),
            Rule::new("reference_range", w.reference_range, reference_range_hits),
            Rule::new("title_in_query", w.title_in_query, title_in_query_hits),
            Rule::new("moderate_length", w.moderate_length, moderate_length_hits),
            Rule::new("clinical_modifier", w.clinical_modifier, clinical_modifier_hits),
        ])
    }

    pub fn with_rules(rules: Vec<Rule>) -> Self { Self { rules } }

    pub fn rules(&self) -> &[Rule] { &self.rules }

    pub fn score(&self, chunk: &Chunk, query: &str) -> f64 {
        let ctx = ScoringContext::new(chunk, query);
        self.rules.iter().map(|r| r.points(&ctx)).sum()
    }

    /// Per-rule breakdown; rules that did not fire are listed with zero hits.
    pub fn explain(&self, chunk: &Chunk, query: &str) -> ScoreBreakdown {
        let ctx = ScoringContext::new(chunk, query);
        let rules: Vec<RuleHit> = self
            .rules
            .iter()
            .map(|r| {
                let hits = r.hits(&ctx);
                RuleHit { rule: r.name, hits, points: r.weight * hits as f64 }
            })
            .collect();
        let total = rules.iter().map(|h| h.points).sum();
        ScoreBreakdown { total, rules }
    }
}
