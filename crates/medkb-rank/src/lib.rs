//! medkb-rank
//!
//! Keyword domain gate and the rule-based relevance scorer applied to vector
//! search candidates.

pub mod domain;
pub mod scorer;

pub use domain::DomainFilter;
pub use scorer::{RelevanceScorer, Rule, RuleHit, ScoreBreakdown, ScoringContext};
