//! medkb-hybrid
//!
//! Ties the chunker, embedder, vector index and relevance scorer together
//! into a [`KnowledgeBase`], and composes retrieval-augmented prompts on top.

pub mod knowledge_base;
pub mod rag;

pub use knowledge_base::{
    ExplainedCandidate, KnowledgeBase, RetrievalOptions, SearchResponse, NOT_IN_DOMAIN_MESSAGE,
};
pub use rag::{answer, build_prompt, AnswerMode, RagAnswer};
