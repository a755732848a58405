//! Retrieval-augmented answers over a [`KnowledgeBase`].

use serde::Serialize;
use tracing::{info, warn};

use medkb_core::traits::Generator;
use medkb_core::types::ScoredResult;

use crate::knowledge_base::KnowledgeBase;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnswerMode {
    /// Answered from retrieved context.
    Rag,
    /// Nothing relevant was retrieved; the question went to the generator as-is.
    Direct,
    /// Generation failed; `answer` carries the error text.
    Error,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RagAnswer {
    pub answer: String,
    pub sources: Vec<ScoredResult>,
    pub mode: AnswerMode,
}

/// Prompt that numbers each retrieved chunk as `【文档i】` ahead of the question.
pub fn build_prompt(question: &str, results: &[ScoredResult]) -> String {
    let mut context = String::new();
    for (i, result) in results.iter().enumerate() {
        context.push_str(&format!("【文档{}】\n{}\n\n", i + 1, result.chunk.text));
    }
    format!(
        "你是一位专业的医疗助手。请基于以下医学知识库信息回答用户的问题。\n\n\
         医学知识库内容：\n{context}\n\n\
         用户问题：{question}\n\n\
         请基于上述知识库内容给出专业回答："
    )
}

/// Retrieve, then generate. Never fails: a generation error comes back as
/// [`AnswerMode::Error`].
pub async fn answer(kb: &KnowledgeBase, generator: &dyn Generator, question: &str) -> RagAnswer {
    let response = kb.search(question).await;
    let (prompt, sources, mode) = if response.is_empty() {
        (question.to_string(), Vec::new(), AnswerMode::Direct)
    } else {
        (build_prompt(question, &response.results), response.results, AnswerMode::Rag)
    };
    info!(question, retrieved = sources.len(), mode = ?mode, "answering");

    match generator.generate(&prompt) {
        Ok(text) => RagAnswer { answer: text.trim().to_string(), sources, mode },
        Err(e) => {
            warn!(error = %e, "generation failed");
            RagAnswer { answer: format!("处理问题时出现错误: {e}"), sources: Vec::new(), mode: AnswerMode::Error }
        }
    }
}
