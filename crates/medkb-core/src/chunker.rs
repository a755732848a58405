//! Heading-aware chunker.
//!
//! Documents are cut before level-3 headings (`### `), falling back to
//! level-2 headings (`## `) when there are none or they yield nothing usable,
//! and to the whole document when neither level helps. Oversized
//! sections are re-packed paragraph by paragraph. All lengths are counted in
//! characters, not bytes, since most of the corpus is CJK text.

use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::lexicon::{contains_any, ADVICE_TERMS, FAQ_MARKERS, REFERENCE_KIND_TERMS};
use crate::types::{Chunk, ChunkMetadata, ContentKind, KnowledgeType};

const LEVEL3_MARKER: &str = "###";
const LEVEL2_MARKER: &str = "##";
const PARAGRAPH_SEPARATOR: &str = "\n\n";
const TITLE_MAX_CHARS: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkerConfig {
    /// Noise floor: shorter candidates are dropped.
    pub min_chars: usize,
    /// Sections above this length are split into paragraph groups.
    pub max_section_chars: usize,
    /// Upper bound for a paragraph group.
    pub max_chunk_chars: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self { min_chars: 50, max_section_chars: 1000, max_chunk_chars: 800 }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Chunker {
    config: ChunkerConfig,
}

/// A chunk body before ids and metadata are assigned.
struct Piece {
    text: String,
    parent_title: Option<String>,
}

impl Chunker {
    pub fn new(config: ChunkerConfig) -> Self { Self { config } }

    pub fn config(&self) -> &ChunkerConfig { &self.config }

    /// Split `content` into chunks attributed to `source_id`.
    ///
    /// Never fails; empty or whitespace-only content yields no chunks.
    pub fn split(&self, content: &str, source_id: &str) -> Vec<Chunk> {
        if content.trim().is_empty() {
            return Vec::new();
        }
        let content = content.replace("\r\n", "\n");

        // Strongest heading level that is present and yields a usable section;
        // with no usable heading the whole document is one section.
        let pieces = [LEVEL3_MARKER, LEVEL2_MARKER]
            .into_iter()
            .filter(|marker| has_heading(&content, marker))
            .map(|marker| self.pieces_from_sections(sections_at(&content, marker)))
            .find(|pieces| !pieces.is_empty())
            .unwrap_or_else(|| self.pieces_from_sections(vec![content.as_str()]));

        let knowledge_type = KnowledgeType::from_source(source_id);
        let created_at = Utc::now();
        let chunks: Vec<Chunk> = pieces
            .into_iter()
            .enumerate()
            .map(|(sequence, piece)| {
                let length = char_len(&piece.text);
                let metadata = ChunkMetadata {
                    source: source_id.to_string(),
                    knowledge_type,
                    sequence,
                    title: extract_title(&piece.text),
                    parent_title: piece.parent_title,
                    length,
                    created_at,
                    content_kind: classify(&piece.text),
                    extra: BTreeMap::new(),
                };
                Chunk { id: format!("{source_id}:{sequence}"), text: piece.text, metadata }
            })
            .collect();

        debug!(source = source_id, chunks = chunks.len(), "chunked document");
        chunks
    }

    fn pieces_from_sections(&self, sections: Vec<&str>) -> Vec<Piece> {
        let mut pieces = Vec::new();
        for section in sections {
            let section = section.trim();
            let len = char_len(section);
            if len < self.config.min_chars {
                continue;
            }
            if len > self.config.max_section_chars {
                pieces.extend(self.split_long_section(section));
            } else {
                pieces.push(Piece { text: section.to_string(), parent_title: None });
            }
        }
        pieces
    }

    /// Greedily pack paragraphs into groups of at most `max_chunk_chars`.
    /// A single paragraph longer than the bound is kept whole.
    fn split_long_section(&self, section: &str) -> Vec<Piece> {
        let section_title = extract_title(section);
        let mut pieces = Vec::new();
        let mut buffer = String::new();
        let mut buffer_len = 0usize;

        let mut flush = |buffer: &mut String, buffer_len: &mut usize| {
            if *buffer_len > self.config.min_chars {
                pieces.push(Piece { text: std::mem::take(buffer), parent_title: section_title.clone() });
            } else {
                buffer.clear();
            }
            *buffer_len = 0;
        };

        for paragraph in section.split(PARAGRAPH_SEPARATOR) {
            let paragraph = paragraph.trim();
            if paragraph.is_empty() {
                continue;
            }
            let paragraph_len = char_len(paragraph);
            let joined_len = buffer_len + PARAGRAPH_SEPARATOR.len() + paragraph_len;
            if buffer_len > 0 && joined_len > self.config.max_chunk_chars {
                flush(&mut buffer, &mut buffer_len);
            }
            if buffer_len > 0 {
                buffer.push_str(PARAGRAPH_SEPARATOR);
                buffer_len += PARAGRAPH_SEPARATOR.len();
            }
            buffer.push_str(paragraph);
            buffer_len += paragraph_len;
        }
        flush(&mut buffer, &mut buffer_len);
        pieces
    }
}

/// Cut `content` immediately before every line that starts with `marker`
/// followed by whitespace. Text before the first heading is its own section.
fn sections_at<'a>(content: &'a str, marker: &str) -> Vec<&'a str> {
    let mut sections = Vec::new();
    let mut start = 0usize;
    let mut offset = 0usize;
    for line in content.split_inclusive('\n') {
        if offset > start && is_heading(line, marker) {
            sections.push(&content[start..offset]);
            start = offset;
        }
        offset += line.len();
    }
    sections.push(&content[start..]);
    sections
}

fn has_heading(content: &str, marker: &str) -> bool {
    content.split_inclusive('\n').any(|line| is_heading(line, marker))
}

fn is_heading(line: &str, marker: &str) -> bool {
    line.strip_prefix(marker)
        .and_then(|rest| rest.chars().next())
        .is_some_and(char::is_whitespace)
}

/// Number of characters (Unicode scalar values) in `s`.
pub fn char_len(s: &str) -> usize { s.chars().count() }

/// First markdown heading (markers stripped), else the first short line
/// without sentence punctuation.
pub fn extract_title(text: &str) -> Option<String> {
    for line in text.lines() {
        let line = line.trim();
        if line.starts_with('#') {
            let title = line.trim_start_matches('#').trim();
            return (!title.is_empty()).then(|| title.to_string());
        }
        let len = char_len(line);
        if len > 0 && len < TITLE_MAX_CHARS && !line.contains('。') && !line.contains('.') {
            return Some(line.to_string());
        }
    }
    None
}

/// First matching rule wins: FAQ, then reference values, then advice.
pub fn classify(text: &str) -> ContentKind {
    if contains_any(text, FAQ_MARKERS) {
        ContentKind::Faq
    } else if contains_any(text, REFERENCE_KIND_TERMS) {
        ContentKind::Reference
    } else if contains_any(text, ADVICE_TERMS) {
        ContentKind::Advice
    } else {
        ContentKind::General
    }
}
