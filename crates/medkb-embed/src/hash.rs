//! Deterministic feature-hashing embedder.
//!
//! Needs no model files, so it backs tests, development runs and any setup
//! where `APP_USE_FAKE_EMBEDDINGS=1`. Latin words and CJK character bigrams
//! are hashed into buckets, so texts sharing vocabulary land close together.

use std::hash::{Hash, Hasher};

use twox_hash::XxHash64;

use medkb_core::error::EmbeddingError;
use medkb_core::traits::Embedder;
use medkb_core::types::Embedding;

pub struct HashEmbedder {
    dim: usize,
    id: String,
}

impl HashEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim, id: format!("hash:xxh64:d{dim}") }
    }
}

impl Embedder for HashEmbedder {
    fn id(&self) -> &str { &self.id }

    fn dim(&self) -> usize { self.dim }

    fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        if self.dim == 0 {
            return Err(EmbeddingError::Provider("hash embedder configured with zero dimensions".into()));
        }
        let mut v = vec![0f32; self.dim];
        for token in features(text) {
            let mut hasher = XxHash64::with_seed(0);
            token.hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h % self.dim as u64) as usize;
            let weight = 0.5 + (((h >> 32) as u32) as f32) / (u32::MAX as f32) * 0.5;
            v[idx] += weight;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut v { *x /= norm; }
        }
        Ok(v)
    }
}

/// Lower-cased alphanumeric runs; ASCII runs are kept as words, other runs
/// are broken into character bigrams (or the single character).
pub fn features(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    let mut out = Vec::new();
    for run in lower.split(|c: char| !c.is_alphanumeric()).filter(|r| !r.is_empty()) {
        if run.is_ascii() {
            out.push(run.to_string());
            continue;
        }
        let chars: Vec<char> = run.chars().collect();
        if chars.len() == 1 {
            out.push(chars[0].to_string());
        } else {
            out.extend(chars.windows(2).map(|w| w.iter().collect::<String>()));
        }
    }
    out
}
