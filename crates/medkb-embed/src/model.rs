//! Local BGE-M3 embedder (XLM-RoBERTa weights) running on candle.

use anyhow::{Result, anyhow};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::xlm_roberta::{Config as XLMRobertaConfig, XLMRobertaModel};
use tokenizers::Tokenizer;
use tracing::{debug, info, warn};

use medkb_core::error::EmbeddingError;
use medkb_core::traits::Embedder;
use medkb_core::types::Embedding;

use crate::device::select_device;
use crate::pool::masked_mean_l2;
use crate::tokenize::tokenize_on_device;

pub const BGE_M3_DIM: usize = 1024;
const MAX_TOKENS: usize = 256;
const SLOW_EMBED_MS: u128 = 100;

pub struct BgeM3Embedder {
    model: XLMRobertaModel,
    tokenizer: Tokenizer,
    device: Device,
    id: String,
}

impl BgeM3Embedder {
    /// Load tokenizer, config and weights from `model_dir`, or from the
    /// first directory found by [`resolve_model_dir`].
    pub fn load(model_dir: Option<&Path>) -> Result<Self> {
        let device = select_device();
        let model_dir = match model_dir {
            Some(dir) => dir.to_path_buf(),
            None => resolve_model_dir()?,
        };
        info!(dir = %model_dir.display(), "loading BGE-M3 model");

        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", tokenizer_path.display(), e))?;

        let config_path = model_dir.join("config.json");
        let config: XLMRobertaConfig = serde_json::from_str(&std::fs::read_to_string(&config_path)?)?;

        let weights_path = model_dir.join("pytorch_model.bin");
        let weights: HashMap<String, Tensor> = candle_core::pickle::read_all(&weights_path)?.into_iter().collect();
        let vb = VarBuilder::from_tensors(weights, DType::F32, &device);
        let model = XLMRobertaModel::new(&config, vb)?;
        info!("BGE-M3 model loaded");

        Ok(Self { model, tokenizer, device, id: format!("bge-m3:d{BGE_M3_DIM}") })
    }

    fn forward(&self, text: &str) -> Result<Vec<f32>> {
        let start = Instant::now();
        let (input_ids, attention_mask) = tokenize_on_device(&self.tokenizer, text, MAX_TOKENS, &self.device)?;
        let token_type_ids = Tensor::zeros((1, MAX_TOKENS), DType::I64, &self.device)?;
        let hidden = self.model.forward(&input_ids, &attention_mask, &token_type_ids, None, None, None)?;
        let pooled = masked_mean_l2(&hidden, &attention_mask)?;
        let vector: Vec<f32> = pooled.to_device(&Device::Cpu)?.squeeze(0)?.to_vec1()?;
        let elapsed = start.elapsed().as_millis();
        if elapsed > SLOW_EMBED_MS {
            warn!(elapsed_ms = elapsed as u64, "slow embedding");
        } else {
            debug!(elapsed_ms = elapsed as u64, "embedded text");
        }
        Ok(vector)
    }
}

impl Embedder for BgeM3Embedder {
    fn id(&self) -> &str { &self.id }

    fn dim(&self) -> usize { BGE_M3_DIM }

    fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        let vector = self.forward(text).map_err(|e| EmbeddingError::Provider(e.to_string()))?;
        if vector.len() != BGE_M3_DIM {
            return Err(EmbeddingError::Dimension { expected: BGE_M3_DIM, actual: vector.len() });
        }
        Ok(vector)
    }
}

/// `APP_MODEL_DIR`, then `MODEL_DIR`, then `../models/bge-m3`, then `models/bge-m3`.
pub fn resolve_model_dir() -> Result<PathBuf> {
    for var in ["APP_MODEL_DIR", "MODEL_DIR"] {
        if let Ok(dir) = std::env::var(var) {
            let p = PathBuf::from(&dir);
            if p.exists() { return Ok(p); }
        }
    }
    for candidate in ["../models/bge-m3", "models/bge-m3"] {
        let p = Path::new(candidate);
        if p.exists() { return Ok(p.to_path_buf()); }
    }
    Err(anyhow!("Could not locate BGE-M3 model directory"))
}
