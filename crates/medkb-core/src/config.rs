//! Configuration loader and path helpers.
//!
//! Uses Figment to merge built-in defaults + `config.toml` +
//! `config.<env>.toml` + `APP_*` env vars (`__` separates nested keys).

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::chunker::ChunkerConfig;
use crate::error::Error;

pub struct Config {
    figment: Figment,
    base_dir: PathBuf,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> { Self::load_from(Path::new(".")) }

    /// Load `config.toml` and `config.<env>.toml` from `base_dir`, then
    /// `APP_*` env vars, all layered over the built-in defaults.
    pub fn load_from(base_dir: &Path) -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(base_dir.join("config.toml")));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file(base_dir.join("config.dev.toml"))),
            "prod" | "production" => figment = figment.merge(Toml::file(base_dir.join("config.prod.toml"))),
            "test" | "testing" => figment = figment.merge(Toml::file(base_dir.join("config.test.toml"))),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment, base_dir: base_dir.to_path_buf() };
        config.validate_for_env(&env_name)?;
        Ok(config)
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    pub fn settings(&self) -> anyhow::Result<Settings> {
        self.figment
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to read settings: {}", e))
    }

    /// Knowledge directory with `~`/`$VAR` expanded, relative to the config base.
    pub fn knowledge_dir(&self) -> anyhow::Result<PathBuf> {
        let dir: String = self.get("data.knowledge_dir")?;
        Ok(resolve_with_base(&self.base_dir, dir))
    }

    fn validate_for_env(&self, env: &str) -> anyhow::Result<()> {
        let settings = self.settings()?;
        settings.validate()?;
        match env {
            "prod" | "production" => {
                if settings.embedding.provider == EmbeddingProviderKind::Hash {
                    warn!("hash embeddings configured in production; retrieval quality will be poor");
                }
            }
            "dev" | "development" | "test" | "testing" => {}
            _ => {}
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data: DataSettings,
    pub chunker: ChunkerConfig,
    pub index: IndexSettings,
    pub retrieval: RetrievalSettings,
    pub scoring: ScoringWeights,
    pub embedding: EmbeddingSettings,
}

impl Settings {
    pub fn validate(&self) -> Result<(), Error> {
        let c = &self.chunker;
        if c.min_chars >= c.max_chunk_chars || c.max_chunk_chars > c.max_section_chars {
            return Err(Error::InvalidConfig(format!(
                "chunker bounds must satisfy min_chars < max_chunk_chars <= max_section_chars (got {} / {} / {})",
                c.min_chars, c.max_chunk_chars, c.max_section_chars
            )));
        }
        if self.index.default_top_k == 0 {
            return Err(Error::InvalidConfig("index.default_top_k must be positive".into()));
        }
        if self.retrieval.max_results == 0 {
            return Err(Error::InvalidConfig("retrieval.max_results must be positive".into()));
        }
        if self.embedding.dim == 0 || self.embedding.timeout_ms == 0 || self.embedding.concurrency == 0 {
            return Err(Error::InvalidConfig(
                "embedding.dim, embedding.timeout_ms and embedding.concurrency must be positive".into(),
            ));
        }
        if self.embedding.cache && self.embedding.cache_capacity == 0 {
            return Err(Error::InvalidConfig("embedding.cache_capacity must be positive when caching".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    pub knowledge_dir: String,
}

impl Default for DataSettings {
    fn default() -> Self { Self { knowledge_dir: "knowledge".to_string() } }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    /// Result count used when a search asks for `top_k == 0`.
    pub default_top_k: usize,
}

impl Default for IndexSettings {
    fn default() -> Self { Self { default_top_k: 5 } }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    /// Vector candidates fetched per query; 0 defers to the index default.
    pub candidate_k: usize,
    /// Candidates scoring at or below this are dropped.
    pub relevance_floor: f64,
    pub max_results: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self { Self { candidate_k: 0, relevance_floor: 30.0, max_results: 5 } }
}

/// Points awarded by each relevance rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub domain_keyword: f64,
    pub question_marker: f64,
    pub answer_marker: f64,
    pub reference_range: f64,
    pub title_in_query: f64,
    pub moderate_length: f64,
    pub clinical_modifier: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            domain_keyword: 100.0,
            question_marker: 80.0,
            answer_marker: 80.0,
            reference_range: 60.0,
            title_in_query: 50.0,
            moderate_length: 20.0,
            clinical_modifier: 10.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EmbeddingProviderKind {
    /// Deterministic feature hashing; no model files needed.
    Hash,
    /// Local BGE-M3 (XLM-RoBERTa) weights loaded with candle.
    BgeM3,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub provider: EmbeddingProviderKind,
    /// Dimensionality of the hash embedder. BGE-M3 is always 1024.
    pub dim: usize,
    pub model_dir: Option<String>,
    pub timeout_ms: u64,
    /// Embedding calls in flight during ingestion.
    pub concurrency: usize,
    pub cache: bool,
    /// Maximum cached embeddings; least valuable entries are evicted first.
    pub cache_capacity: u64,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: EmbeddingProviderKind::Hash,
            dim: 256,
            model_dir: None,
            timeout_ms: 10_000,
            concurrency: 4,
            cache: true,
            cache_capacity: 10_000,
        }
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
