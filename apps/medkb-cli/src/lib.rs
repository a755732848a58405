//! Shared bootstrap for the `medkb` binaries: logging, configuration and an
//! ingested [`KnowledgeBase`].

use std::path::{Path, PathBuf};

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;
use tracing_subscriber::EnvFilter;

use medkb_core::config::{Config, Settings};
use medkb_core::loader::load_directory;
use medkb_core::types::SourceDocument;
use medkb_hybrid::KnowledgeBase;
use medkb_vector::IngestReport;

/// Log to stderr so JSON on stdout stays parseable. `RUST_LOG` overrides the
/// default `info` level.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init();
}

pub struct App {
    pub config: Config,
    pub settings: Settings,
    pub kb: KnowledgeBase,
}

impl App {
    /// Load configuration from the working directory and build an empty knowledge base.
    pub fn bootstrap() -> Result<Self> {
        let config = Config::load().map_err(|e| {
            eprintln!("Error loading config: {e}");
            e
        })?;
        Self::from_config(config)
    }

    pub fn from_config(config: Config) -> Result<Self> {
        let settings = config.settings()?;
        let embedder = medkb_embed::build_embedder(&settings.embedding)?;
        let kb = KnowledgeBase::from_settings(&settings, embedder);
        Ok(Self { config, settings, kb })
    }

    /// `dir` if given, else the configured knowledge directory.
    pub fn knowledge_dir(&self, dir: Option<&str>) -> Result<PathBuf> {
        match dir {
            Some(d) => Ok(PathBuf::from(d)),
            None => self.config.knowledge_dir(),
        }
    }

    /// Load every knowledge file under `dir` and ingest it, one document at a
    /// time so the progress bar advances per file.
    pub async fn ingest_dir(&self, dir: &Path, progress: bool) -> IngestReport {
        let documents = load_directory(dir);
        self.ingest_documents(&documents, progress).await
    }

    pub async fn ingest_documents(&self, documents: &[SourceDocument], progress: bool) -> IngestReport {
        let bar = if progress { ProgressBar::new(documents.len() as u64) } else { ProgressBar::hidden() };
        if let Ok(style) = ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} {msg}") {
            bar.set_style(style.progress_chars("=> "));
        }

        let mut total = IngestReport::default();
        for doc in documents {
            bar.set_message(doc.source_id.clone());
            total.merge(self.kb.ingest(std::slice::from_ref(doc)).await);
            bar.inc(1);
        }
        bar.finish_and_clear();
        info!(documents = total.documents, accepted = total.accepted, rejected = total.rejected, "knowledge directory ingested");
        total
    }
}
