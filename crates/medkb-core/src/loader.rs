//! Loads knowledge files from disk as [`SourceDocument`]s.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::{info, warn};

use crate::types::SourceDocument;

const KNOWLEDGE_EXTENSION: &str = "txt";

/// Every `.txt` file under `root`, sorted for a stable ingestion order.
pub fn list_knowledge_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().and_then(|s| s.to_str()) == Some(KNOWLEDGE_EXTENSION))
        .collect();
    files.sort();
    files
}

/// Read one knowledge file found under `root`. Invalid UTF-8 is replaced
/// rather than rejected.
pub fn read_document(root: &Path, path: &Path) -> Result<SourceDocument> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(_) => String::from_utf8_lossy(&fs::read(path)?).into_owned(),
    };
    Ok(SourceDocument::new(source_id_for(root, path), content))
}

/// Load all knowledge files under `root`. Unreadable files are logged and
/// skipped so one bad file does not block the rest.
pub fn load_directory(root: &Path) -> Vec<SourceDocument> {
    let files = list_knowledge_files(root);
    if files.is_empty() {
        warn!(dir = %root.display(), "no knowledge files found");
        return Vec::new();
    }
    let mut documents = Vec::with_capacity(files.len());
    for path in &files {
        match read_document(root, path) {
            Ok(doc) => documents.push(doc),
            Err(e) => warn!(file = %path.display(), error = %e, "failed to read knowledge file"),
        }
    }
    info!(dir = %root.display(), files = documents.len(), "loaded knowledge files");
    documents
}

/// `path` relative to `root`, `/`-separated, so same-named files in
/// different directories get distinct ids. Falls back to the file name when
/// `path` is not under `root` (or is `root` itself).
pub fn source_id_for(root: &Path, path: &Path) -> String {
    let parts: Vec<String> = path
        .strip_prefix(root)
        .map(|rel| rel.components().map(|c| c.as_os_str().to_string_lossy().into_owned()).collect())
        .unwrap_or_default();
    if !parts.is_empty() {
        return parts.join("/");
    }
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
