use std::fs;

use medkb_core::config::{resolve_with_base, Config, EmbeddingProviderKind, Settings};
use tempfile::TempDir;

#[test]
fn defaults_apply_without_config_files() {
    let tmp = TempDir::new().unwrap();
    let config = Config::load_from(tmp.path()).expect("load");
    let settings = config.settings().expect("settings");

    assert_eq!(settings.chunker.min_chars, 50);
    assert_eq!(settings.chunker.max_section_chars, 1000);
    assert_eq!(settings.chunker.max_chunk_chars, 800);
    assert_eq!(settings.index.default_top_k, 5);
    assert_eq!(settings.retrieval.max_results, 5);
    assert!((settings.retrieval.relevance_floor - 30.0).abs() < f64::EPSILON);
    assert_eq!(settings.embedding.provider, EmbeddingProviderKind::Hash);
    assert_eq!(config.knowledge_dir().unwrap(), tmp.path().join("knowledge"));
}

#[test]
fn config_file_overrides_defaults() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("config.toml"),
        r#"
[data]
knowledge_dir = "kb"

[retrieval]
candidate_k = 20
relevance_floor = 45.0

[scoring]
domain_keyword = 120.0

[embedding]
provider = "bge-m3"
timeout_ms = 2500
"#,
    )
    .unwrap();

    let config = Config::load_from(tmp.path()).expect("load");
    let settings = config.settings().expect("settings");
    assert_eq!(settings.retrieval.candidate_k, 20);
    assert!((settings.retrieval.relevance_floor - 45.0).abs() < f64::EPSILON);
    assert!((settings.scoring.domain_keyword - 120.0).abs() < f64::EPSILON);
    assert!((settings.scoring.answer_marker - 80.0).abs() < f64::EPSILON, "untouched weights keep defaults");
    assert_eq!(settings.embedding.provider, EmbeddingProviderKind::BgeM3);
    assert_eq!(settings.embedding.timeout_ms, 2500);
    assert_eq!(config.get::<String>("data.knowledge_dir").unwrap(), "kb");
    assert_eq!(config.knowledge_dir().unwrap(), tmp.path().join("kb"));
}

#[test]
fn invalid_chunker_bounds_are_rejected() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("config.toml"), "[chunker]\nmin_chars = 900\n").unwrap();
    let err = Config::load_from(tmp.path()).err().expect("invalid config");
    assert!(err.to_string().contains("chunker bounds"));
}

#[test]
fn settings_validation_rejects_zero_limits() {
    let mut settings = Settings::default();
    assert!(settings.validate().is_ok());
    settings.retrieval.max_results = 0;
    assert!(settings.validate().is_err());
}

#[test]
fn absolute_paths_are_not_rebased() {
    let tmp = TempDir::new().unwrap();
    let abs = tmp.path().join("abs");
    let resolved = resolve_with_base(std::path::Path::new("/somewhere/else"), abs.to_string_lossy());
    assert_eq!(resolved, abs);
    assert_eq!(
        resolve_with_base(std::path::Path::new("/base"), "rel/dir"),
        std::path::PathBuf::from("/base/rel/dir")
    );
}

#[test]
fn cache_capacity_must_be_positive_only_when_caching() {
    let mut settings = Settings::default();
    assert_eq!(settings.embedding.cache_capacity, 10_000);
    settings.embedding.cache_capacity = 0;
    assert!(settings.validate().is_err());
    settings.embedding.cache = false;
    assert!(settings.validate().is_ok());
}
