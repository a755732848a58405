use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use medkb_core::error::EmbeddingError;
use medkb_core::traits::Embedder;
use medkb_core::types::{Chunk, ChunkMetadata, ContentKind, Embedding, KnowledgeType};
use medkb_embed::HashEmbedder;
use medkb_vector::{embed_chunks, EmbedOptions, IngestReport, VectorIndex};

fn chunk(id: &str, text: &str) -> Chunk {
    Chunk {
        id: id.to_string(),
        text: text.to_string(),
        metadata: ChunkMetadata {
            source: "doc.txt".to_string(),
            knowledge_type: KnowledgeType::General,
            sequence: 0,
            title: None,
            parent_title: None,
            length: text.chars().count(),
            created_at: Utc::now(),
            content_kind: ContentKind::General,
            extra: BTreeMap::new(),
        },
    }
}

/// Fails on any text containing "坏", sleeps on "慢".
struct FlakyEmbedder(HashEmbedder);

impl Embedder for FlakyEmbedder {
    fn id(&self) -> &str { "flaky" }
    fn dim(&self) -> usize { self.0.dim() }
    fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        if text.contains('坏') {
            return Err(EmbeddingError::Provider("model unavailable".into()));
        }
        if text.contains('慢') {
            std::thread::sleep(Duration::from_millis(300));
        }
        self.0.embed(text)
    }
}

#[tokio::test]
async fn failures_skip_only_the_affected_chunks() {
    let embedder: Arc<dyn Embedder> = Arc::new(FlakyEmbedder(HashEmbedder::new(16)));
    let chunks = vec![chunk("a", "血压正常"), chunk("b", "坏数据"), chunk("c", "慢慢来"), chunk("d", "血糖偏高")];
    let options = EmbedOptions { timeout: Duration::from_millis(50), concurrency: 2 };

    let batch = embed_chunks(&embedder, chunks, &options).await;

    let ok: Vec<&str> = batch.records.iter().map(|(c, _)| c.id.as_str()).collect();
    assert_eq!(ok, vec!["a", "d"], "order preserved for successes");
    assert_eq!(batch.failed.len(), 2);
    assert!(matches!(batch.failed[0], (ref id, EmbeddingError::Provider(_)) if id == "b"));
    assert!(matches!(batch.failed[1], (ref id, EmbeddingError::Timeout(_)) if id == "c"));

    let index = VectorIndex::new(16, 5);
    let report = index.add(batch.records);
    assert_eq!(report.added, 2);
}

#[tokio::test]
async fn empty_batch_is_fine() {
    let embedder: Arc<dyn Embedder> = Arc::new(HashEmbedder::new(8));
    let batch = embed_chunks(&embedder, Vec::new(), &EmbedOptions::default()).await;
    assert!(batch.records.is_empty() && batch.failed.is_empty());
}

#[test]
fn reports_merge() {
    let mut total = IngestReport::default();
    total.merge(IngestReport { documents: 1, accepted: 3, rejected: 1 });
    total.merge(IngestReport { documents: 2, accepted: 4, rejected: 0 });
    assert_eq!(total, IngestReport { documents: 3, accepted: 7, rejected: 1 });
}
