use std::collections::{BTreeMap, HashSet};

use chrono::Utc;
use medkb_core::types::{Chunk, ChunkMetadata, ContentKind, KnowledgeType};
use medkb_vector::{fingerprint, record_key, VectorIndex};

fn chunk(id: &str, source: &str, text: &str) -> Chunk {
    Chunk {
        id: id.to_string(),
        text: text.to_string(),
        metadata: ChunkMetadata {
            source: source.to_string(),
            knowledge_type: KnowledgeType::from_source(source),
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

fn ids(chunks: &[Chunk]) -> Vec<&str> { chunks.iter().map(|c| c.id.as_str()).collect() }

#[test]
fn empty_index_search_returns_nothing() {
    let index = VectorIndex::new(3, 5);
    assert!(index.search(&[1.0, 0.0, 0.0], 5).is_empty());
    assert!(index.search(&[1.0, 0.0, 0.0], 0).is_empty());
    assert!(index.is_empty());
}

#[test]
fn search_orders_by_similarity_and_respects_top_k() {
    let index = VectorIndex::new(2, 5);
    let report = index.add(vec![
        (chunk("a", "s.txt", "a"), vec![0.0, 1.0]),
        (chunk("b", "s.txt", "b"), vec![1.0, 0.0]),
        (chunk("c", "s.txt", "c"), vec![1.0, 1.0]),
    ]);
    assert_eq!((report.added, report.rejected), (3, 0));

    let hits = index.search(&[1.0, 0.1], 2);
    assert_eq!(ids(&hits), vec!["b", "c"]);

    let scored = index.search_scored(&[1.0, 0.0], 3);
    assert!((scored[0].similarity - 1.0).abs() < 1e-6);
    assert!(scored[2].similarity.abs() < 1e-6);
}

#[test]
fn zero_top_k_uses_index_default() {
    let index = VectorIndex::new(1, 2);
    index.add((0..4).map(|i| (chunk(&format!("c{i}"), "s.txt", "x"), vec![1.0])).collect());
    assert_eq!(index.search(&[1.0], 0).len(), 2);
    assert_eq!(index.search(&[1.0], 10).len(), 4);
}

#[test]
fn ties_keep_insertion_order() {
    let index = VectorIndex::new(2, 5);
    index.add(vec![
        (chunk("first", "s.txt", "x"), vec![1.0, 0.0]),
        (chunk("second", "s.txt", "y"), vec![2.0, 0.0]),
        (chunk("third", "s.txt", "z"), vec![3.0, 0.0]),
    ]);
    assert_eq!(ids(&index.search(&[1.0, 0.0], 3)), vec!["first", "second", "third"]);
}

#[test]
fn mismatched_dimensions_are_rejected_at_add() {
    let index = VectorIndex::new(3, 5);
    let report = index.add(vec![
        (chunk("ok", "s.txt", "x"), vec![1.0, 0.0, 0.0]),
        (chunk("short", "s.txt", "y"), vec![1.0, 0.0]),
    ]);
    assert_eq!((report.added, report.rejected), (1, 1));
    assert_eq!(index.len(), 1);
}

#[test]
fn query_with_wrong_dimension_still_returns_records() {
    let index = VectorIndex::new(2, 5);
    index.add(vec![(chunk("a", "s.txt", "x"), vec![1.0, 0.0]), (chunk("b", "s.txt", "y"), vec![0.0, 1.0])]);
    let scored = index.search_scored(&[1.0, 0.0, 0.0], 5);
    assert_eq!(scored.len(), 2);
    assert!(scored.iter().all(|h| h.similarity == 0.0));
}

#[test]
fn duplicates_are_kept_and_delete_removes_all_copies() {
    let index = VectorIndex::new(1, 5);
    index.add(vec![
        (chunk("dup", "s.txt", "x"), vec![1.0]),
        (chunk("dup", "s.txt", "x"), vec![1.0]),
        (chunk("other", "s.txt", "y"), vec![1.0]),
    ]);
    assert_eq!(index.len(), 3);

    let removed = index.delete(&HashSet::from(["dup".to_string()]));
    assert_eq!(removed, 2);
    assert_eq!(ids(&index.search(&[1.0], 5)), vec!["other"]);
}

#[test]
fn deleting_unknown_id_is_a_noop() {
    let index = VectorIndex::new(1, 5);
    index.add(vec![(chunk("a", "s.txt", "x"), vec![1.0])]);
    assert_eq!(index.delete(&HashSet::from(["missing".to_string()])), 0);
    assert_eq!(index.delete(&HashSet::new()), 0);
    assert_eq!(index.len(), 1);
}

#[test]
fn chunks_without_id_are_deleted_by_fingerprint() {
    let index = VectorIndex::new(1, 5);
    let anonymous = chunk("", "s.txt", "无编号的片段");
    let key = fingerprint(&anonymous);
    assert_eq!(record_key(&anonymous), key);
    index.add(vec![(anonymous, vec![1.0])]);

    assert_eq!(index.delete(&HashSet::from([key])), 1);
    assert!(index.is_empty());
}

#[test]
fn delete_source_clear_and_stats() {
    let index = VectorIndex::new(1, 5);
    index.add(vec![
        (chunk("l:0", "medical_knowledge_liver.txt", "x"), vec![1.0]),
        (chunk("l:1", "medical_knowledge_liver.txt", "y"), vec![1.0]),
        (chunk("d:0", "medical_knowledge_diabetes.txt", "z"), vec![1.0]),
    ]);

    let stats = index.stats();
    assert_eq!(stats.total_chunks, 3);
    assert_eq!(stats.total_sources, 2);
    assert_eq!(stats.by_type[&KnowledgeType::Liver], 2);
    assert_eq!(stats.by_source["medical_knowledge_diabetes.txt"], 1);

    assert_eq!(index.delete_source("medical_knowledge_liver.txt"), 2);
    assert_eq!(index.sources().into_iter().collect::<Vec<_>>(), vec!["medical_knowledge_diabetes.txt"]);
    assert_eq!(index.clear(), 1);
    assert_eq!(index.stats().total_sources, 0);
}

#[test]
fn concurrent_searches_and_writes_do_not_interfere() {
    let index = std::sync::Arc::new(VectorIndex::new(2, 5));
    index.add((0..50).map(|i| (chunk(&format!("c{i}"), "s.txt", "x"), vec![1.0, i as f32])).collect());

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let index = index.clone();
            std::thread::spawn(move || {
                for _ in 0..100 {
                    let hits = index.search(&[1.0, 0.0], 5);
                    assert!(hits.len() <= 5);
                }
            })
        })
        .collect();
    for i in 50..60 {
        index.add(vec![(chunk(&format!("c{i}"), "s.txt", "x"), vec![1.0, i as f32])]);
    }
    for r in readers { r.join().unwrap(); }
    assert_eq!(index.len(), 60);
}
