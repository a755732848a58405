use std::collections::BTreeMap;

use chrono::Utc;
use medkb_core::config::ScoringWeights;
use medkb_core::types::{Chunk, ChunkMetadata, ContentKind, KnowledgeType};
use medkb_rank::scorer::{
    answer_marker_hits, clinical_modifier_hits, domain_keyword_hits, moderate_length_hits, question_marker_hits,
    reference_range_hits, title_in_query_hits,
};
use medkb_rank::{DomainFilter, RelevanceScorer, Rule, ScoringContext};

fn chunk(text: &str, title: Option<&str>) -> Chunk {
    Chunk {
        id: "doc.txt:0".into(),
        text: text.into(),
        metadata: ChunkMetadata {
            source: "doc.txt".into(),
            knowledge_type: KnowledgeType::General,
            sequence: 0,
            title: title.map(str::to_string),
            parent_title: None,
            length: text.chars().count(),
            created_at: Utc::now(),
            content_kind: ContentKind::General,
            extra: BTreeMap::new(),
        },
    }
}

fn ctx(text: &str, title: Option<&str>, query: &str) -> ScoringContext { ScoringContext::new(&chunk(text, title), query) }

#[test]
fn white_cell_reference_example() {
    let scorer = RelevanceScorer::default();
    let c = chunk("正常参考值 白细胞 4.0-10.0", None);
    let score = scorer.score(&c, "白细胞正常范围");
    // keyword 100 + reference 60 + modifier "正常" 10
    assert_eq!(score, 170.0);
    assert!(score >= 160.0);
}

#[test]
fn keyword_rule_needs_both_sides() {
    assert_eq!(domain_keyword_hits(&ctx("血压与血糖的关系", None, "血压和血糖")), 2);
    assert_eq!(domain_keyword_hits(&ctx("血压说明", None, "血糖")), 0);
}

#[test]
fn markers_are_case_insensitive() {
    let c = ctx("Q: 空腹血糖多少正常？\nA: 3.9-6.1", None, "血糖");
    assert_eq!(question_marker_hits(&c), 1);
    assert_eq!(answer_marker_hits(&c), 1);

    let localized = ctx("问：血压多少算高？\n答：140/90 以上", None, "血压");
    assert_eq!(question_marker_hits(&localized), 1);
    assert_eq!(answer_marker_hits(&localized), 1);

    assert_eq!(question_marker_hits(&ctx("没有问答标记", None, "")), 0);
}

#[test]
fn reference_rule_fires_once() {
    assert_eq!(reference_range_hits(&ctx("正常范围与参考范围", None, "")), 1);
    assert_eq!(reference_range_hits(&ctx("无参考", None, "")), 0);
}

#[test]
fn title_must_appear_in_query() {
    assert_eq!(title_in_query_hits(&ctx("正文", Some("血压测量"), "血压测量的黄金时间")), 1);
    assert_eq!(title_in_query_hits(&ctx("正文", Some("ECG"), "ecg 异常")), 1);
    assert_eq!(title_in_query_hits(&ctx("正文", Some("心电图"), "血压")), 0);
    assert_eq!(title_in_query_hits(&ctx("正文", None, "血压")), 0);
}

#[test]
fn moderate_length_bounds_are_inclusive() {
    for (len, expected) in [(99, 0), (100, 1), (800, 1), (801, 0)] {
        let text = "字".repeat(len);
        assert_eq!(moderate_length_hits(&ctx(&text, None, "")), expected, "len {len}");
    }
}

#[test]
fn modifiers_count_distinct_terms() {
    assert_eq!(clinical_modifier_hits(&ctx("升高 升高 降低", None, "")), 2);
    assert_eq!(clinical_modifier_hits(&ctx("无", None, "")), 0);
}

#[test]
fn explain_matches_score_and_rule_order() {
    let scorer = RelevanceScorer::default();
    let c = chunk("Q: 血压升高怎么办？\nA: 建议复查。", Some("血压"));
    let query = "血压升高";
    let breakdown = scorer.explain(&c, query);

    let names: Vec<&str> = breakdown.rules.iter().map(|h| h.rule).collect();
    assert_eq!(
        names,
        vec![
            "domain_keyword",
            "question_marker",
            "answer_marker",
            "reference_range",
            "title_in_query",
            "moderate_length",
            "clinical_modifier"
        ]
    );
    assert_eq!(breakdown.total, scorer.score(&c, query));
    // keywords 血压+升高 200, Q 80, A 80, title 50, modifiers 升高+建议 20
    assert_eq!(breakdown.total, 430.0);
}

#[test]
fn weights_are_configurable() {
    let weights = ScoringWeights { domain_keyword: 1.0, reference_range: 0.0, clinical_modifier: 0.0, ..ScoringWeights::default() };
    let scorer = RelevanceScorer::from_weights(&weights);
    assert_eq!(scorer.score(&chunk("正常参考值 白细胞 4.0-10.0", None), "白细胞正常范围"), 1.0);
}

#[test]
fn custom_rule_lists_are_supported() {
    fn always_one(_: &ScoringContext) -> usize { 1 }
    let scorer = RelevanceScorer::with_rules(vec![Rule::new("constant", 7.5, always_one)]);
    assert_eq!(scorer.rules().len(), 1);
    assert_eq!(scorer.score(&chunk("任何内容", None), "任何问题"), 7.5);
}

#[test]
fn domain_filter_gates_queries() {
    let filter = DomainFilter::default();
    assert!(filter.is_in_domain("白细胞正常范围"));
    assert!(filter.is_in_domain("体检前要空腹吗"));
    assert!(!filter.is_in_domain("今天天气怎么样"));
    assert!(!filter.is_in_domain(""));
    assert_eq!(filter.matched("高血压和糖尿病"), vec!["血压", "高血压", "糖尿病"]);

    let custom = DomainFilter::new(["ECG"]);
    assert!(custom.is_in_domain("my ecg result"));
}
