//! Fixed vocabularies for the medical health-check domain.
//!
//! Markers are matched against lower-cased text, so the ASCII ones are
//! written in lower case here.

/// Terms that put a query inside the domain at all.
pub const DOMAIN_KEYWORDS: &[&str] = &[
    // test indicators
    "白细胞", "血压", "血糖", "胆固醇", "肝功能", "肾功能", "心电图",
    "中性粒细胞", "淋巴细胞", "血红蛋白", "血小板", "尿酸", "甘油三酯",
    // diseases
    "高血压", "糖尿病", "肝炎", "心脏病", "冠心病", "脂肪肝", "肾病",
    "贫血", "感染", "炎症", "肿瘤", "癌症",
    // symptoms and signs
    "发热", "疼痛", "咳嗽", "胸闷", "头晕", "乏力", "水肿", "黄疸",
    // general medical vocabulary
    "诊断", "治疗", "药物", "检查", "化验", "体检", "健康", "医学",
    "临床", "病理", "生理", "解剖", "免疫", "代谢",
];

/// Keywords rewarded when they occur in both the query and a chunk.
pub const QUERY_KEYWORDS: &[&str] = &[
    "血压", "测量", "时间", "黄金时间", "白细胞", "升高",
    "心电图", "异常", "心脏病", "胆固醇", "肝功能", "血糖",
];

pub const QUESTION_MARKERS: &[&str] = &["q:", "q1:", "q2:", "问:", "问："];

pub const ANSWER_MARKERS: &[&str] = &["a:", "答:", "答："];

pub const REFERENCE_TERMS: &[&str] = &["正常参考值", "正常范围", "参考范围"];

pub const CLINICAL_MODIFIERS: &[&str] = &["升高", "降低", "异常", "正常", "建议", "注意", "可能"];

/// Content-kind classification vocabularies. Matched case-sensitively on the
/// raw chunk text.
pub const FAQ_MARKERS: &[&str] = &["Q:", "问:", "问："];
pub const REFERENCE_KIND_TERMS: &[&str] = &["正常参考值", "参考范围"];
pub const ADVICE_TERMS: &[&str] = &["建议", "注意"];

/// Returns true when `haystack` contains any of `needles`.
pub fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

/// Number of distinct `needles` present in `haystack`.
pub fn count_present(haystack: &str, needles: &[&str]) -> usize {
    needles.iter().filter(|n| haystack.contains(*n)).count()
}
