// Query feature extraction
// Turns raw query text into the feature record the router scores against

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Coarse classification of what a query is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    RuleViolation,
    Calculation,
    Factual,
    Explanation,
    Reason,
    General,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::RuleViolation => "rule_violation",
            Intent::Calculation => "calculation",
            Intent::Factual => "factual",
            Intent::Explanation => "explanation",
            Intent::Reason => "reason",
            Intent::General => "general",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Complexity {
    Low,
    High,
}

/// Features extracted from one incoming query. Immutable once built;
/// discarded after the response is recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryFeatures {
    pub normalized_query: String,
    pub length: usize,
    pub has_number: bool,
    pub intent: Intent,
    pub complexity: Complexity,
    pub is_rule_violation: bool,
}

const RULE_KEYWORDS: &[&str] = &["predict", "hack", "cheat", "bypass", "illegal"];
const CALCULATION_KEYWORDS: &[&str] = &[
    "calculate", "compute", "solve", "find", "avg", "average", "mean", "sum",
];
const FACT_KEYWORDS: &[&str] = &[
    "who is",
    "when",
    "where",
    "how many",
    "how much",
    "limit",
    "minimum",
    "maximum",
    "current",
    "official",
    "requirement",
    "eligibility",
];
const EXPLANATION_KEYWORDS: &[&str] = &["how", "explain", "describe", "elaborate"];
const REASON_KEYWORDS: &[&str] = &["why", "reason for", "cause of"];

/// Queries longer than this are treated as high complexity.
const HIGH_COMPLEXITY_LENGTH: usize = 80;

static HAS_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d").expect("static pattern compiles"));

static RULE_VIOLATION_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [r"hack", r"cheat", r"predict.*mark"]
        .iter()
        .map(|p| Regex::new(p).expect("static pattern compiles"))
        .collect()
});

/// Keyword-driven feature extractor. The router treats its output as
/// opaque input; nothing downstream re-reads the raw query for routing.
#[derive(Debug, Default)]
pub struct InputAnalyzer;

impl InputAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze(&self, query: &str) -> QueryFeatures {
        let q = query.trim().to_lowercase();

        QueryFeatures {
            length: q.len(),
            has_number: HAS_NUMBER.is_match(&q),
            intent: Self::detect_intent(&q),
            complexity: if q.len() > HIGH_COMPLEXITY_LENGTH || q.contains("explain") {
                Complexity::High
            } else {
                Complexity::Low
            },
            is_rule_violation: RULE_VIOLATION_PATTERNS.iter().any(|p| p.is_match(&q)),
            normalized_query: q,
        }
    }

    /// First matching keyword group wins; order mirrors routing priority
    /// (safety, then deterministic intents, then qualitative ones).
    fn detect_intent(q: &str) -> Intent {
        if RULE_KEYWORDS.iter().any(|k| q.contains(k)) {
            return Intent::RuleViolation;
        }
        if CALCULATION_KEYWORDS.iter().any(|k| q.contains(k)) {
            return Intent::Calculation;
        }
        if FACT_KEYWORDS.iter().any(|k| q.contains(k)) || q.starts_with("what") {
            return Intent::Factual;
        }
        if EXPLANATION_KEYWORDS.iter().any(|k| q.contains(k)) {
            return Intent::Explanation;
        }
        if REASON_KEYWORDS.iter().any(|k| q.contains(k)) {
            return Intent::Reason;
        }
        Intent::General
    }
}
