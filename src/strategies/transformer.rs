// Generative engine
// Template-based drafting with a validation stack that rejects risky output

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tracing::warn;

use super::{Prediction, Strategy, StrategyKind};
use crate::analyzer::{Complexity, QueryFeatures};

const UNVERIFIED: &str = "I don't have verified information for this query.";

/// Topics where a generated answer is worse than none; these must come from
/// a retrieved source.
const GOVERNANCE_KEYWORDS: &[&str] = &[
    "prime minister",
    "chief minister",
    "president",
    "governor",
    "current leader",
];

/// Markers of a draft claiming more capability than the system has.
const OVERSELL_MARKERS: &[&str] = &[
    "all types of",
    "everything",
    "perfectly",
    "always accurate",
    "unlimited",
];

/// Hedged phrasing that signals fabricated content.
const HEDGE_MARKERS: &[&str] = &[
    "i believe",
    "i think",
    "as of my last",
    "probably",
    "might be",
    "not sure",
];

/// Two sentences sharing more than this fraction of words count as a loop.
const SENTENCE_OVERLAP_LIMIT: f64 = 0.6;

/// Generative strategy for qualitative queries. Drafts from reasoning
/// templates, then runs every draft through the validation stack; a failed
/// validation surfaces as a low-confidence result the executor treats like
/// any other under-threshold answer.
#[derive(Debug, Default)]
pub struct TransformerStrategy;

impl TransformerStrategy {
    pub fn new() -> Self {
        Self
    }

    fn draft(query: &str, features: &QueryFeatures) -> (String, f64, &'static str) {
        let q = query.to_lowercase();

        if ["why", "how", "explain"].iter().any(|w| q.contains(w)) {
            let topic = extract_topic(query).unwrap_or_else(|| "this concept".to_string());
            (
                format!(
                    "Let me walk through this. {topic} rests on a few interconnected ideas \
                     that combine to produce the behaviour you see. The key principles are \
                     understanding the fundamentals, applying them systematically, and \
                     iterating on the results."
                ),
                0.82,
                "explanation drafted from reasoning template",
            )
        } else if features.complexity == Complexity::High {
            (
                "This is a multifaceted question that needs careful analysis. Several factors \
                 contribute here, including technical constraints, theoretical foundations, \
                 and practical trade-offs."
                    .to_string(),
                0.78,
                "high-complexity draft",
            )
        } else {
            let concept =
                extract_topic(query).unwrap_or_else(|| "the underlying principle".to_string());
            (
                format!(
                    "To understand this, consider the mechanism underneath: {concept} lets \
                     the system recognize patterns in what it has seen and apply them to new \
                     cases."
                ),
                0.75,
                "reasoning draft",
            )
        }
    }
}

#[async_trait]
impl Strategy for TransformerStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Transformer
    }

    async fn predict(&self, query: &str, features: &QueryFeatures) -> Prediction {
        let q = query.to_lowercase();

        if GOVERNANCE_KEYWORDS.iter().any(|kw| q.contains(kw)) {
            warn!("governance query blocked from generation");
            return Prediction::new(
                "I am restricted from generating responses about active political leaders or \
                 governance. Please ask for a retrieved source instead.",
                0.0,
                "governance block",
            );
        }

        let (draft, confidence, rationale) = Self::draft(query, features);
        match validate_draft(&draft) {
            Some(failure) => failure,
            None => Prediction::new(draft, confidence, rationale),
        }
    }
}

/// Reject drafts that repeat themselves, overclaim, or hedge.
fn validate_draft(answer: &str) -> Option<Prediction> {
    // Fuzzy sentence duplication.
    let sentences = answer
        .split(['.', '!', '\n'])
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let mut seen: Vec<HashSet<String>> = Vec::new();
    for sentence in sentences {
        let words: HashSet<String> = sentence
            .to_lowercase()
            .split_whitespace()
            .map(|w| w.chars().filter(|c| c.is_ascii_alphanumeric()).collect())
            .filter(|w: &String| !w.is_empty())
            .collect();
        if words.is_empty() {
            continue;
        }
        for prev in &seen {
            let overlap = words.intersection(prev).count() as f64;
            if overlap / words.len().max(prev.len()) as f64 > SENTENCE_OVERLAP_LIMIT {
                return Some(Prediction::new(
                    UNVERIFIED,
                    0.1,
                    "validation failure: repeated sentence",
                ));
            }
        }
        seen.push(words);
    }

    let clean: Vec<String> = answer
        .split_whitespace()
        .map(|w| {
            w.chars()
                .filter(|c| c.is_ascii_alphanumeric())
                .collect::<String>()
                .to_lowercase()
        })
        .filter(|w| !w.is_empty())
        .collect();

    if clean.len() >= 5 {
        // Repeated three-word phrase.
        let mut grams = HashSet::new();
        for window in clean.windows(3) {
            if !grams.insert(window.to_vec()) {
                return Some(Prediction::new(
                    UNVERIFIED,
                    0.1,
                    "validation failure: phrase loop",
                ));
            }
        }

        // A single word dominating a short answer.
        if clean.len() < 20 {
            let mut counts: HashMap<&str, usize> = HashMap::new();
            for word in &clean {
                *counts.entry(word.as_str()).or_default() += 1;
            }
            if let Some((word, _)) = counts.iter().find(|(w, c)| w.len() > 3 && **c >= 3) {
                return Some(Prediction::new(
                    UNVERIFIED,
                    0.1,
                    format!("validation failure: word '{word}' stutter"),
                ));
            }
        }
    }

    let lower = answer.to_lowercase();
    if OVERSELL_MARKERS.iter().any(|m| lower.contains(m)) {
        return Some(Prediction::new(
            "I can't confirm that level of capability. I support specific answering \
             strategies such as retrieval and rule-based matching.",
            0.1,
            "validation failure: capability over-claim",
        ));
    }

    if HEDGE_MARKERS.iter().any(|m| lower.contains(m)) {
        return Some(Prediction::new(
            UNVERIFIED,
            0.1,
            "validation failure: hedged content",
        ));
    }

    None
}

/// Pull the few meaningful words out of a query to anchor a template.
fn extract_topic(query: &str) -> Option<String> {
    const QUESTION_WORDS: &[&str] = &[
        "what", "is", "how", "why", "does", "do", "can", "the", "a", "an",
    ];

    let lowered = query.to_lowercase();
    let words: Vec<&str> = lowered
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_ascii_alphanumeric()))
        .filter(|w| !QUESTION_WORDS.contains(w) && w.len() > 3)
        .take(3)
        .collect();

    if words.is_empty() {
        None
    } else {
        Some(words.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::InputAnalyzer;

    async fn predict(query: &str) -> Prediction {
        let features = InputAnalyzer::new().analyze(query);
        TransformerStrategy::new().predict(query, &features).await
    }

    #[tokio::test]
    async fn test_explanation_draft() {
        let prediction = predict("Explain how neural networks learn").await;
        assert!(!prediction.is_empty());
        assert_eq!(prediction.confidence, 0.82);
        assert!(prediction.answer.contains("neural networks"));
    }

    #[tokio::test]
    async fn test_governance_query_blocked() {
        let prediction = predict("who will be the next prime minister").await;
        assert_eq!(prediction.confidence, 0.0);
        assert_eq!(prediction.rationale, "governance block");
    }

    #[tokio::test]
    async fn test_general_reasoning_draft() {
        let prediction = predict("gradient descent convergence").await;
        assert_eq!(prediction.confidence, 0.75);
        assert!(prediction.answer.contains("gradient descent convergence"));
    }

    #[test]
    fn test_extract_topic_drops_question_words() {
        assert_eq!(
            extract_topic("why is deep learning so effective").unwrap(),
            "deep learning effective"
        );
        assert!(extract_topic("why is it").is_none());
    }

    #[test]
    fn test_validate_rejects_repeated_sentence() {
        let looped = "The model learns patterns from data. The model learns patterns from data.";
        let failure = validate_draft(looped).unwrap();
        assert_eq!(failure.rationale, "validation failure: repeated sentence");
        assert_eq!(failure.confidence, 0.1);
    }

    #[test]
    fn test_validate_rejects_phrase_loop() {
        let looped = "alpha beta gamma delta alpha beta gamma delta epsilon";
        let failure = validate_draft(looped).unwrap();
        assert_eq!(failure.rationale, "validation failure: phrase loop");
    }

    #[test]
    fn test_validate_rejects_word_stutter() {
        let stutter = "model model model keeps thinking about it";
        let failure = validate_draft(stutter).unwrap();
        assert!(failure.rationale.contains("stutter"));
    }

    #[test]
    fn test_validate_rejects_over_claim() {
        let oversell = "I can handle all types of calculations without mistakes.";
        let failure = validate_draft(oversell).unwrap();
        assert_eq!(failure.rationale, "validation failure: capability over-claim");
    }

    #[test]
    fn test_validate_rejects_hedged_content() {
        let hedged = "I think the answer might be forty-two, but who knows.";
        let failure = validate_draft(hedged).unwrap();
        assert_eq!(failure.rationale, "validation failure: hedged content");
    }

    #[test]
    fn test_validate_accepts_clean_draft() {
        let clean = "Ownership moves values between bindings. Borrowing lends access without \
                     moving. Lifetimes bound how long those loans last.";
        assert!(validate_draft(clean).is_none());
    }

    #[tokio::test]
    async fn test_templates_survive_their_own_validation() {
        for query in [
            "Explain how neural networks learn",
            "tell me about rust traits",
            "summarize the plot in a way that covers every character arc and every subplot thread properly",
        ] {
            let prediction = predict(query).await;
            assert!(
                !prediction.rationale.starts_with("validation failure"),
                "template for {query:?} failed validation: {}",
                prediction.rationale
            );
        }
    }
}
