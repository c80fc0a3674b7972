// Classical pattern engine
// Arithmetic handling plus keyword intent classification with graded confidence

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use super::{Prediction, Strategy, StrategyKind};
use crate::analyzer::QueryFeatures;

static NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"-?\d+\.?\d*").expect("static pattern compiles"));
static INLINE_ARITHMETIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+\s*[+\-*/]\s*\d+").expect("static pattern compiles"));

const CALC_KEYWORDS: &[&str] = &[
    "calculate", "solve", "plus", "minus", "times", "divided", "avg", "average", "mean", "sum",
];

/// Keyword patterns per recognized intent, with a canned response each.
/// Stands in for a trained text classifier: confidence is graded, not
/// learned.
const INTENT_PATTERNS: &[(&str, &[&str])] = &[
    ("definition", &["what is", "define", "meaning of", "explain"]),
    (
        "comparison",
        &["difference between", "compare", "versus", "vs", "better than"],
    ),
    (
        "procedure",
        &["how to", "steps to", "process of", "guide for", "way to"],
    ),
    ("reason", &["why", "reason for", "cause of", "due to"]),
    ("example", &["example of", "instance of", "sample", "show me"]),
    (
        "calculation",
        &["calculate", "compute", "solve", "find value", "sum of", "avg", "average", "mean"],
    ),
];

fn intent_response(intent: &str) -> &'static str {
    match intent {
        "definition" => "This is a definition query. A retrieved source will give the details.",
        "comparison" => "This is a comparison query. A generated explanation will cover both sides.",
        "procedure" => "This is a how-to query. A retrieved guide will give the steps.",
        "reason" => "This is a reasoning query. A generated explanation will cover the why.",
        "example" => "This is an example query. A generated response will illustrate it.",
        "calculation" => "Calculation processed.",
        _ => "Intent recognized.",
    }
}

/// Deterministic arithmetic plus keyword classification.
#[derive(Debug, Default)]
pub struct ClassicalMlStrategy;

impl ClassicalMlStrategy {
    pub fn new() -> Self {
        Self
    }

    fn is_calculation(q: &str) -> bool {
        CALC_KEYWORDS.iter().any(|k| q.contains(k)) || INLINE_ARITHMETIC.is_match(q)
    }

    fn handle_calculation(q: &str) -> Prediction {
        let numbers: Vec<f64> = NUMBER
            .find_iter(q)
            .filter_map(|m| m.as_str().parse().ok())
            .collect();

        if ["avg", "average", "mean"].iter().any(|k| q.contains(k)) {
            if numbers.is_empty() {
                return Prediction::new(
                    "Please provide numbers for the average.",
                    0.5,
                    "no numbers found",
                );
            }
            let mean = numbers.iter().sum::<f64>() / numbers.len() as f64;
            return Prediction::new(
                format!("The average of {numbers:?} is {mean}."),
                0.95,
                "mean calculated",
            );
        }

        if numbers.len() < 2 {
            return Prediction::new(
                "Need at least 2 numbers for arithmetic.",
                0.5,
                "insufficient operands",
            );
        }

        if q.contains('+') || q.contains("add") || q.contains("sum") {
            let sum: f64 = numbers.iter().sum();
            Prediction::new(format!("Sum: {sum}"), 0.95, "addition")
        } else if q.contains('-') || q.contains("subtract") {
            Prediction::new(
                format!("Difference: {}", numbers[0] - numbers[1]),
                0.95,
                "subtraction",
            )
        } else if q.contains('*') || q.contains("multiply") || q.contains("times") {
            let product: f64 = numbers.iter().product();
            Prediction::new(format!("Product: {product}"), 0.95, "multiplication")
        } else if q.contains('/') || q.contains("divide") {
            if numbers[1] == 0.0 {
                Prediction::new("Zero division error.", 0.0, "division by zero")
            } else {
                Prediction::new(
                    format!("Quotient: {}", numbers[0] / numbers[1]),
                    0.95,
                    "division",
                )
            }
        } else {
            Prediction::new(
                "Calculation not supported. I do basic math and averages.",
                0.4,
                "unrecognized operation",
            )
        }
    }
}

#[async_trait]
impl Strategy for ClassicalMlStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::ClassicalMl
    }

    async fn predict(&self, query: &str, _features: &QueryFeatures) -> Prediction {
        let q = query.trim().to_lowercase();
        if q.is_empty() {
            return Prediction::miss("empty query");
        }

        if Self::is_calculation(&q) {
            return Self::handle_calculation(&q);
        }

        for (intent, patterns) in INTENT_PATTERNS {
            if patterns.iter().any(|p| q.contains(p)) {
                return Prediction::new(
                    intent_response(intent),
                    0.4,
                    format!("pattern intent: {intent}"),
                );
            }
        }

        Prediction::new("I'm not sure, but I'm learning!", 0.1, "no pattern matched")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::InputAnalyzer;

    async fn predict(query: &str) -> Prediction {
        let features = InputAnalyzer::new().analyze(query);
        ClassicalMlStrategy::new().predict(query, &features).await
    }

    #[tokio::test]
    async fn test_multiplication() {
        let prediction = predict("Calculate 25 * 4").await;
        assert_eq!(prediction.answer, "Product: 100");
        assert_eq!(prediction.confidence, 0.95);
        assert_eq!(prediction.rationale, "multiplication");
    }

    #[tokio::test]
    async fn test_addition() {
        let prediction = predict("what is 5 + 3").await;
        assert_eq!(prediction.answer, "Sum: 8");
        assert_eq!(prediction.confidence, 0.95);
    }

    #[tokio::test]
    async fn test_subtraction() {
        let prediction = predict("calculate 10 - 4").await;
        assert_eq!(prediction.answer, "Difference: 6");
    }

    #[tokio::test]
    async fn test_division() {
        let prediction = predict("compute 9 / 2").await;
        assert_eq!(prediction.answer, "Quotient: 4.5");
    }

    #[tokio::test]
    async fn test_division_by_zero_is_zero_confidence() {
        let prediction = predict("calculate 5 / 0").await;
        assert_eq!(prediction.answer, "Zero division error.");
        assert_eq!(prediction.confidence, 0.0);
    }

    #[tokio::test]
    async fn test_average() {
        let prediction = predict("average of 2 and 4 and 6").await;
        assert!(prediction.answer.contains("is 4"));
        assert_eq!(prediction.confidence, 0.95);
        assert_eq!(prediction.rationale, "mean calculated");
    }

    #[tokio::test]
    async fn test_single_number_is_insufficient() {
        let prediction = predict("calculate 42").await;
        assert_eq!(prediction.answer, "Need at least 2 numbers for arithmetic.");
        assert_eq!(prediction.confidence, 0.5);
    }

    #[tokio::test]
    async fn test_keyword_intent_classification() {
        let prediction = predict("difference between tcp and udp").await;
        assert_eq!(prediction.confidence, 0.4);
        assert_eq!(prediction.rationale, "pattern intent: comparison");
    }

    #[tokio::test]
    async fn test_unknown_query_is_low_confidence() {
        let prediction = predict("hello there").await;
        assert_eq!(prediction.confidence, 0.1);
        assert_eq!(prediction.rationale, "no pattern matched");
    }

    #[tokio::test]
    async fn test_empty_query_is_a_miss() {
        let prediction = predict("   ").await;
        assert!(prediction.is_empty());
        assert_eq!(prediction.rationale, "empty query");
    }
}
