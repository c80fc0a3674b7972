// Strategy selection
// Hard policy checks first, utility scoring second

use std::collections::HashMap;

use tracing::{debug, info};

use super::capability;
use crate::analyzer::{Intent, QueryFeatures};
use crate::strategies::StrategyKind;

/// Queries containing these terms must be answered from a retrievable
/// source, never generated: role/title lookups and limit/requirement
/// questions are only useful when they are correct.
const FACTUAL_INDICATORS: &[&str] = &[
    "prime minister",
    "chief minister",
    "president",
    "governor",
    "limit",
    "minimum",
    "maximum",
];

/// Pick the strategy to answer with. Two hard checks short-circuit scoring
/// and are never overridden by learned weights; everything else goes
/// through the capability scores with a first-max-wins tie-break.
pub fn select(features: &QueryFeatures, weights: &HashMap<StrategyKind, f64>) -> StrategyKind {
    if features.is_rule_violation {
        info!("restricted query, routing to {}", StrategyKind::RuleBased);
        return StrategyKind::RuleBased;
    }

    if features.intent == Intent::Factual
        || FACTUAL_INDICATORS
            .iter()
            .any(|kw| features.normalized_query.contains(kw))
    {
        info!("factual query, enforcing retrieval routing");
        return StrategyKind::Retrieval;
    }

    let scores = capability::score(features, weights);
    debug!(intent = features.intent.as_str(), ?scores, "strategy utilities");

    // Scores come back in StrategyKind::ALL order and only a strictly
    // greater utility displaces the running best, so ties resolve to the
    // earlier kind.
    let mut best = scores[0];
    for &(kind, utility) in &scores[1..] {
        if utility > best.1 {
            best = (kind, utility);
        }
    }
    best.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::Complexity;

    fn features(intent: Intent, complexity: Complexity) -> QueryFeatures {
        QueryFeatures {
            normalized_query: "sample query".to_string(),
            length: 12,
            has_number: false,
            intent,
            complexity,
            is_rule_violation: false,
        }
    }

    fn uniform_weights() -> HashMap<StrategyKind, f64> {
        StrategyKind::ALL.iter().map(|&k| (k, 0.25)).collect()
    }

    #[test]
    fn test_rule_violation_always_routes_to_rule_based() {
        for intent in [
            Intent::RuleViolation,
            Intent::Calculation,
            Intent::Factual,
            Intent::Explanation,
            Intent::Reason,
            Intent::General,
        ] {
            for complexity in [Complexity::Low, Complexity::High] {
                let mut f = features(intent, complexity);
                f.is_rule_violation = true;
                assert_eq!(select(&f, &uniform_weights()), StrategyKind::RuleBased);
            }
        }
    }

    #[test]
    fn test_factual_intent_always_routes_to_retrieval() {
        for complexity in [Complexity::Low, Complexity::High] {
            let f = features(Intent::Factual, complexity);
            assert_eq!(select(&f, &uniform_weights()), StrategyKind::Retrieval);
        }
    }

    #[test]
    fn test_factual_indicator_keyword_forces_retrieval() {
        let mut f = features(Intent::General, Complexity::Low);
        f.normalized_query = "who is the chief minister of kerala".to_string();
        assert_eq!(select(&f, &uniform_weights()), StrategyKind::Retrieval);

        let mut f = features(Intent::General, Complexity::Low);
        f.normalized_query = "maximum upload size".to_string();
        assert_eq!(select(&f, &uniform_weights()), StrategyKind::Retrieval);
    }

    #[test]
    fn test_learned_weights_cannot_override_hard_checks() {
        let mut weights = uniform_weights();
        weights.insert(StrategyKind::Transformer, 0.97);
        weights.insert(StrategyKind::Retrieval, 0.01);

        let f = features(Intent::Factual, Complexity::Low);
        assert_eq!(select(&f, &weights), StrategyKind::Retrieval);
    }

    #[test]
    fn test_calculation_selects_classical_ml() {
        let mut f = features(Intent::Calculation, Complexity::Low);
        f.has_number = true;
        assert_eq!(select(&f, &uniform_weights()), StrategyKind::ClassicalMl);
    }

    #[test]
    fn test_explanation_selects_transformer() {
        let f = features(Intent::Explanation, Complexity::High);
        assert_eq!(select(&f, &uniform_weights()), StrategyKind::Transformer);
    }

    #[test]
    fn test_ties_break_in_enumeration_order() {
        // With every weight at zero, general+low utilities collapse to the
        // context bonuses: 2.0 for each non-generative strategy, 0.0 for
        // the generative one. First of the tied kinds must win.
        let zeroed: HashMap<StrategyKind, f64> =
            StrategyKind::ALL.iter().map(|&k| (k, 0.0)).collect();
        let f = features(Intent::General, Complexity::Low);
        assert_eq!(select(&f, &zeroed), StrategyKind::RuleBased);
    }
}
