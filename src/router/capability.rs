// Intent-strategy capability scoring
// Static base scores adjusted by learned weights and context heuristics

use std::collections::HashMap;

use crate::analyzer::{Complexity, Intent, QueryFeatures};
use crate::strategies::StrategyKind;

/// Maps a normalized weight (0.25 when uniform) back onto the base-score
/// scale, so a strategy at its uniform share scores exactly its base.
const WEIGHT_SCALE: f64 = 4.0;

/// Base score the generative engine gets on intents it must not win.
const TRANSFORMER_PENALTY_SCORE: f64 = 0.1;

/// Base suitability of each strategy for each intent. Higher is better.
/// Never mutated at runtime; learned weights modulate these values, they do
/// not replace them.
fn base_score(intent: Intent, kind: StrategyKind) -> f64 {
    use StrategyKind::{ClassicalMl, Retrieval, RuleBased, Transformer};
    match intent {
        Intent::RuleViolation => match kind {
            RuleBased => 10.0,
            _ => 0.0,
        },
        Intent::Calculation => match kind {
            RuleBased => 1.0,
            Retrieval => 0.5,
            ClassicalMl => 8.0,
            Transformer => 2.0,
        },
        Intent::Factual => match kind {
            RuleBased => 2.0,
            Retrieval => 8.0,
            ClassicalMl => 2.0,
            Transformer => 3.0,
        },
        Intent::Explanation => match kind {
            RuleBased => 0.5,
            Retrieval => 4.0,
            ClassicalMl => 1.0,
            Transformer => 7.0,
        },
        Intent::Reason => match kind {
            RuleBased => 0.0,
            Retrieval => 3.0,
            ClassicalMl => 1.0,
            Transformer => 7.0,
        },
        Intent::General => match kind {
            RuleBased => 1.0,
            Retrieval => 2.0,
            ClassicalMl => 3.0,
            Transformer => 6.0,
        },
    }
}

/// Intents the generative engine is allowed to win.
fn transformer_allowed(intent: Intent) -> bool {
    matches!(intent, Intent::Explanation | Intent::Reason | Intent::General)
}

/// Score every strategy for the given features, in `StrategyKind::ALL`
/// order. Pure: no side effects, no shared state beyond the weight snapshot
/// passed in.
pub fn score(
    features: &QueryFeatures,
    weights: &HashMap<StrategyKind, f64>,
) -> Vec<(StrategyKind, f64)> {
    let uniform = 1.0 / StrategyKind::ALL.len() as f64;

    StrategyKind::ALL
        .iter()
        .map(|&kind| {
            let mut base = base_score(features.intent, kind);

            // The generative engine must never win correctness-critical
            // intents, whatever the matrix or its learned weight say.
            if kind == StrategyKind::Transformer && !transformer_allowed(features.intent) {
                base = TRANSFORMER_PENALTY_SCORE;
            }

            let weight = weights.get(&kind).copied().unwrap_or(uniform);

            let mut bonus = 0.0;
            match features.complexity {
                Complexity::High if kind == StrategyKind::Transformer => bonus += 3.0,
                Complexity::Low if kind != StrategyKind::Transformer => bonus += 2.0,
                _ => {}
            }
            if features.has_number && kind == StrategyKind::ClassicalMl {
                bonus += 2.0;
            }

            (kind, base * weight * WEIGHT_SCALE + bonus)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features(intent: Intent, complexity: Complexity, has_number: bool) -> QueryFeatures {
        QueryFeatures {
            normalized_query: "q".to_string(),
            length: 1,
            has_number,
            intent,
            complexity,
            is_rule_violation: false,
        }
    }

    fn uniform_weights() -> HashMap<StrategyKind, f64> {
        StrategyKind::ALL.iter().map(|&k| (k, 0.25)).collect()
    }

    fn utility_of(scores: &[(StrategyKind, f64)], kind: StrategyKind) -> f64 {
        scores
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, u)| *u)
            .unwrap()
    }

    #[test]
    fn test_calculation_with_number_favors_classical_ml() {
        let scores = score(
            &features(Intent::Calculation, Complexity::Low, true),
            &uniform_weights(),
        );
        // base 8.0, low-complexity bonus 2.0, number bonus 2.0
        assert_eq!(utility_of(&scores, StrategyKind::ClassicalMl), 12.0);
        let best = scores
            .iter()
            .cloned()
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .unwrap();
        assert_eq!(best.0, StrategyKind::ClassicalMl);
    }

    #[test]
    fn test_transformer_capped_on_factual_intent() {
        let scores = score(
            &features(Intent::Factual, Complexity::Low, false),
            &uniform_weights(),
        );
        // forced base 0.1 instead of the matrix value 3.0, no low bonus
        assert!((utility_of(&scores, StrategyKind::Transformer) - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_transformer_uncapped_on_qualitative_intents() {
        for intent in [Intent::Explanation, Intent::Reason, Intent::General] {
            let scores = score(&features(intent, Complexity::High, false), &uniform_weights());
            let transformer = utility_of(&scores, StrategyKind::Transformer);
            assert!(transformer > 3.0, "{intent:?} gave {transformer}");
        }
    }

    #[test]
    fn test_high_complexity_bonus_goes_to_transformer_only() {
        let scores = score(
            &features(Intent::General, Complexity::High, false),
            &uniform_weights(),
        );
        // base 6.0 + 3.0 high-complexity bonus
        assert_eq!(utility_of(&scores, StrategyKind::Transformer), 9.0);
        // base 2.0, no bonus at high complexity
        assert_eq!(utility_of(&scores, StrategyKind::Retrieval), 2.0);
    }

    #[test]
    fn test_bonuses_are_additive() {
        let with_number = score(
            &features(Intent::Calculation, Complexity::Low, true),
            &uniform_weights(),
        );
        let without_number = score(
            &features(Intent::Calculation, Complexity::Low, false),
            &uniform_weights(),
        );
        let diff = utility_of(&with_number, StrategyKind::ClassicalMl)
            - utility_of(&without_number, StrategyKind::ClassicalMl);
        assert!((diff - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_learned_weight_shifts_utility() {
        let mut weights = uniform_weights();
        weights.insert(StrategyKind::Retrieval, 0.55);
        weights.insert(StrategyKind::Transformer, 0.05);

        let scores = score(&features(Intent::General, Complexity::Low, false), &weights);
        // retrieval: 2.0 * 0.55 * 4.0 + 2.0 = 6.4; transformer: 6.0 * 0.05 * 4.0 = 1.2
        assert!((utility_of(&scores, StrategyKind::Retrieval) - 6.4).abs() < 1e-9);
        assert!((utility_of(&scores, StrategyKind::Transformer) - 1.2).abs() < 1e-9);
    }

    #[test]
    fn test_scores_come_back_in_fixed_order() {
        let scores = score(
            &features(Intent::General, Complexity::Low, false),
            &uniform_weights(),
        );
        let kinds: Vec<StrategyKind> = scores.iter().map(|(k, _)| *k).collect();
        assert_eq!(kinds, StrategyKind::ALL);
    }
}
