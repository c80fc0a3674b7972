// Confidence-gated strategy execution
// Rule guard, threshold check, one fixed fallback hop to the generative engine

use tracing::{error, info, warn};

use crate::analyzer::{Intent, QueryFeatures};
use crate::strategies::{Prediction, StrategyKind, StrategyRegistry};

/// Confidence below this triggers the fallback policy.
pub const CONFIDENCE_THRESHOLD: f64 = 0.35;
/// A fallback answer below this is refused as a hallucination risk.
pub const HALLUCINATION_FLOOR: f64 = 0.2;
/// Rule-engine confidence at or above this short-circuits everything else.
const RULE_GUARD_THRESHOLD: f64 = 0.9;

/// Fixed response when no strategy can answer with adequate confidence.
pub const SAFE_REFUSAL: &str = "I don't have verified information for this query. \
    Please refine the question or provide a trusted source.";

/// Outcome of running one query through the guarded state machine.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub answer: String,
    pub confidence: f64,
    pub rationale: String,
    /// The strategy that actually produced the answer; differs from the
    /// selected one when the rule guard or the fallback hop fired.
    pub strategy_used: StrategyKind,
}

impl ExecutionResult {
    fn from_prediction(prediction: Prediction, strategy_used: StrategyKind) -> Self {
        Self {
            answer: prediction.answer,
            confidence: prediction.confidence,
            rationale: prediction.rationale,
            strategy_used,
        }
    }

    fn refusal(rationale: String, strategy_used: StrategyKind) -> Self {
        Self {
            answer: SAFE_REFUSAL.to_string(),
            confidence: 0.0,
            rationale,
            strategy_used,
        }
    }
}

/// Run the selected strategy under the confidence guardrails. At most one
/// fallback hop, always to the generative engine, never re-selected by
/// scoring.
pub async fn execute(
    registry: &StrategyRegistry,
    selected: StrategyKind,
    query: &str,
    features: &QueryFeatures,
) -> ExecutionResult {
    // Zero-latency rule guard: safety and static matches preempt whatever
    // was selected.
    if let Some(rule) = registry.get(StrategyKind::RuleBased) {
        let guard = rule.predict(query, features).await;
        if guard.confidence >= RULE_GUARD_THRESHOLD {
            info!("rule guard fired, bypassing {selected}");
            return ExecutionResult::from_prediction(guard, StrategyKind::RuleBased);
        }
    }

    let mut prediction = match registry.get(selected) {
        Some(strategy) => strategy.predict(query, features).await,
        None => Prediction::failure(format!("no {selected} strategy registered")),
    };

    if prediction.is_empty() {
        warn!("{selected} returned an empty answer");
        prediction = Prediction::miss(format!("empty response from {selected}"));
    }

    if prediction.confidence >= CONFIDENCE_THRESHOLD {
        return ExecutionResult::from_prediction(prediction, selected);
    }

    // Below threshold. Factual queries and the generative engine itself
    // refuse instead of cascading: a guess is worse than no answer.
    if features.intent == Intent::Factual || selected == StrategyKind::Transformer {
        warn!(
            "{selected} confidence {:.2} below threshold, refusing to guess",
            prediction.confidence
        );
        return ExecutionResult::refusal(
            "safe failure: confidence below threshold".to_string(),
            selected,
        );
    }

    info!("escalating {selected} to {} for qualitative reasoning", StrategyKind::Transformer);
    let fallback = match registry.get(StrategyKind::Transformer) {
        Some(strategy) => strategy.predict(query, features).await,
        None => Prediction::failure("no transformer strategy registered"),
    };

    if fallback.confidence < HALLUCINATION_FLOOR {
        error!(
            query,
            rationale = %fallback.rationale,
            "fallback answer refused as hallucination risk"
        );
        return ExecutionResult::refusal(
            format!("safe failure: high hallucination risk ({})", fallback.rationale),
            StrategyKind::Transformer,
        );
    }

    ExecutionResult::from_prediction(fallback, StrategyKind::Transformer)
}
