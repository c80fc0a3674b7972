// Meta-controller
// Owns the strategy registry and learned weights, and runs the
// select / execute / learn cycle every query goes through

mod capability;
mod executor;
mod selector;

pub use executor::{ExecutionResult, CONFIDENCE_THRESHOLD, HALLUCINATION_FLOOR, SAFE_REFUSAL};

use std::collections::HashMap;

use crate::analyzer::QueryFeatures;
use crate::learning::{StrategyStats, StrategyWeights};
use crate::strategies::{StrategyKind, StrategyRegistry};

/// The routing core: selection, guarded execution, and feedback learning
/// over one shared weight table. One instance serves all in-flight queries.
pub struct MetaController {
    registry: StrategyRegistry,
    weights: StrategyWeights,
}

impl MetaController {
    pub fn new(registry: StrategyRegistry) -> Self {
        Self {
            registry,
            weights: StrategyWeights::new(),
        }
    }

    /// Pick the strategy to answer with.
    pub fn select(&self, features: &QueryFeatures) -> StrategyKind {
        selector::select(features, &self.weights.snapshot())
    }

    /// Run a strategy under the confidence guardrails.
    pub async fn execute(
        &self,
        selected: StrategyKind,
        query: &str,
        features: &QueryFeatures,
    ) -> ExecutionResult {
        executor::execute(&self.registry, selected, query, features).await
    }

    /// Fold one user feedback event into the strategy weights.
    pub fn apply_feedback(&self, strategy_used: StrategyKind, success: bool) {
        self.weights.apply_feedback(strategy_used, success);
    }

    pub fn stats(&self) -> HashMap<StrategyKind, StrategyStats> {
        self.weights.stats()
    }
}
