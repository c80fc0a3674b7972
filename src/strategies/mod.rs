// Strategy contract and registry
// One uniform predict() interface across the four answering engines

mod classical;
mod retrieval;
mod rule_based;
mod transformer;

pub use classical::ClassicalMlStrategy;
pub use retrieval::RetrievalStrategy;
pub use rule_based::RuleBasedStrategy;
pub use transformer::TransformerStrategy;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::analyzer::QueryFeatures;

/// The four interchangeable answering strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StrategyKind {
    RuleBased,
    Retrieval,
    ClassicalMl,
    Transformer,
}

impl StrategyKind {
    /// Fixed enumeration order. Scoring iterates (and breaks utility ties)
    /// in this order, so routing is deterministic.
    pub const ALL: [StrategyKind; 4] = [
        StrategyKind::RuleBased,
        StrategyKind::Retrieval,
        StrategyKind::ClassicalMl,
        StrategyKind::Transformer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::RuleBased => "rule-based",
            StrategyKind::Retrieval => "retrieval",
            StrategyKind::ClassicalMl => "classical-ml",
            StrategyKind::Transformer => "transformer",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a strategy returns for a query.
///
/// Never an error: engines absorb internal failures and surface them as an
/// empty answer with zero confidence and an "error: ..." rationale, so
/// nothing panics or propagates across the strategy boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub answer: String,
    /// Self-reported certainty in [0, 1].
    pub confidence: f64,
    pub rationale: String,
}

impl Prediction {
    pub fn new(answer: impl Into<String>, confidence: f64, rationale: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            confidence: confidence.clamp(0.0, 1.0),
            rationale: rationale.into(),
        }
    }

    /// A miss: no answer, zero confidence.
    pub fn miss(rationale: impl Into<String>) -> Self {
        Self::new("", 0.0, rationale)
    }

    /// An absorbed internal failure.
    pub fn failure(cause: impl fmt::Display) -> Self {
        Self::new("", 0.0, format!("error: {cause}"))
    }

    pub fn is_empty(&self) -> bool {
        self.answer.trim().is_empty()
    }
}

/// Uniform contract every answering engine implements.
#[async_trait]
pub trait Strategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    async fn predict(&self, query: &str, features: &QueryFeatures) -> Prediction;
}

/// Maps each strategy kind to its implementation. New strategies plug in
/// here without touching selection or execution logic.
#[derive(Default)]
pub struct StrategyRegistry {
    strategies: HashMap<StrategyKind, Arc<dyn Strategy>>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, strategy: Arc<dyn Strategy>) {
        self.strategies.insert(strategy.kind(), strategy);
    }

    pub fn get(&self, kind: StrategyKind) -> Option<&Arc<dyn Strategy>> {
        self.strategies.get(&kind)
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}
