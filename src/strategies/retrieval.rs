// Retrieval strategy
// Thin adapter putting the tiered cascade behind the strategy contract

use async_trait::async_trait;

use super::{Prediction, Strategy, StrategyKind};
use crate::analyzer::QueryFeatures;
use crate::retrieval::RetrievalCascade;

pub struct RetrievalStrategy {
    cascade: RetrievalCascade,
}

impl RetrievalStrategy {
    pub fn new(cascade: RetrievalCascade) -> Self {
        Self { cascade }
    }
}

#[async_trait]
impl Strategy for RetrievalStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Retrieval
    }

    async fn predict(&self, query: &str, _features: &QueryFeatures) -> Prediction {
        let resolution = self.cascade.resolve(query).await;
        Prediction::new(resolution.answer, resolution.confidence, resolution.source)
    }
}
