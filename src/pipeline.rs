// Query pipeline
// analyze -> select -> execute -> record, plus the feedback path back into
// the strategy weights

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use crate::analyzer::InputAnalyzer;
use crate::config::Config;
use crate::learning::StrategyStats;
use crate::retrieval::{
    AnswerProvider, DuckDuckGoProvider, KnowledgeIndex, RetrievalCascade, WikipediaProvider,
};
use crate::router::MetaController;
use crate::store::{Experience, ExperienceStore, InMemoryStore, NewExperience, StoreError};
use crate::strategies::{
    ClassicalMlStrategy, RetrievalStrategy, RuleBasedStrategy, StrategyKind, StrategyRegistry,
    TransformerStrategy,
};

/// Everything the caller gets back from one query.
#[derive(Debug, Clone)]
pub struct PipelineResponse {
    pub query: String,
    pub answer: String,
    pub strategy_selected: StrategyKind,
    pub strategy_used: StrategyKind,
    pub confidence: f64,
    pub rationale: String,
    pub experience_id: u64,
}

/// End-to-end wiring of analyzer, controller, and store. One instance
/// serves every query and feedback event in the process.
pub struct QueryPipeline {
    analyzer: InputAnalyzer,
    controller: MetaController,
    store: Arc<dyn ExperienceStore>,
}

impl QueryPipeline {
    pub fn new(controller: MetaController, store: Arc<dyn ExperienceStore>) -> Self {
        Self {
            analyzer: InputAnalyzer::new(),
            controller,
            store,
        }
    }

    /// Production wiring: the four bundled strategies, the configured
    /// knowledge base, and an in-memory store.
    pub fn from_config(config: &Config) -> Result<Self> {
        let index = match KnowledgeIndex::load(&config.knowledge_base_path) {
            Ok(index) => index,
            Err(e) => {
                warn!(error = %e, "knowledge base unavailable, local index disabled");
                KnowledgeIndex::from_documents(Vec::new())
            }
        };

        let mut providers: Vec<Arc<dyn AnswerProvider>> = Vec::new();
        if config.providers.duckduckgo_enabled {
            providers.push(Arc::new(DuckDuckGoProvider::new()?));
        }
        if config.providers.wikipedia_enabled {
            providers.push(Arc::new(WikipediaProvider::new()?));
        }

        let mut registry = StrategyRegistry::new();
        registry.register(Arc::new(RuleBasedStrategy::new()));
        registry.register(Arc::new(RetrievalStrategy::new(RetrievalCascade::new(
            index, providers,
        ))));
        registry.register(Arc::new(ClassicalMlStrategy::new()));
        registry.register(Arc::new(TransformerStrategy::new()));

        Ok(Self::new(
            MetaController::new(registry),
            Arc::new(InMemoryStore::new()),
        ))
    }

    /// Answer one query and record the outcome.
    pub async fn respond(&self, query: &str) -> PipelineResponse {
        let features = self.analyzer.analyze(query);
        let selected = self.controller.select(&features);
        info!(
            strategy = selected.as_str(),
            intent = features.intent.as_str(),
            "strategy selected"
        );

        let result = self.controller.execute(selected, query, &features).await;

        let experience_id = self.store.record(NewExperience {
            query: query.to_string(),
            strategy: result.strategy_used,
            confidence: result.confidence,
            answer: result.answer.clone(),
            rationale: result.rationale.clone(),
            features,
        });

        PipelineResponse {
            query: query.to_string(),
            answer: result.answer,
            strategy_selected: selected,
            strategy_used: result.strategy_used,
            confidence: result.confidence,
            rationale: result.rationale,
            experience_id,
        }
    }

    /// Apply user feedback to a recorded experience and fold it into the
    /// weights of the strategy that actually answered.
    pub fn submit_feedback(&self, experience_id: u64, helpful: bool) -> Result<(), StoreError> {
        let Some(experience) = self.store.get(experience_id) else {
            return Err(StoreError::UnknownExperience(experience_id));
        };

        self.store.update_feedback(experience_id, helpful as u8);
        self.controller.apply_feedback(experience.strategy, helpful);
        Ok(())
    }

    pub fn stats(&self) -> HashMap<StrategyKind, StrategyStats> {
        self.controller.stats()
    }

    pub fn recent(&self, limit: usize) -> Vec<Experience> {
        self.store.list_recent(limit)
    }
}
