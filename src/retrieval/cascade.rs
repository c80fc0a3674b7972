// Tiered retrieval
// Cache first, then the local index, then external providers in priority order

use std::sync::Arc;

use dashmap::DashMap;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::index::KnowledgeIndex;
use super::providers::AnswerProvider;

/// Local index matches at or below this score are treated as misses.
const LOCAL_MATCH_THRESHOLD: f64 = 0.4;
/// Results at or below this confidence are not worth caching.
const CACHE_FLOOR: f64 = 0.1;

/// A resolved answer with its provenance label.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub answer: String,
    pub confidence: f64,
    pub source: String,
}

impl Resolution {
    fn exhausted() -> Self {
        Self {
            answer: String::new(),
            confidence: 0.0,
            source: "resolution exhausted".to_string(),
        }
    }
}

/// Cache -> local similarity index -> external providers, first non-empty
/// answer wins. Provider failures are absorbed as tier misses, never
/// propagated.
pub struct RetrievalCascade {
    index: KnowledgeIndex,
    providers: Vec<Arc<dyn AnswerProvider>>,
    // Keyed by normalized query, kept for the process lifetime. Concurrent
    // writers may race; entries are idempotent recomputations of the same
    // query, so last writer wins is fine.
    cache: DashMap<String, Resolution>,
}

impl RetrievalCascade {
    pub fn new(index: KnowledgeIndex, providers: Vec<Arc<dyn AnswerProvider>>) -> Self {
        Self {
            index,
            providers,
            cache: DashMap::new(),
        }
    }

    pub async fn resolve(&self, query: &str) -> Resolution {
        let normalized = query.trim().to_lowercase();

        if let Some(hit) = self.cache.get(&normalized) {
            debug!(query = %normalized, "cache hit");
            return hit.value().clone();
        }

        if let Some((doc, score)) = self.index.best_match(&normalized) {
            if score > LOCAL_MATCH_THRESHOLD {
                info!(score, "local index match");
                let resolution = Resolution {
                    answer: doc.to_string(),
                    confidence: score,
                    source: format!("local index (similarity {score:.2})"),
                };
                self.cache.insert(normalized, resolution.clone());
                return resolution;
            }
        }

        info!(query = %normalized, "local miss, trying external providers");
        let resolution = self.resolve_external(&normalized).await;
        if resolution.confidence > CACHE_FLOOR {
            self.cache.insert(normalized, resolution.clone());
        }
        resolution
    }

    async fn resolve_external(&self, query: &str) -> Resolution {
        for provider in &self.providers {
            match timeout(provider.budget(), provider.fetch(query)).await {
                Ok(Ok(Some(answer))) if !answer.text.trim().is_empty() => {
                    info!(provider = provider.name(), "external answer found");
                    return Resolution {
                        answer: answer.text,
                        confidence: answer.confidence,
                        source: answer.source,
                    };
                }
                Ok(Ok(_)) => debug!(provider = provider.name(), "no answer from this provider"),
                Ok(Err(e)) => {
                    warn!(provider = provider.name(), error = %e, "provider failed, trying next tier")
                }
                Err(_) => {
                    warn!(provider = provider.name(), "provider exceeded its budget, trying next tier")
                }
            }
        }
        Resolution::exhausted()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use anyhow::Result;
    use async_trait::async_trait;

    use super::*;
    use crate::retrieval::providers::ProviderAnswer;

    struct StubProvider {
        answer: Option<ProviderAnswer>,
        calls: AtomicUsize,
        fail: bool,
    }

    impl StubProvider {
        fn answering(text: &str, confidence: f64) -> Arc<Self> {
            Arc::new(Self {
                answer: Some(ProviderAnswer {
                    text: text.to_string(),
                    confidence,
                    source: "stub".to_string(),
                }),
                calls: AtomicUsize::new(0),
                fail: false,
            })
        }

        fn empty() -> Arc<Self> {
            Arc::new(Self {
                answer: None,
                calls: AtomicUsize::new(0),
                fail: false,
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                answer: None,
                calls: AtomicUsize::new(0),
                fail: true,
            })
        }
    }

    #[async_trait]
    impl AnswerProvider for StubProvider {
        fn name(&self) -> &'static str {
            "stub"
        }

        fn budget(&self) -> Duration {
            Duration::from_millis(100)
        }

        async fn fetch(&self, _query: &str) -> Result<Option<ProviderAnswer>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("stub provider down");
            }
            Ok(self.answer.clone())
        }
    }

    /// Never resolves; only a timeout gets past it.
    struct HungProvider;

    #[async_trait]
    impl AnswerProvider for HungProvider {
        fn name(&self) -> &'static str {
            "hung"
        }

        fn budget(&self) -> Duration {
            Duration::from_millis(1500)
        }

        async fn fetch(&self, _query: &str) -> Result<Option<ProviderAnswer>> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(None)
        }
    }

    fn empty_index() -> KnowledgeIndex {
        KnowledgeIndex::from_documents(Vec::new())
    }

    #[tokio::test]
    async fn test_local_index_hit_skips_providers() {
        let index = KnowledgeIndex::from_documents(vec![
            "Rust is a systems programming language focused on safety.".to_string(),
        ]);
        let provider = StubProvider::answering("should not be used", 0.85);
        let cascade = RetrievalCascade::new(index, vec![provider.clone()]);

        let resolution = cascade.resolve("rust systems programming safety").await;
        assert!(resolution.answer.contains("Rust"));
        assert!(resolution.confidence > 0.4);
        assert!(resolution.source.starts_with("local index"));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_second_resolve_served_from_cache() {
        let provider = StubProvider::answering("Python is a language.", 0.85);
        let cascade = RetrievalCascade::new(empty_index(), vec![provider.clone()]);

        let first = cascade.resolve("What is Python?").await;
        let second = cascade.resolve("what is python?").await;

        assert_eq!(first, second);
        // Second call never reached the provider tier.
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_tier_advances_to_next() {
        let broken = StubProvider::failing();
        let healthy = StubProvider::answering("recovered answer", 0.85);
        let cascade = RetrievalCascade::new(empty_index(), vec![broken.clone(), healthy.clone()]);

        let resolution = cascade.resolve("anything").await;
        assert_eq!(resolution.answer, "recovered answer");
        assert_eq!(broken.calls.load(Ordering::SeqCst), 1);
        assert_eq!(healthy.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_tier_advances_to_next() {
        let silent = StubProvider::empty();
        let healthy = StubProvider::answering("late answer", 0.85);
        let cascade = RetrievalCascade::new(empty_index(), vec![silent, healthy]);

        let resolution = cascade.resolve("anything").await;
        assert_eq!(resolution.answer, "late answer");
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_provider_cut_off_at_its_budget() {
        let healthy = StubProvider::answering("fallback answer", 0.85);
        let cascade =
            RetrievalCascade::new(empty_index(), vec![Arc::new(HungProvider), healthy]);

        let resolution = cascade.resolve("anything").await;
        assert_eq!(resolution.answer, "fallback answer");
    }

    #[tokio::test]
    async fn test_all_tiers_missing_reports_exhaustion() {
        let cascade = RetrievalCascade::new(
            empty_index(),
            vec![StubProvider::failing(), StubProvider::empty()],
        );

        let resolution = cascade.resolve("anything").await;
        assert_eq!(resolution.answer, "");
        assert_eq!(resolution.confidence, 0.0);
        assert_eq!(resolution.source, "resolution exhausted");
    }

    #[tokio::test]
    async fn test_low_value_results_are_not_cached() {
        let weak = StubProvider::answering("noise", 0.05);
        let cascade = RetrievalCascade::new(empty_index(), vec![weak.clone()]);

        cascade.resolve("some query").await;
        cascade.resolve("some query").await;

        // No cache entry was written, so both calls hit the provider.
        assert_eq!(weak.calls.load(Ordering::SeqCst), 2);
    }
}
