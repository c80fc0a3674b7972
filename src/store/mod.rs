// Experience store
// Record of queries answered, strategies used, and user feedback

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::analyzer::QueryFeatures;
use crate::strategies::StrategyKind;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no experience with id {0}")]
    UnknownExperience(u64),
}

/// One answered query, as recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Experience {
    pub id: u64,
    pub query: String,
    pub strategy: StrategyKind,
    pub confidence: f64,
    pub answer: String,
    pub rationale: String,
    pub features: QueryFeatures,
    /// 1 = helpful, 0 = not helpful, None = no feedback yet.
    pub feedback: Option<u8>,
    pub timestamp: DateTime<Utc>,
}

/// Fields the pipeline supplies when recording; id, timestamp, and feedback
/// are the store's business.
#[derive(Debug, Clone)]
pub struct NewExperience {
    pub query: String,
    pub strategy: StrategyKind,
    pub confidence: f64,
    pub answer: String,
    pub rationale: String,
    pub features: QueryFeatures,
}

/// Storage contract the pipeline records against. Implementations own the
/// persistence; the bundled one keeps everything in memory.
pub trait ExperienceStore: Send + Sync {
    /// Record a new experience, returning its id.
    fn record(&self, experience: NewExperience) -> u64;

    /// Attach feedback to a recorded experience. False when the id is
    /// unknown.
    fn update_feedback(&self, id: u64, feedback: u8) -> bool;

    fn get(&self, id: u64) -> Option<Experience>;

    /// Most recent experiences, newest first.
    fn list_recent(&self, limit: usize) -> Vec<Experience>;
}

/// In-memory store. Data lasts for the process lifetime only.
#[derive(Default)]
pub struct InMemoryStore {
    next_id: AtomicU64,
    entries: Mutex<Vec<Experience>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ExperienceStore for InMemoryStore {
    fn record(&self, experience: NewExperience) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let entry = Experience {
            id,
            query: experience.query,
            strategy: experience.strategy,
            confidence: experience.confidence,
            answer: experience.answer,
            rationale: experience.rationale,
            features: experience.features,
            feedback: None,
            timestamp: Utc::now(),
        };
        self.entries
            .lock()
            .expect("experience store lock poisoned")
            .push(entry);
        id
    }

    fn update_feedback(&self, id: u64, feedback: u8) -> bool {
        let mut entries = self.entries.lock().expect("experience store lock poisoned");
        match entries.iter_mut().find(|e| e.id == id) {
            Some(entry) => {
                entry.feedback = Some(feedback);
                true
            }
            None => false,
        }
    }

    fn get(&self, id: u64) -> Option<Experience> {
        let entries = self.entries.lock().expect("experience store lock poisoned");
        entries.iter().find(|e| e.id == id).cloned()
    }

    fn list_recent(&self, limit: usize) -> Vec<Experience> {
        let entries = self.entries.lock().expect("experience store lock poisoned");
        entries.iter().rev().take(limit).cloned().collect()
    }
}
