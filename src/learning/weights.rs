// Strategy weight learning
// Multiplicative reinforcement from user feedback, renormalized per event

use std::collections::HashMap;
use std::sync::Mutex;

use serde::Serialize;
use tracing::debug;

use crate::strategies::StrategyKind;

/// Multiplier applied to a strategy's weight on helpful feedback.
const SUCCESS_FACTOR: f64 = 1.1;
/// Multiplier applied on unhelpful feedback.
const FAILURE_FACTOR: f64 = 0.9;
/// Floor applied before renormalization. A long failure streak drives a
/// weight toward this asymptote instead of underflowing the normalizing sum.
const MIN_WEIGHT: f64 = 1e-3;
/// Success rate reported for a strategy that has never received feedback.
const UNTRIED_SUCCESS_RATE: f64 = 0.5;

#[derive(Debug, Clone, Copy, Default)]
struct Tally {
    success: u64,
    total: u64,
}

struct Inner {
    weights: HashMap<StrategyKind, f64>,
    tallies: HashMap<StrategyKind, Tally>,
}

/// Shared, feedback-updated strategy weights.
///
/// Every query reads the same table and every feedback event mutates it.
/// The whole multiply-floor-renormalize step runs under one lock so two
/// concurrent feedback events cannot interleave and lose an update.
/// Invariant: the weights sum to 1.0 (within floating tolerance) at
/// construction and after every feedback event.
pub struct StrategyWeights {
    inner: Mutex<Inner>,
}

impl StrategyWeights {
    /// Uniform weights, normalized from the start.
    pub fn new() -> Self {
        let uniform = 1.0 / StrategyKind::ALL.len() as f64;
        Self {
            inner: Mutex::new(Inner {
                weights: StrategyKind::ALL.iter().map(|&k| (k, uniform)).collect(),
                tallies: StrategyKind::ALL.iter().map(|&k| (k, Tally::default())).collect(),
            }),
        }
    }

    /// Fold one feedback event into the table: bump the counters, scale the
    /// strategy's weight, renormalize everything back to sum 1.0.
    pub fn apply_feedback(&self, kind: StrategyKind, success: bool) {
        let mut inner = self.inner.lock().expect("strategy weight lock poisoned");

        let tally = inner.tallies.entry(kind).or_default();
        tally.total += 1;
        if success {
            tally.success += 1;
        }

        let factor = if success { SUCCESS_FACTOR } else { FAILURE_FACTOR };
        let entry = inner
            .weights
            .entry(kind)
            .or_insert(1.0 / StrategyKind::ALL.len() as f64);
        *entry = (*entry * factor).max(MIN_WEIGHT);

        let sum: f64 = inner.weights.values().sum();
        for weight in inner.weights.values_mut() {
            *weight /= sum;
        }

        debug!(strategy = kind.as_str(), success, "weights updated");
    }

    pub fn weight_of(&self, kind: StrategyKind) -> f64 {
        let inner = self.inner.lock().expect("strategy weight lock poisoned");
        inner.weights.get(&kind).copied().unwrap_or(0.0)
    }

    /// Point-in-time copy of the weight table, for scoring.
    pub fn snapshot(&self) -> HashMap<StrategyKind, f64> {
        let inner = self.inner.lock().expect("strategy weight lock poisoned");
        inner.weights.clone()
    }

    pub fn stats(&self) -> HashMap<StrategyKind, StrategyStats> {
        let inner = self.inner.lock().expect("strategy weight lock poisoned");
        StrategyKind::ALL
            .iter()
            .map(|&kind| {
                let weight = inner.weights.get(&kind).copied().unwrap_or(0.0);
                let tally = inner.tallies.get(&kind).copied().unwrap_or_default();
                let success_rate = if tally.total == 0 {
                    UNTRIED_SUCCESS_RATE
                } else {
                    tally.success as f64 / tally.total as f64
                };
                (
                    kind,
                    StrategyStats {
                        weight,
                        success_rate,
                        total_uses: tally.total,
                    },
                )
            })
            .collect()
    }
}

impl Default for StrategyWeights {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time view of one strategy's learned standing.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct StrategyStats {
    pub weight: f64,
    pub success_rate: f64,
    pub total_uses: u64,
}
