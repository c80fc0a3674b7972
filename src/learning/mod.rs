// Feedback learning
// Public interface for the shared strategy-weight table

mod weights;

pub use weights::{StrategyStats, StrategyWeights};
