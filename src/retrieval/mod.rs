// Tiered retrieval
// Public interface for the cache -> local index -> external providers chain

mod cascade;
mod index;
mod providers;

pub use cascade::{Resolution, RetrievalCascade};
pub use index::KnowledgeIndex;
pub use providers::{AnswerProvider, DuckDuckGoProvider, ProviderAnswer, WikipediaProvider};
