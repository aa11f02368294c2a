//! Semantic ranking: pluggable embedding strategies and the vector index
//! that ranks catalog tools against a query.
//!
//! Strategies cover a spectrum from corpus-trained sparse vectors (TF-IDF)
//! through co-occurrence vectors learned from tool text, to pre-trained
//! static word vectors fetched on first use, and finally an external ranker
//! that receives the tool list and returns names directly.

pub mod index;
pub mod lexical;
pub mod passthrough;
pub mod select;
pub mod static_vectors;
pub mod tfidf;
pub mod upgrade;
pub mod vector;
pub mod word_vectors;

pub use index::{searchable_text, IndexSnapshot, VectorIndex};
pub use passthrough::{parse_ranked_names, PassthroughStrategy, RankingProvider};
pub use select::{select_strategy, StrategySelection};
pub use static_vectors::{StaticVectorModel, StaticVectorStrategy};
pub use tfidf::TfIdfStrategy;
pub use upgrade::{run_upgrade, spawn_upgrade, StaticVectorPreparer, StrategyPreparer, UpgradeOutcome};
pub use vector::{cosine_similarity, l2_normalize, Embedding};
pub use word_vectors::WordVectorStrategy;

use crate::error::RankingError;
use std::sync::Arc;

/// Maps text to a fixed-length vector.
///
/// `train` runs once, before any `generate`, while the strategy is still
/// exclusively owned by the index builder. After that the strategy is shared
/// read-only between concurrent searches.
pub trait EmbeddingStrategy: Send + Sync {
    /// Short identifier reported by `/ready` and in logs.
    fn name(&self) -> &'static str;

    /// Learn corpus statistics from the searchable text of every tool.
    fn train(&mut self, _documents: &[String]) {}

    fn generate(&self, text: &str) -> Result<Embedding, RankingError>;

    /// Length of every vector `generate` returns, 0 before training.
    fn dimension(&self) -> usize;

    /// Strategies that rank without embeddings return the provider here and
    /// the index forwards whole queries to it.
    fn direct_ranker(&self) -> Option<Arc<dyn RankingProvider>> {
        None
    }
}
