//! Ranking delegated to an external model that reads the tool list and
//! returns names in relevance order.

use super::vector::Embedding;
use super::EmbeddingStrategy;
use crate::error::RankingError;
use async_trait::async_trait;
use std::sync::Arc;

/// External ranker. Receives the query, the full tool metadata as a JSON
/// array, and the number of names wanted.
#[async_trait]
pub trait RankingProvider: Send + Sync {
    async fn rank_tools(
        &self,
        query: &str,
        tool_metadata_json: &str,
        exact_count: usize,
    ) -> anyhow::Result<Vec<String>>;
}

/// Strategy wrapper that produces no embeddings and routes every query to a
/// [`RankingProvider`].
pub struct PassthroughStrategy {
    provider: Arc<dyn RankingProvider>,
}

impl PassthroughStrategy {
    pub fn new(provider: Arc<dyn RankingProvider>) -> Self {
        Self { provider }
    }
}

impl EmbeddingStrategy for PassthroughStrategy {
    fn name(&self) -> &'static str {
        "passthrough"
    }

    fn generate(&self, _text: &str) -> Result<Embedding, RankingError> {
        Err(RankingError::EmbeddingFailure(
            "passthrough ranking does not produce embeddings".to_string(),
        ))
    }

    fn dimension(&self) -> usize {
        0
    }

    fn direct_ranker(&self) -> Option<Arc<dyn RankingProvider>> {
        Some(Arc::clone(&self.provider))
    }
}

/// Parse a provider reply into tool names. Accepts a bare JSON array of
/// strings, optionally wrapped in a markdown code fence.
pub fn parse_ranked_names(text: &str) -> Result<Vec<String>, RankingError> {
    let trimmed = text.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    let unfenced = unfenced.strip_suffix("```").unwrap_or(unfenced).trim();

    serde_json::from_str(unfenced).map_err(|e| {
        RankingError::Provider(format!("failed to parse ranked tool names: {}", e))
    })
}
