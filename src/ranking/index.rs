//! Vector index over the catalog's tools.
//!
//! The index owns an immutable [`IndexSnapshot`] behind a lock that is held
//! only long enough to clone or replace an `Arc`. Searches clone the
//! current snapshot and rank against it without any lock; a rebuild
//! constructs the replacement snapshot off to the side and swaps it in, so
//! a search always sees either the old or the new strategy in full.

use super::passthrough::RankingProvider;
use super::vector::{cosine_similarity, Embedding};
use super::EmbeddingStrategy;
use crate::catalog::{Tool, ToolMetadata};
use crate::error::RankingError;
use parking_lot::RwLock;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

/// Text a tool is embedded from: its name and parameter names with
/// underscores read as spaces, plus category and description.
pub fn searchable_text(tool: &Tool) -> String {
    let mut parts = vec![tool.name.replace('_', " ")];
    if !tool.category.is_empty() {
        parts.push(tool.category.clone());
    }
    if !tool.description.is_empty() {
        parts.push(tool.description.clone());
    }
    parts.extend(tool.parameter_names().map(|name| name.replace('_', " ")));
    parts.join(". ")
}

struct IndexedTool {
    tool: Arc<Tool>,
    embedding: Embedding,
}

enum Ranker {
    Vectors(Vec<IndexedTool>),
    Direct {
        provider: Arc<dyn RankingProvider>,
        metadata_json: String,
        by_name: HashMap<String, Arc<Tool>>,
    },
}

/// One fully built index: a trained strategy plus every tool's embedding.
pub struct IndexSnapshot {
    strategy: Arc<dyn EmbeddingStrategy>,
    tools: Vec<Arc<Tool>>,
    ranker: Ranker,
}

impl IndexSnapshot {
    /// Train `strategy` on the tools' searchable text and embed every tool.
    /// A tool whose embedding fails is logged and left out.
    pub fn build(
        mut strategy: Box<dyn EmbeddingStrategy>,
        tools: Vec<Arc<Tool>>,
    ) -> Result<Self, RankingError> {
        let start = Instant::now();
        tracing::info!(
            tool_count = tools.len(),
            strategy = strategy.name(),
            "Building vector index"
        );

        let ranker = match strategy.direct_ranker() {
            Some(provider) => {
                let metadata: Vec<ToolMetadata> =
                    tools.iter().map(|tool| ToolMetadata::full(tool)).collect();
                let metadata_json = serde_json::to_string(&metadata).map_err(|e| {
                    RankingError::EmbeddingFailure(format!("failed to serialize tool metadata: {}", e))
                })?;
                let by_name = tools
                    .iter()
                    .map(|tool| (tool.name.clone(), Arc::clone(tool)))
                    .collect();

                tracing::info!(
                    schema_size_kb = metadata_json.len() / 1024,
                    "Tool metadata prepared for external ranking"
                );
                Ranker::Direct {
                    provider,
                    metadata_json,
                    by_name,
                }
            }
            None => {
                let documents: Vec<String> = tools.iter().map(|tool| searchable_text(tool)).collect();
                strategy.train(&documents);

                let mut indexed = Vec::with_capacity(tools.len());
                for (tool, document) in tools.iter().zip(&documents) {
                    match strategy.generate(document) {
                        Ok(embedding) => indexed.push(IndexedTool {
                            tool: Arc::clone(tool),
                            embedding,
                        }),
                        Err(e) => {
                            tracing::warn!(tool = %tool.name, error = %e, "Failed to embed tool, skipping");
                        }
                    }
                }
                Ranker::Vectors(indexed)
            }
        };

        let snapshot = Self {
            strategy: Arc::from(strategy),
            tools,
            ranker,
        };

        tracing::info!(
            strategy = snapshot.strategy_name(),
            indexed = snapshot.indexed_count(),
            dimension = snapshot.strategy.dimension(),
            build_ms = start.elapsed().as_millis() as u64,
            "Vector index built"
        );

        Ok(snapshot)
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    /// Number of tools that can be returned by a search.
    pub fn indexed_count(&self) -> usize {
        match &self.ranker {
            Ranker::Vectors(indexed) => indexed.len(),
            Ranker::Direct { by_name, .. } => by_name.len(),
        }
    }

    /// Up to `top_k` tools, most relevant first. Equal scores keep index
    /// order.
    pub async fn search(&self, query: &str, top_k: usize) -> Result<Vec<Arc<Tool>>, RankingError> {
        if top_k == 0 {
            return Ok(Vec::new());
        }

        match &self.ranker {
            Ranker::Vectors(indexed) => {
                if indexed.is_empty() {
                    return Ok(Vec::new());
                }

                let query_embedding = self.strategy.generate(query)?;
                let mut scores: Vec<(usize, f32)> = indexed
                    .iter()
                    .enumerate()
                    .map(|(i, entry)| (i, cosine_similarity(&query_embedding, &entry.embedding)))
                    .collect();
                scores.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

                tracing::debug!(
                    query,
                    top_score = scores.first().map(|s| s.1).unwrap_or(0.0),
                    "Vector search ranked"
                );

                Ok(scores
                    .into_iter()
                    .take(top_k)
                    .map(|(i, _)| Arc::clone(&indexed[i].tool))
                    .collect())
            }
            Ranker::Direct {
                provider,
                metadata_json,
                by_name,
            } => {
                if by_name.is_empty() {
                    return Ok(Vec::new());
                }

                let names = provider
                    .rank_tools(query, metadata_json, top_k)
                    .await
                    .map_err(|e| RankingError::Provider(format!("{:#}", e)))?;

                let mut unknown = 0usize;
                let tools: Vec<Arc<Tool>> = names
                    .iter()
                    .filter_map(|name| {
                        let found = by_name.get(name).cloned();
                        if found.is_none() {
                            unknown += 1;
                        }
                        found
                    })
                    .collect();

                if unknown > 0 {
                    tracing::debug!(unknown, "Provider returned unknown tool names");
                }
                Ok(tools)
            }
        }
    }
}

/// Concurrently searchable index with atomic strategy replacement.
pub struct VectorIndex {
    current: RwLock<Arc<IndexSnapshot>>,
}

impl VectorIndex {
    pub fn build(
        strategy: Box<dyn EmbeddingStrategy>,
        tools: Vec<Arc<Tool>>,
    ) -> Result<Self, RankingError> {
        let snapshot = IndexSnapshot::build(strategy, tools)?;
        Ok(Self {
            current: RwLock::new(Arc::new(snapshot)),
        })
    }

    /// The snapshot searches currently run against.
    pub fn snapshot(&self) -> Arc<IndexSnapshot> {
        Arc::clone(&self.current.read())
    }

    pub fn strategy_name(&self) -> &'static str {
        self.snapshot().strategy_name()
    }

    /// Number of tools the index was built from.
    pub fn tool_count(&self) -> usize {
        self.snapshot().tools.len()
    }

    pub async fn search(&self, query: &str, top_k: usize) -> Result<Vec<Arc<Tool>>, RankingError> {
        let snapshot = self.snapshot();
        snapshot.search(query, top_k).await
    }

    /// Rebuild over the same tools with a new strategy and swap it in.
    ///
    /// CPU-bound; callers on the async runtime should run it through
    /// `spawn_blocking`. On error the current snapshot stays in place.
    pub fn rebuild_with_embedder(
        &self,
        strategy: Box<dyn EmbeddingStrategy>,
    ) -> Result<(), RankingError> {
        let tools = self.snapshot().tools.clone();
        let next = Arc::new(IndexSnapshot::build(strategy, tools)?);

        let previous = std::mem::replace(&mut *self.current.write(), next);
        tracing::info!(
            from = previous.strategy_name(),
            to = self.strategy_name(),
            "Vector index strategy swapped"
        );

        Ok(())
    }
}
