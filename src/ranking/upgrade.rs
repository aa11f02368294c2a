//! Background upgrade from the startup strategy to a preferred one that
//! needs slow preparation (a model download, a large parse).
//!
//! The service answers searches with the fallback index while the preferred
//! strategy is prepared; once ready, the index is rebuilt and swapped. If
//! preparation fails the fallback simply stays in place.

use super::index::VectorIndex;
use super::static_vectors::{StaticVectorModel, StaticVectorStrategy};
use super::EmbeddingStrategy;
use crate::error::RankingError;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Produces a ready-to-train strategy, possibly after slow I/O.
#[async_trait]
pub trait StrategyPreparer: Send + Sync {
    /// Human-readable target, for logs.
    fn describe(&self) -> String;

    async fn prepare(&self) -> Result<Box<dyn EmbeddingStrategy>, RankingError>;
}

/// Fetches a static vector model into the cache directory and loads it.
pub struct StaticVectorPreparer {
    model: &'static StaticVectorModel,
    cache_dir: PathBuf,
}

impl StaticVectorPreparer {
    pub fn new(model: &'static StaticVectorModel, cache_dir: PathBuf) -> Self {
        Self { model, cache_dir }
    }
}

#[async_trait]
impl StrategyPreparer for StaticVectorPreparer {
    fn describe(&self) -> String {
        format!("static_vectors({})", self.model.id)
    }

    async fn prepare(&self) -> Result<Box<dyn EmbeddingStrategy>, RankingError> {
        let strategy =
            StaticVectorStrategy::fetch_and_load(self.model, self.cache_dir.clone()).await?;
        Ok(Box::new(strategy))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpgradeOutcome {
    Upgraded { strategy: &'static str },
    KeptFallback { reason: String },
}

/// Run [`run_upgrade`] on the runtime without waiting for it.
pub fn spawn_upgrade(
    index: Arc<VectorIndex>,
    preparer: Box<dyn StrategyPreparer>,
) -> JoinHandle<UpgradeOutcome> {
    tokio::spawn(run_upgrade(index, preparer))
}

pub async fn run_upgrade(
    index: Arc<VectorIndex>,
    preparer: Box<dyn StrategyPreparer>,
) -> UpgradeOutcome {
    let target = preparer.describe();
    tracing::info!(
        target = %target,
        current = index.strategy_name(),
        "Preparing preferred ranking strategy in background"
    );

    let strategy = match preparer.prepare().await {
        Ok(strategy) => strategy,
        Err(e) => return keep_fallback(&index, &target, e.to_string()),
    };

    let rebuild_target = Arc::clone(&index);
    let rebuilt =
        tokio::task::spawn_blocking(move || rebuild_target.rebuild_with_embedder(strategy)).await;

    match rebuilt {
        Ok(Ok(())) => {
            metrics::counter!("ranking_upgrades_total", "outcome" => "upgraded").increment(1);
            tracing::info!(
                strategy = index.strategy_name(),
                tool_count = index.tool_count(),
                "Ranking strategy upgraded"
            );
            UpgradeOutcome::Upgraded {
                strategy: index.strategy_name(),
            }
        }
        Ok(Err(e)) => keep_fallback(&index, &target, e.to_string()),
        Err(e) => keep_fallback(&index, &target, format!("rebuild task failed: {}", e)),
    }
}

fn keep_fallback(index: &VectorIndex, target: &str, reason: String) -> UpgradeOutcome {
    metrics::counter!("ranking_upgrades_total", "outcome" => "fallback").increment(1);
    tracing::warn!(
        target = %target,
        current = index.strategy_name(),
        error = %reason,
        "Ranking upgrade failed, keeping fallback strategy"
    );
    UpgradeOutcome::KeptFallback { reason }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{handler_fn, Tool};
    use crate::ranking::{StaticVectorStrategy, TfIdfStrategy};
    use serde_json::{json, Value};
    use std::collections::HashMap;

    fn tools() -> Vec<Arc<Tool>> {
        ["file_read", "browser_navigate"]
            .into_iter()
            .map(|name| {
                Arc::new(Tool::internal(
                    name,
                    "test",
                    "",
                    json!({}),
                    handler_fn(|_| async { Ok(Value::Null) }),
                ))
            })
            .collect()
    }

    struct Ready;

    #[async_trait]
    impl StrategyPreparer for Ready {
        fn describe(&self) -> String {
            "ready".into()
        }

        async fn prepare(&self) -> Result<Box<dyn EmbeddingStrategy>, RankingError> {
            let table = HashMap::from([
                ("file".to_string(), vec![1.0, 0.0]),
                ("browser".to_string(), vec![0.0, 1.0]),
            ]);
            Ok(Box::new(StaticVectorStrategy::from_table(table, 2)))
        }
    }

    struct Unreachable;

    #[async_trait]
    impl StrategyPreparer for Unreachable {
        fn describe(&self) -> String {
            "unreachable".into()
        }

        async fn prepare(&self) -> Result<Box<dyn EmbeddingStrategy>, RankingError> {
            Err(RankingError::StrategyUnavailable("network down".into()))
        }
    }

    #[tokio::test]
    async fn test_upgrade_swaps_strategy() {
        let index = Arc::new(VectorIndex::build(Box::new(TfIdfStrategy::new()), tools()).unwrap());

        let outcome = spawn_upgrade(Arc::clone(&index), Box::new(Ready)).await.unwrap();

        assert_eq!(outcome, UpgradeOutcome::Upgraded { strategy: "static_vectors" });
        assert_eq!(index.strategy_name(), "static_vectors");
        let top = index.search("browser", 1).await.unwrap();
        assert_eq!(top[0].name, "browser_navigate");
    }

    #[tokio::test]
    async fn test_failed_preparation_keeps_fallback() {
        let index = Arc::new(VectorIndex::build(Box::new(TfIdfStrategy::new()), tools()).unwrap());

        let outcome = run_upgrade(Arc::clone(&index), Box::new(Unreachable)).await;

        assert!(matches!(outcome, UpgradeOutcome::KeptFallback { reason } if reason.contains("network down")));
        assert_eq!(index.strategy_name(), "tfidf");
        assert_eq!(index.search("file", 2).await.unwrap().len(), 2);
    }
}
