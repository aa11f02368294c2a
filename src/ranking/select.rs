//! Startup strategy selection with graceful fallback to TF-IDF.

use super::passthrough::{PassthroughStrategy, RankingProvider};
use super::static_vectors::{StaticVectorModel, StaticVectorStrategy};
use super::tfidf::TfIdfStrategy;
use super::upgrade::{StaticVectorPreparer, StrategyPreparer};
use super::word_vectors::WordVectorStrategy;
use super::EmbeddingStrategy;
use crate::config::{RankingConfig, StrategyKind};
use crate::error::RankingError;
use std::sync::Arc;

/// What the index starts with, plus an optional background upgrade to the
/// preferred strategy.
pub struct StrategySelection {
    pub initial: Box<dyn EmbeddingStrategy>,
    pub upgrade: Option<Box<dyn StrategyPreparer>>,
}

impl StrategySelection {
    fn ready(strategy: Box<dyn EmbeddingStrategy>) -> Self {
        Self {
            initial: strategy,
            upgrade: None,
        }
    }

    fn fallback(reason: RankingError) -> Self {
        tracing::warn!(error = %reason, "Preferred ranking strategy unavailable, falling back to tfidf");
        Self::ready(Box::new(TfIdfStrategy::new()))
    }
}

/// Choose the startup strategy for `config`.
///
/// Never fails: anything unavailable degrades to TF-IDF. A static vector
/// model that is not on disk yet starts on TF-IDF and is fetched by the
/// returned upgrade.
pub fn select_strategy(
    config: &RankingConfig,
    provider: Option<Arc<dyn RankingProvider>>,
) -> StrategySelection {
    match config.strategy {
        StrategyKind::TfIdf | StrategyKind::Lexical => {
            StrategySelection::ready(Box::new(TfIdfStrategy::new()))
        }
        StrategyKind::WordVectors => StrategySelection::ready(Box::new(WordVectorStrategy::new(
            config.word_vector_window,
            config.word_vector_dimension,
        ))),
        StrategyKind::StaticVectors => {
            let Some(model) = StaticVectorModel::lookup(&config.static_vector_model) else {
                let available: Vec<&str> = StaticVectorModel::available().collect();
                return StrategySelection::fallback(RankingError::StrategyUnavailable(format!(
                    "unknown static vector model {} (available: {})",
                    config.static_vector_model,
                    available.join(", ")
                )));
            };

            let cache_dir = &config.static_vector_cache_dir;
            if model.is_cached(cache_dir) {
                match StaticVectorStrategy::load_cached(model, cache_dir) {
                    Ok(strategy) => StrategySelection::ready(Box::new(strategy)),
                    Err(e) => StrategySelection::fallback(e),
                }
            } else {
                tracing::info!(
                    model = model.id,
                    cache_dir = %cache_dir.display(),
                    "Static vectors not cached, starting with tfidf and fetching in background"
                );
                StrategySelection {
                    initial: Box::new(TfIdfStrategy::new()),
                    upgrade: Some(Box::new(StaticVectorPreparer::new(model, cache_dir.clone()))),
                }
            }
        }
        StrategyKind::Passthrough => match provider {
            Some(provider) => StrategySelection::ready(Box::new(PassthroughStrategy::new(provider))),
            None => StrategySelection::fallback(RankingError::StrategyUnavailable(
                "no external ranking provider configured".to_string(),
            )),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use tempfile::tempdir;

    struct Nobody;

    #[async_trait]
    impl RankingProvider for Nobody {
        async fn rank_tools(&self, _: &str, _: &str, _: usize) -> anyhow::Result<Vec<String>> {
            Ok(Vec::new())
        }
    }

    fn config(strategy: StrategyKind) -> RankingConfig {
        RankingConfig {
            strategy,
            ..RankingConfig::default()
        }
    }

    #[test]
    fn test_tfidf_and_word_vectors_are_immediate() {
        let selection = select_strategy(&config(StrategyKind::TfIdf), None);
        assert_eq!(selection.initial.name(), "tfidf");
        assert!(selection.upgrade.is_none());

        let selection = select_strategy(&config(StrategyKind::WordVectors), None);
        assert_eq!(selection.initial.name(), "word_vectors");
        assert_eq!(selection.initial.dimension(), 100);
    }

    #[test]
    fn test_passthrough_without_provider_falls_back() {
        let selection = select_strategy(&config(StrategyKind::Passthrough), None);
        assert_eq!(selection.initial.name(), "tfidf");

        let selection = select_strategy(&config(StrategyKind::Passthrough), Some(Arc::new(Nobody)));
        assert_eq!(selection.initial.name(), "passthrough");
    }

    #[test]
    fn test_unknown_static_model_falls_back() {
        let mut cfg = config(StrategyKind::StaticVectors);
        cfg.static_vector_model = "840B.300d".to_string();

        let selection = select_strategy(&cfg, None);
        assert_eq!(selection.initial.name(), "tfidf");
        assert!(selection.upgrade.is_none());
    }

    #[test]
    fn test_uncached_static_model_schedules_upgrade() {
        let dir = tempdir().unwrap();
        let mut cfg = config(StrategyKind::StaticVectors);
        cfg.static_vector_cache_dir = dir.path().to_path_buf();

        let selection = select_strategy(&cfg, None);
        assert_eq!(selection.initial.name(), "tfidf");
        let upgrade = selection.upgrade.unwrap();
        assert_eq!(upgrade.describe(), "static_vectors(6B.100d)");
    }

    #[test]
    fn test_cached_static_model_loads_directly() {
        let dir = tempdir().unwrap();
        let mut cfg = config(StrategyKind::StaticVectors);
        cfg.static_vector_model = "6B.50d".to_string();
        cfg.static_vector_cache_dir = dir.path().to_path_buf();

        let values: Vec<String> = (0..50).map(|i| format!("{}", i as f32 / 100.0)).collect();
        std::fs::write(
            dir.path().join("glove.6B.50d.txt"),
            format!("file {}\n", values.join(" ")),
        )
        .unwrap();

        let selection = select_strategy(&cfg, None);
        assert_eq!(selection.initial.name(), "static_vectors");
        assert_eq!(selection.initial.dimension(), 50);
        assert!(selection.upgrade.is_none());
    }
}
