use crate::catalog::Catalog;
use crate::config::{Config, StrategyKind};
use crate::discovery::{Discovery, SearchBackend};
use crate::dispatch::Dispatcher;
use crate::error::Result;
use crate::ranking::{
    select_strategy, spawn_upgrade, RankingProvider, StrategyPreparer, UpgradeOutcome, VectorIndex,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Application state shared across all request handlers.
///
/// The catalog is frozen before the state is built; everything reachable
/// from here is either immutable or internally synchronized.
pub struct AppState {
    pub catalog: Arc<Catalog>,
    pub discovery: Arc<Discovery>,
    pub dispatcher: Arc<Dispatcher>,
    /// Present unless the lexical backend was configured.
    pub index: Option<Arc<VectorIndex>>,
    /// Cancelled on shutdown. Every request token is a child of it.
    pub shutdown: CancellationToken,
    /// Flag indicating the service is ready (index built)
    pub ready: AtomicBool,
    pub config: Arc<Config>,
    pending_upgrade: Mutex<Option<Box<dyn StrategyPreparer>>>,
}

impl AppState {
    /// Build the search backend and dispatcher over a populated catalog.
    ///
    /// `provider` backs the passthrough strategy; without one it falls back
    /// to TF-IDF. Tools are indexed in name order so rebuilds over the same
    /// catalog rank identically.
    pub fn new(
        config: Config,
        catalog: Catalog,
        provider: Option<Arc<dyn RankingProvider>>,
    ) -> Result<Self> {
        let catalog = Arc::new(catalog);
        tracing::info!(tool_count = catalog.len(), "Catalog frozen");

        let (backend, index, pending_upgrade) = match config.ranking.strategy {
            StrategyKind::Lexical => (SearchBackend::Lexical, None, None),
            _ => {
                let selection = select_strategy(&config.ranking, provider);

                let mut tools = catalog.list_all();
                tools.sort_by(|a, b| a.name.cmp(&b.name));
                let index = Arc::new(VectorIndex::build(selection.initial, tools)?);

                (
                    SearchBackend::Ranked(Arc::clone(&index)),
                    Some(index),
                    selection.upgrade,
                )
            }
        };

        let discovery = Discovery::new(Arc::clone(&catalog), backend, config.search_result_limit);
        let dispatcher =
            Dispatcher::new(Arc::clone(&catalog)).with_timeout(config.execution_timeout());

        let state = Self {
            catalog,
            discovery: Arc::new(discovery),
            dispatcher: Arc::new(dispatcher),
            index,
            shutdown: CancellationToken::new(),
            ready: AtomicBool::new(false),
            config: Arc::new(config),
            pending_upgrade: Mutex::new(pending_upgrade),
        };

        state.ready.store(true, Ordering::SeqCst);
        tracing::info!(strategy = state.discovery.strategy_name(), "Search backend ready");

        Ok(state)
    }

    /// Start the background upgrade chosen at startup, if any. Subsequent
    /// calls return None.
    pub fn start_ranking_upgrade(&self) -> Option<JoinHandle<UpgradeOutcome>> {
        let preparer = self.pending_upgrade.lock().take()?;
        let index = self.index.as_ref()?;
        Some(spawn_upgrade(Arc::clone(index), preparer))
    }

    /// Check if the service is ready to handle requests.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    /// Token for one request; cancelled when the service shuts down.
    pub fn request_token(&self) -> CancellationToken {
        self.shutdown.child_token()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::register_builtin_tools;
    use crate::config::RankingConfig;
    use tempfile::tempdir;

    fn catalog() -> Catalog {
        let mut catalog = Catalog::new();
        register_builtin_tools(&mut catalog).unwrap();
        catalog
    }

    #[test]
    fn test_state_with_default_strategy() {
        let state = AppState::new(Config::default(), catalog(), None).unwrap();

        assert!(state.is_ready());
        assert_eq!(state.discovery.strategy_name(), "tfidf");
        assert_eq!(state.index.as_ref().unwrap().tool_count(), 2);
        assert!(state.start_ranking_upgrade().is_none());
    }

    #[test]
    fn test_state_with_lexical_backend() {
        let config = Config {
            ranking: RankingConfig {
                strategy: StrategyKind::Lexical,
                ..RankingConfig::default()
            },
            ..Config::default()
        };
        let state = AppState::new(config, catalog(), None).unwrap();

        assert!(state.index.is_none());
        assert_eq!(state.discovery.strategy_name(), "lexical");
    }

    #[test]
    fn test_request_tokens_follow_shutdown() {
        let state = AppState::new(Config::default(), catalog(), None).unwrap();
        let token = state.request_token();

        state.shutdown.cancel();
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn test_uncached_static_vectors_start_on_tfidf() {
        let dir = tempdir().unwrap();
        let config = Config {
            ranking: RankingConfig {
                strategy: StrategyKind::StaticVectors,
                static_vector_cache_dir: dir.path().to_path_buf(),
                ..RankingConfig::default()
            },
            ..Config::default()
        };
        let state = AppState::new(config, catalog(), None).unwrap();

        assert_eq!(state.discovery.strategy_name(), "tfidf");
        assert!(state.pending_upgrade.lock().is_some());
    }
}
