use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Which ranking strategy the service prefers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    /// TF-IDF over the tool corpus. Always available.
    TfIdf,
    /// Co-occurrence word vectors trained on the tool corpus.
    WordVectors,
    /// Pre-trained static word vectors, downloaded on first use.
    StaticVectors,
    /// External ranking provider, no embeddings. Needs a `RankingProvider`
    /// passed to `AppState::new`; the stock binary has none and falls back
    /// to TF-IDF.
    Passthrough,
    /// No index; substring search with a fuzzy fallback.
    Lexical,
}

impl StrategyKind {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "tfidf" | "tf-idf" => Some(Self::TfIdf),
            "word_vectors" | "word2vec" => Some(Self::WordVectors),
            "static_vectors" | "glove" => Some(Self::StaticVectors),
            "passthrough" => Some(Self::Passthrough),
            "lexical" | "none" => Some(Self::Lexical),
            _ => None,
        }
    }

    /// Read `RANKING_STRATEGY`. Unknown names fall back to TF-IDF.
    pub fn from_env() -> Self {
        let raw = env::var("RANKING_STRATEGY").unwrap_or_default();
        if raw.is_empty() {
            return Self::TfIdf;
        }
        Self::parse(&raw).unwrap_or_else(|| {
            tracing::warn!(strategy = %raw, "Unknown ranking strategy, using tfidf");
            Self::TfIdf
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TfIdf => "tfidf",
            Self::WordVectors => "word_vectors",
            Self::StaticVectors => "static_vectors",
            Self::Passthrough => "passthrough",
            Self::Lexical => "lexical",
        }
    }
}

#[derive(Debug, Clone)]
pub struct RankingConfig {
    pub strategy: StrategyKind,
    /// Co-occurrence window for word vectors.
    pub word_vector_window: usize,
    pub word_vector_dimension: usize,
    /// Static vector model id, e.g. `6B.100d`.
    pub static_vector_model: String,
    /// Where downloaded vector models and their binary caches live.
    pub static_vector_cache_dir: PathBuf,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::TfIdf,
            word_vector_window: 5,
            word_vector_dimension: 100,
            static_vector_model: "6B.100d".to_string(),
            static_vector_cache_dir: env::temp_dir().join("toolscout-vectors"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub shutdown_timeout_secs: u64,
    /// Optional path to a tool manifest loaded at startup. Manifest tools
    /// are searchable, but the stock binary registers no `ToolExecutor`, so
    /// calling them reports `executor_not_found` until an embedder wires one
    /// in with `Catalog::register_external_executor`.
    pub tools_path: Option<PathBuf>,
    /// Page size for discovery searches.
    pub search_result_limit: usize,
    /// Per-call execution deadline in seconds. 0 disables it.
    pub execution_timeout_secs: u64,
    /// Maximum invocations per batch request.
    pub max_batch_size: usize,
    pub ranking: RankingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            shutdown_timeout_secs: 30,
            tools_path: None,
            search_result_limit: 5,
            execution_timeout_secs: 60,
            max_batch_size: 50,
            ranking: RankingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables with sensible defaults.
    ///
    /// Malformed numbers are an error; an unknown `RANKING_STRATEGY` is not.
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = RankingConfig::default();

        let ranking = RankingConfig {
            strategy: StrategyKind::from_env(),
            word_vector_window: env::var("WORD_VECTOR_WINDOW")
                .unwrap_or_else(|_| "5".to_string())
                .parse()?,
            word_vector_dimension: env::var("WORD_VECTOR_DIMENSION")
                .unwrap_or_else(|_| "100".to_string())
                .parse()?,
            static_vector_model: env::var("STATIC_VECTOR_MODEL")
                .unwrap_or(defaults.static_vector_model),
            static_vector_cache_dir: env::var("STATIC_VECTOR_CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.static_vector_cache_dir),
        };

        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()?,
            shutdown_timeout_secs: env::var("SHUTDOWN_TIMEOUT")
                .unwrap_or_else(|_| "30".to_string())
                .parse()?,
            tools_path: env::var("TOOLS_PATH").ok().map(PathBuf::from),
            search_result_limit: env::var("SEARCH_RESULT_LIMIT")
                .unwrap_or_else(|_| "5".to_string())
                .parse()?,
            execution_timeout_secs: env::var("EXECUTION_TIMEOUT_SECS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()?,
            max_batch_size: env::var("MAX_BATCH_SIZE")
                .unwrap_or_else(|_| "50".to_string())
                .parse()?,
            ranking,
        })
    }

    pub fn execution_timeout(&self) -> Option<Duration> {
        (self.execution_timeout_secs > 0).then(|| Duration::from_secs(self.execution_timeout_secs))
    }
}
