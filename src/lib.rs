//! toolscout - tool discovery and execution service
//!
//! A catalog of invocable tools, semantic ranking over their descriptions,
//! paginated discovery, and a dispatcher that routes calls to in-process
//! handlers or remote executors. The library is exposed for integration
//! tests and embedding.

pub mod builtin;
pub mod catalog;
pub mod config;
pub mod discovery;
pub mod dispatch;
pub mod error;
pub mod handlers;
pub mod ingestion;
pub mod persistence;
pub mod ranking;
pub mod state;

// Re-export key types for convenience
pub use catalog::{Catalog, Tool, ToolExecutor, ToolHandler, ToolSource};
pub use config::Config;
pub use discovery::{DetailLevel, Discovery, SearchPage, SearchRequest};
pub use dispatch::{BatchExecutionResult, Dispatcher, ExecutionResult, ToolInvocation};
pub use error::{AppError, CatalogError, RankingError, Result};
pub use ranking::{EmbeddingStrategy, VectorIndex};
pub use state::AppState;
