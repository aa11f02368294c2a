pub mod execute;
pub mod health;
pub mod search;

pub use execute::{execute_batch_handler, execute_handler};
pub use health::{health_handler, ready_handler};
pub use search::search_handler;

use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// API routes. Metrics and middleware are layered on by the binary.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler))
        .route("/search", post(search_handler))
        .route("/execute", post(execute_handler))
        .route("/execute/batch", post(execute_batch_handler))
        .with_state(state)
}
