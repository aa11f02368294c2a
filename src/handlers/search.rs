//! Tool discovery handler.

use crate::discovery::{SearchPage, SearchRequest};
use crate::error::{AppError, Result};
use crate::state::AppState;
use axum::{extract::State, Json};
use std::sync::Arc;

/// Longest query accepted, in characters.
const MAX_QUERY_CHARS: usize = 2048;

/// POST /search - Find tools relevant to a natural language query.
///
/// Returns one page of results at the requested detail level. Ranking
/// failures produce an empty page rather than an error status.
pub async fn search_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchPage>> {
    if !state.is_ready() {
        return Err(AppError::ResourceError(
            "Search index is not ready".to_string(),
        ));
    }

    if request.query.chars().count() > MAX_QUERY_CHARS {
        return Err(AppError::ValidationError(format!(
            "Query exceeds {} characters",
            MAX_QUERY_CHARS
        )));
    }

    let page = state.discovery.search(&request).await;
    Ok(Json(page))
}
