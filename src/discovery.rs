//! Discovery: paginated, category-filtered tool search with selectable
//! detail levels.
//!
//! Ranked search over-fetches from the index (three pages' worth, or enough
//! to cover the requested offset) and filters by category afterwards, so
//! `total_count` counts matches within that candidate pool.

use crate::catalog::{Catalog, Tool, ToolMetadata};
use crate::ranking::VectorIndex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Instant;

/// How much of each tool a search returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetailLevel {
    /// Name and category.
    NamesOnly,
    /// Adds the description.
    #[default]
    Summary,
    /// Adds the declared parameters and which are required.
    Detailed,
    /// Adds the complete input schema.
    FullSchema,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub detail_level: DetailLevel,
    #[serde(default)]
    pub offset: usize,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchPage {
    pub total_count: usize,
    pub returned_count: usize,
    pub offset: usize,
    pub limit: usize,
    pub has_more: bool,
    pub tools: Vec<ToolMetadata>,
}

pub enum SearchBackend {
    /// Semantic ranking through the vector index.
    Ranked(Arc<VectorIndex>),
    /// Substring match over the catalog with a typo-tolerant fallback.
    Lexical,
}

pub struct Discovery {
    catalog: Arc<Catalog>,
    backend: SearchBackend,
    limit: usize,
}

impl Discovery {
    pub fn new(catalog: Arc<Catalog>, backend: SearchBackend, limit: usize) -> Self {
        Self {
            catalog,
            backend,
            limit,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Name of the strategy currently answering searches.
    pub fn strategy_name(&self) -> &'static str {
        match &self.backend {
            SearchBackend::Ranked(index) => index.strategy_name(),
            SearchBackend::Lexical => "lexical",
        }
    }

    /// Run a search. Ranking failures are logged and yield an empty page.
    pub async fn search(&self, request: &SearchRequest) -> SearchPage {
        let start = Instant::now();
        let category = request.category.as_deref().filter(|c| !c.is_empty());

        tracing::info!(
            query = %request.query,
            category = ?category,
            detail_level = ?request.detail_level,
            offset = request.offset,
            limit = self.limit,
            "Tool search request"
        );

        let candidates = match &self.backend {
            SearchBackend::Ranked(index) => {
                let pool = self
                    .limit
                    .saturating_mul(3)
                    .max(request.offset.saturating_add(self.limit));
                match index.search(&request.query, pool).await {
                    Ok(ranked) => {
                        let before = ranked.len();
                        let filtered: Vec<Arc<Tool>> = ranked
                            .into_iter()
                            .filter(|tool| category.map_or(true, |c| tool.category == c))
                            .collect();
                        if category.is_some() {
                            tracing::debug!(before, after = filtered.len(), "Applied category filter");
                        }
                        filtered
                    }
                    Err(e) => {
                        tracing::error!(error = %e, query = %request.query, "Semantic search failed");
                        metrics::counter!("search_failures_total").increment(1);
                        Vec::new()
                    }
                }
            }
            SearchBackend::Lexical => {
                let mut found = self.catalog.search(&request.query, category);
                if found.is_empty() && !request.query.trim().is_empty() {
                    found = self.catalog.fuzzy_search(&request.query, category);
                }
                found.sort_by(|a, b| a.name.cmp(&b.name));
                found
            }
        };

        let page = paginate(&candidates, request.offset, self.limit, request.detail_level);

        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
        metrics::counter!("search_requests_total").increment(1);
        metrics::histogram!("search_latency_ms").record(elapsed_ms);

        tracing::info!(
            total_found = page.total_count,
            returned = page.returned_count,
            latency_ms = elapsed_ms,
            "Tool search response"
        );

        page
    }
}

/// Slice `tools` into one page.
///
/// `returned_count` is `min(limit, total - offset)` (0 past the end) and
/// `has_more` is true exactly when tools remain after this page.
pub fn paginate(
    tools: &[Arc<Tool>],
    offset: usize,
    limit: usize,
    detail: DetailLevel,
) -> SearchPage {
    let total = tools.len();
    let start = offset.min(total);
    let end = start.saturating_add(limit).min(total);

    let page: Vec<ToolMetadata> = tools[start..end]
        .iter()
        .map(|tool| describe(tool, detail))
        .collect();

    SearchPage {
        total_count: total,
        returned_count: page.len(),
        offset,
        limit,
        has_more: end < total,
        tools: page,
    }
}

pub fn describe(tool: &Tool, detail: DetailLevel) -> ToolMetadata {
    match detail {
        DetailLevel::NamesOnly => ToolMetadata::name_only(tool),
        DetailLevel::Summary => ToolMetadata::with_description(tool),
        DetailLevel::Detailed => ToolMetadata {
            parameters: parameter_summary(&tool.input_schema),
            ..ToolMetadata::with_description(tool)
        },
        DetailLevel::FullSchema => ToolMetadata::full(tool),
    }
}

/// `properties` and `required` from an object schema.
fn parameter_summary(schema: &Value) -> Option<Value> {
    let schema = schema.as_object()?;
    let mut summary = Map::new();
    for key in ["properties", "required"] {
        if let Some(value) = schema.get(key) {
            summary.insert(key.to_string(), value.clone());
        }
    }
    Some(Value::Object(summary))
}
