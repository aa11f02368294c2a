//! Tool catalog: the source of truth for every tool's identity, metadata and
//! invocation route.
//!
//! The catalog is populated through `&mut self` during startup and then
//! frozen behind an `Arc`, after which it is only read. Concurrent readers
//! therefore need no locking.

pub mod fuzzy;
pub mod types;

pub use fuzzy::{fuzzy_match, levenshtein_distance};
pub use types::{
    handler_fn, Arguments, FnHandler, Tool, ToolExecutor, ToolHandler, ToolMetadata, ToolSource,
};

use crate::error::CatalogError;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Default)]
pub struct Catalog {
    tools: HashMap<String, Arc<Tool>>,
    executors: HashMap<String, Arc<dyn ToolExecutor>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tool.
    ///
    /// # Errors
    /// - `InvalidTool` for an empty name, or an External tool that carries a
    ///   handler or lacks a source name
    /// - `MissingHandler` for an Internal tool without a handler
    /// - `DuplicateName` if the name is already registered
    pub fn register(&mut self, tool: Tool) -> Result<(), CatalogError> {
        if tool.name.is_empty() {
            return Err(CatalogError::InvalidTool(
                "tool name cannot be empty".to_string(),
            ));
        }

        match tool.source {
            ToolSource::Internal if tool.handler.is_none() => {
                return Err(CatalogError::MissingHandler(tool.name));
            }
            ToolSource::External if tool.handler.is_some() => {
                return Err(CatalogError::InvalidTool(format!(
                    "external tool {} cannot carry a local handler",
                    tool.name
                )));
            }
            ToolSource::External if tool.source_name.as_deref().unwrap_or("").is_empty() => {
                return Err(CatalogError::InvalidTool(format!(
                    "external tool {} has no source server",
                    tool.name
                )));
            }
            _ => {}
        }

        if self.tools.contains_key(&tool.name) {
            return Err(CatalogError::DuplicateName(tool.name));
        }

        tracing::info!(
            name = %tool.name,
            category = %tool.category,
            source = %tool.source,
            "Registered tool"
        );

        self.tools.insert(tool.name.clone(), Arc::new(tool));
        Ok(())
    }

    /// Associate a remote-call capability with a source name. Last write wins.
    pub fn register_external_executor(
        &mut self,
        source_name: impl Into<String>,
        executor: Arc<dyn ToolExecutor>,
    ) {
        let source_name = source_name.into();
        tracing::info!(source = %source_name, "Registered external tool executor");
        self.executors.insert(source_name, executor);
    }

    /// Register a tool listed by a remote server under the name
    /// `<source_name>_<tool_name>`.
    pub fn register_external_tool(
        &mut self,
        source_name: &str,
        category: &str,
        tool_name: &str,
        description: &str,
        input_schema: Value,
    ) -> Result<(), CatalogError> {
        self.register(Tool::external(
            source_name,
            category,
            tool_name,
            description,
            input_schema,
        ))
    }

    pub fn get(&self, name: &str) -> Result<Arc<Tool>, CatalogError> {
        self.tools
            .get(name)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(name.to_string()))
    }

    pub fn executor(&self, source_name: &str) -> Option<Arc<dyn ToolExecutor>> {
        self.executors.get(source_name).cloned()
    }

    pub fn has_executor(&self, source_name: &str) -> bool {
        self.executors.contains_key(source_name)
    }

    /// Every registered tool. Order is unspecified.
    pub fn list_all(&self) -> Vec<Arc<Tool>> {
        self.tools.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Plain, unranked search: case-insensitive substring match on name or
    /// description, optionally restricted to one category. An empty query
    /// matches every tool.
    pub fn search(&self, query: &str, category: Option<&str>) -> Vec<Arc<Tool>> {
        let query = query.to_lowercase();

        self.in_category(category)
            .filter(|tool| {
                query.is_empty()
                    || tool.name.to_lowercase().contains(&query)
                    || tool.description.to_lowercase().contains(&query)
            })
            .cloned()
            .collect()
    }

    /// Typo-tolerant variant of [`Catalog::search`]: every whitespace-separated
    /// query word must fuzzy-match the tool's name or description.
    pub fn fuzzy_search(&self, query: &str, category: Option<&str>) -> Vec<Arc<Tool>> {
        let words: Vec<&str> = query.split_whitespace().collect();

        self.in_category(category)
            .filter(|tool| {
                words.iter().all(|word| {
                    fuzzy_match(word, &tool.name) || fuzzy_match(word, &tool.description)
                })
            })
            .cloned()
            .collect()
    }

    fn in_category<'a>(
        &'a self,
        category: Option<&'a str>,
    ) -> impl Iterator<Item = &'a Arc<Tool>> + 'a {
        self.tools
            .values()
            .filter(move |tool| category.map_or(true, |c| c.is_empty() || tool.category == c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn noop_tool(name: &str, category: &str, description: &str) -> Tool {
        Tool::internal(
            name,
            category,
            description,
            json!({"type": "object"}),
            handler_fn(|_| async { Ok(json!({"result": "success"})) }),
        )
    }

    fn sorted_names(tools: &[Arc<Tool>]) -> Vec<String> {
        let mut names: Vec<String> = tools.iter().map(|t| t.name.clone()).collect();
        names.sort();
        names
    }

    #[test]
    fn test_register_then_get_round_trips() {
        let mut catalog = Catalog::new();
        let tool = noop_tool("test_tool", "test", "Test tool");
        catalog.register(tool.clone()).unwrap();

        let fetched = catalog.get("test_tool").unwrap();
        assert_eq!(*fetched, tool);
    }

    #[test]
    fn test_register_empty_name_is_invalid() {
        let mut catalog = Catalog::new();
        let err = catalog.register(noop_tool("", "test", "")).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidTool(_)));
    }

    #[test]
    fn test_register_internal_without_handler_fails() {
        let mut catalog = Catalog::new();
        let mut tool = noop_tool("bare", "test", "");
        tool.handler = None;

        let err = catalog.register(tool).unwrap_err();
        assert_eq!(err, CatalogError::MissingHandler("bare".into()));
    }

    #[test]
    fn test_register_external_with_handler_fails() {
        let mut catalog = Catalog::new();
        let mut tool = Tool::external("fs", "filesystem", "read", "", json!({}));
        tool.handler = Some(handler_fn(|_| async { Ok(Value::Null) }));

        let err = catalog.register(tool).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidTool(_)));
    }

    #[test]
    fn test_register_duplicate_fails() {
        let mut catalog = Catalog::new();
        catalog.register(noop_tool("dup", "test", "")).unwrap();

        let err = catalog.register(noop_tool("dup", "other", "")).unwrap_err();
        assert_eq!(err, CatalogError::DuplicateName("dup".into()));
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_get_unknown_is_not_found() {
        let catalog = Catalog::new();
        assert_eq!(
            catalog.get("missing").unwrap_err(),
            CatalogError::NotFound("missing".into())
        );
    }

    #[test]
    fn test_register_external_tool_prefixes_name() {
        let mut catalog = Catalog::new();
        catalog
            .register_external_tool("fs", "filesystem", "read", "Read a file", json!({}))
            .unwrap();

        let tool = catalog.get("fs_read").unwrap();
        assert_eq!(tool.source, ToolSource::External);
        assert_eq!(tool.source_name.as_deref(), Some("fs"));
        assert!(catalog.get("read").is_err());
    }

    #[test]
    fn test_list_all_returns_every_tool() {
        let mut catalog = Catalog::new();
        catalog.register(noop_tool("a", "x", "")).unwrap();
        catalog.register(noop_tool("b", "y", "")).unwrap();

        assert_eq!(sorted_names(&catalog.list_all()), vec!["a", "b"]);
    }

    #[test]
    fn test_search_substring_and_category() {
        let mut catalog = Catalog::new();
        catalog
            .register(noop_tool("browser_navigate", "browser", "Navigate to a URL"))
            .unwrap();
        catalog
            .register(noop_tool("browser_click", "browser", "Click on element"))
            .unwrap();
        catalog
            .register(noop_tool("file_read", "filesystem", "Read contents of a file"))
            .unwrap();

        assert_eq!(
            sorted_names(&catalog.search("BROWSER", None)),
            vec!["browser_click", "browser_navigate"]
        );
        assert_eq!(sorted_names(&catalog.search("url", None)), vec!["browser_navigate"]);
        assert_eq!(
            sorted_names(&catalog.search("", Some("filesystem"))),
            vec!["file_read"]
        );
        assert!(catalog.search("browser", Some("filesystem")).is_empty());
        assert_eq!(catalog.search("", None).len(), 3);
    }

    #[test]
    fn test_fuzzy_search_tolerates_typos() {
        let mut catalog = Catalog::new();
        catalog
            .register(noop_tool("browser_navigate", "browser", "Navigate to a URL"))
            .unwrap();
        catalog
            .register(noop_tool("file_read", "filesystem", "Read contents of a file"))
            .unwrap();

        assert!(catalog.search("navgate", None).is_empty());
        assert_eq!(
            sorted_names(&catalog.fuzzy_search("navgate", None)),
            vec!["browser_navigate"]
        );
        assert_eq!(
            sorted_names(&catalog.fuzzy_search("contnts fil", None)),
            vec!["file_read"]
        );
        assert!(catalog.fuzzy_search("navgate", Some("filesystem")).is_empty());
    }
}
