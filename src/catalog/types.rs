//! Core catalog types: tools, their source, and the two invocation seams
//! (local handlers and remote executors).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Arguments passed to a tool: a JSON object keyed by parameter name.
pub type Arguments = Map<String, Value>;

/// Where a tool is implemented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolSource {
    /// Executed in-process by a [`ToolHandler`].
    Internal,
    /// Proxied to a remote server through a [`ToolExecutor`].
    External,
}

impl fmt::Display for ToolSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolSource::Internal => f.write_str("internal"),
            ToolSource::External => f.write_str("external"),
        }
    }
}

/// In-process implementation of an Internal tool.
///
/// Handlers are cancelled by being dropped: the dispatcher races the returned
/// future against the caller's cancellation token and deadline.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, arguments: Arguments) -> anyhow::Result<Value>;
}

/// Remote-call capability for one external source.
///
/// `tool_name` is the remote server's own name for the tool, without the
/// `<source>_` prefix used in the catalog.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    async fn call_tool(&self, tool_name: &str, arguments: Arguments) -> anyhow::Result<Value>;
}

/// Adapter turning an async closure into a [`ToolHandler`].
pub struct FnHandler<F>(F);

#[async_trait]
impl<F, Fut> ToolHandler for FnHandler<F>
where
    F: Fn(Arguments) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
{
    async fn call(&self, arguments: Arguments) -> anyhow::Result<Value> {
        (self.0)(arguments).await
    }
}

/// Wrap an async closure as a shareable tool handler.
pub fn handler_fn<F, Fut>(f: F) -> Arc<dyn ToolHandler>
where
    F: Fn(Arguments) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
{
    Arc::new(FnHandler(f))
}

/// A single invocable tool and everything needed to find and run it.
///
/// Tools are immutable once registered; the catalog hands out `Arc<Tool>`
/// so the index and the dispatcher reference rather than copy them.
#[derive(Clone)]
pub struct Tool {
    /// Unique catalog name. External tools carry the `<source>_` prefix.
    pub name: String,
    pub category: String,
    pub description: String,
    /// JSON Schema describing accepted parameters.
    pub input_schema: Value,
    pub source: ToolSource,
    /// Name of the remote server an External tool is proxied from.
    pub source_name: Option<String>,
    /// Local implementation, present only for Internal tools.
    pub handler: Option<Arc<dyn ToolHandler>>,
}

impl Tool {
    pub fn internal(
        name: impl Into<String>,
        category: impl Into<String>,
        description: impl Into<String>,
        input_schema: Value,
        handler: Arc<dyn ToolHandler>,
    ) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            description: description.into(),
            input_schema,
            source: ToolSource::Internal,
            source_name: None,
            handler: Some(handler),
        }
    }

    /// Build an External tool whose catalog name is `<source_name>_<tool_name>`.
    pub fn external(
        source_name: &str,
        category: impl Into<String>,
        tool_name: &str,
        description: impl Into<String>,
        input_schema: Value,
    ) -> Self {
        Self {
            name: format!("{}_{}", source_name, tool_name),
            category: category.into(),
            description: description.into(),
            input_schema,
            source: ToolSource::External,
            source_name: Some(source_name.to_string()),
            handler: None,
        }
    }

    /// The name the remote server knows this tool by.
    ///
    /// Strips the `<source>_` prefix; Internal tools return their own name.
    pub fn remote_name(&self) -> &str {
        self.source_name
            .as_deref()
            .and_then(|source| self.name.strip_prefix(source))
            .and_then(|rest| rest.strip_prefix('_'))
            .unwrap_or(&self.name)
    }

    /// Names of the parameters declared under `input_schema.properties`.
    pub fn parameter_names(&self) -> impl Iterator<Item = &str> {
        self.input_schema
            .get("properties")
            .and_then(Value::as_object)
            .into_iter()
            .flat_map(|props| props.keys().map(String::as_str))
    }
}

/// Serializable view of a tool as returned by discovery and handed to
/// external ranking providers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolMetadata {
    pub name: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
}

impl ToolMetadata {
    pub fn name_only(tool: &Tool) -> Self {
        Self {
            name: tool.name.clone(),
            category: tool.category.clone(),
            description: None,
            parameters: None,
        }
    }

    pub fn with_description(tool: &Tool) -> Self {
        Self {
            description: Some(tool.description.clone()),
            ..Self::name_only(tool)
        }
    }

    /// Description plus the full input schema.
    pub fn full(tool: &Tool) -> Self {
        Self {
            parameters: tool.input_schema.is_object().then(|| tool.input_schema.clone()),
            ..Self::with_description(tool)
        }
    }
}

impl fmt::Debug for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tool")
            .field("name", &self.name)
            .field("category", &self.category)
            .field("description", &self.description)
            .field("input_schema", &self.input_schema)
            .field("source", &self.source)
            .field("source_name", &self.source_name)
            .field("handler", &self.handler.as_ref().map(|_| "<handler>"))
            .finish()
    }
}

impl PartialEq for Tool {
    fn eq(&self, other: &Self) -> bool {
        let same_handler = match (&self.handler, &other.handler) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };

        same_handler
            && self.name == other.name
            && self.category == other.category
            && self.description == other.description
            && self.input_schema == other.input_schema
            && self.source == other.source
            && self.source_name == other.source_name
    }
}
