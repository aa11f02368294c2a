//! Type definitions for the ingestion module.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// One tool as listed by a remote server, before it is prefixed and
/// registered in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteTool {
    /// The server's own name for the tool.
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "inputSchema", default = "empty_object_schema")]
    pub input_schema: Value,
}

pub(crate) fn empty_object_schema() -> Value {
    json!({"type": "object", "properties": {}})
}

/// Startup manifest describing remote servers and the tools they expose.
///
/// ```json
/// {
///   "servers": {
///     "filesystem": {
///       "category": "filesystem",
///       "tools": { "result": { "tools": [ { "name": "read", ... } ] } }
///     }
///   }
/// }
/// ```
///
/// `tools` accepts anything [`parse_tools_list`](super::parse_tools_list)
/// does.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToolManifest {
    #[serde(default)]
    pub servers: BTreeMap<String, ServerManifest>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerManifest {
    /// Category for every tool of this server. Defaults to the server name.
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    #[serde(default)]
    pub tools: Value,
}

fn enabled_by_default() -> bool {
    true
}
