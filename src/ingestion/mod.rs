//! Ingestion of remote tool definitions.
//!
//! Parses MCP-style `tools/list` responses and the startup manifest, and
//! registers the resulting tools in the catalog under their server prefix.

pub mod manifest;
pub mod tools_list;
pub mod types;

pub use manifest::{load_manifest, register_manifest};
pub use tools_list::{parse_tools_list, IngestionResult};
pub use types::{RemoteTool, ServerManifest, ToolManifest};
