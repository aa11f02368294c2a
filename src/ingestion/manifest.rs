//! Startup manifest: loads remote server tool listings from disk and
//! registers them in the catalog as External tools.

use crate::catalog::Catalog;
use crate::error::AppError;
use crate::ingestion::tools_list::{parse_tools_list, IngestionResult};
use crate::ingestion::types::ToolManifest;
use std::fs;
use std::path::Path;

pub fn load_manifest(path: &Path) -> IngestionResult<ToolManifest> {
    let data = fs::read_to_string(path).map_err(|e| {
        AppError::IngestionError(format!("Failed to read manifest {}: {}", path.display(), e))
    })?;

    let manifest: ToolManifest = serde_json::from_str(&data).map_err(|e| {
        AppError::IngestionError(format!("Failed to parse manifest {}: {}", path.display(), e))
    })?;

    tracing::info!(
        path = %path.display(),
        servers = manifest.servers.len(),
        "Tool manifest loaded"
    );

    Ok(manifest)
}

/// Register every tool of every enabled server.
///
/// Failures are per server or per tool: a bad listing or a rejected tool is
/// logged and skipped. Returns the number of tools registered.
pub fn register_manifest(catalog: &mut Catalog, manifest: &ToolManifest) -> usize {
    let mut registered = 0;

    for (server, entry) in &manifest.servers {
        if !entry.enabled {
            tracing::info!(server = %server, "Skipping disabled server");
            continue;
        }

        let tools = match parse_tools_list(&entry.tools) {
            Ok(tools) => tools,
            Err(e) => {
                tracing::error!(server = %server, error = %e, "Failed to read server tool listing");
                continue;
            }
        };

        let category = entry.category.as_deref().unwrap_or(server);
        let mut server_count = 0;
        for tool in tools {
            match catalog.register_external_tool(
                server,
                category,
                &tool.name,
                &tool.description,
                tool.input_schema,
            ) {
                Ok(()) => server_count += 1,
                Err(e) => {
                    tracing::warn!(server = %server, tool = %tool.name, error = %e, "Failed to register external tool");
                }
            }
        }

        tracing::info!(server = %server, tools = server_count, "Registered server tools");
        registered += server_count;
    }

    registered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ToolSource;
    use serde_json::json;
    use tempfile::tempdir;

    fn manifest() -> ToolManifest {
        serde_json::from_value(json!({
            "servers": {
                "fs": {
                    "category": "filesystem",
                    "tools": { "result": { "tools": [
                        { "name": "read", "description": "Read a file" },
                        { "name": "write", "description": "Write a file" }
                    ] } }
                },
                "playwright": {
                    "tools": [
                        { "name": "browser_navigate", "description": "Navigate to a URL" }
                    ]
                },
                "broken": { "tools": { "oops": true } },
                "off": { "enabled": false, "tools": [ { "name": "hidden" } ] }
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_register_manifest() {
        let mut catalog = Catalog::new();
        let count = register_manifest(&mut catalog, &manifest());

        assert_eq!(count, 3);
        let read = catalog.get("fs_read").unwrap();
        assert_eq!(read.category, "filesystem");
        assert_eq!(read.source, ToolSource::External);
        assert_eq!(read.remote_name(), "read");

        let nav = catalog.get("playwright_browser_navigate").unwrap();
        assert_eq!(nav.category, "playwright");
        assert!(catalog.get("off_hidden").is_err());
    }

    #[test]
    fn test_register_manifest_skips_duplicates() {
        let mut catalog = Catalog::new();
        let manifest = manifest();

        assert_eq!(register_manifest(&mut catalog, &manifest), 3);
        assert_eq!(register_manifest(&mut catalog, &manifest), 0);
        assert_eq!(catalog.len(), 3);
    }

    #[test]
    fn test_load_manifest_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tools.json");
        std::fs::write(
            &path,
            r#"{"servers": {"fs": {"tools": [{"name": "read"}]}}}"#,
        )
        .unwrap();

        let manifest = load_manifest(&path).unwrap();
        assert_eq!(manifest.servers.len(), 1);
        assert!(manifest.servers["fs"].enabled);
    }

    #[test]
    fn test_load_manifest_errors() {
        let dir = tempdir().unwrap();
        assert!(load_manifest(&dir.path().join("missing.json")).is_err());

        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(load_manifest(&path), Err(AppError::IngestionError(_))));
    }
}
