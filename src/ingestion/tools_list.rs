//! Parsing of remote `tools/list` responses into [`RemoteTool`] records.

use crate::error::AppError;
use crate::ingestion::types::{empty_object_schema, RemoteTool};
use serde_json::Value;

/// Result type for ingestion operations
pub type IngestionResult<T> = std::result::Result<T, AppError>;

/// Parse a tool listing.
///
/// Accepts a full JSON-RPC response (`result.tools`), a bare result object
/// (`tools`), or a plain array of tool definitions.
///
/// # Errors
/// Returns `AppError::IngestionError` if no tools array can be found, or if
/// every entry of a non-empty array is malformed. Individual malformed
/// entries are logged and skipped.
pub fn parse_tools_list(json: &Value) -> IngestionResult<Vec<RemoteTool>> {
    let tools_array = extract_tools_array(json)?;

    let mut results = Vec::with_capacity(tools_array.len());
    for (idx, tool_value) in tools_array.iter().enumerate() {
        match normalize_tool(tool_value) {
            Ok(tool) => results.push(tool),
            Err(e) => {
                tracing::warn!(
                    index = idx,
                    error = %e,
                    "Skipping malformed tool definition"
                );
            }
        }
    }

    if results.is_empty() && !tools_array.is_empty() {
        return Err(AppError::IngestionError(
            "All tool definitions failed to parse".into(),
        ));
    }

    tracing::debug!(
        total = tools_array.len(),
        parsed = results.len(),
        "Tool listing parsed"
    );

    Ok(results)
}

fn extract_tools_array(json: &Value) -> IngestionResult<&Vec<Value>> {
    json.get("result")
        .and_then(|r| r.get("tools"))
        .or_else(|| json.get("tools"))
        .unwrap_or(json)
        .as_array()
        .ok_or_else(|| {
            AppError::IngestionError(
                "Expected a tools array, 'tools' or 'result.tools' in tool listing".into(),
            )
        })
}

fn normalize_tool(tool_value: &Value) -> IngestionResult<RemoteTool> {
    let name = tool_value
        .get("name")
        .and_then(|v| v.as_str())
        .filter(|name| !name.is_empty())
        .ok_or_else(|| {
            AppError::IngestionError(format!(
                "Tool missing required 'name' field: {:?}",
                tool_value.get("name")
            ))
        })?;

    let description = tool_value
        .get("description")
        .and_then(|v| v.as_str())
        .unwrap_or("");

    let input_schema = match tool_value.get("inputSchema") {
        Some(schema) if schema.is_object() => schema.clone(),
        _ => empty_object_schema(),
    };

    Ok(RemoteTool {
        name: name.to_string(),
        description: description.to_string(),
        input_schema,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_jsonrpc_response() {
        let response = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": {
                "tools": [{
                    "name": "calculate_sum",
                    "description": "Add two numbers.",
                    "inputSchema": {
                        "type": "object",
                        "properties": {
                            "a": { "type": "number", "description": "First number" },
                            "b": { "type": "number" }
                        },
                        "required": ["a", "b"]
                    }
                }]
            }
        });

        let tools = parse_tools_list(&response).unwrap();

        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "calculate_sum");
        assert_eq!(tools[0].description, "Add two numbers.");
        assert_eq!(tools[0].input_schema["required"], json!(["a", "b"]));
    }

    #[test]
    fn test_parse_result_object_and_bare_array() {
        let result = json!({ "tools": [{ "name": "a" }] });
        assert_eq!(parse_tools_list(&result).unwrap()[0].name, "a");

        let array = json!([{ "name": "b" }, { "name": "c" }]);
        let names: Vec<String> = parse_tools_list(&array)
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["b", "c"]);
    }

    #[test]
    fn test_parse_missing_tools_returns_error() {
        let response = json!({ "jsonrpc": "2.0" });
        assert!(parse_tools_list(&response).is_err());
    }

    #[test]
    fn test_null_description_and_schema_get_defaults() {
        let response = json!([{ "name": "bare", "description": null, "inputSchema": null }]);

        let tools = parse_tools_list(&response).unwrap();
        assert_eq!(tools[0].description, "");
        assert_eq!(tools[0].input_schema, json!({"type": "object", "properties": {}}));
    }

    #[test]
    fn test_missing_name_skips_tool() {
        let response = json!({
            "result": {
                "tools": [
                    { "description": "No name here" },
                    { "name": "", "description": "Empty name" },
                    { "name": "valid_tool", "description": "Has name" }
                ]
            }
        });

        let tools = parse_tools_list(&response).unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "valid_tool");
    }

    #[test]
    fn test_all_malformed_is_error() {
        let response = json!([{ "description": "x" }, 42]);
        assert!(matches!(
            parse_tools_list(&response),
            Err(AppError::IngestionError(_))
        ));
    }

    #[test]
    fn test_empty_tools_array_returns_empty_vec() {
        let response = json!({ "result": { "tools": [] } });
        assert!(parse_tools_list(&response).unwrap().is_empty());
    }
}
