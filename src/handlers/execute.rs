//! Tool execution handlers.
//!
//! Tool-level failures (unknown tool, missing executor, handler error,
//! timeout) are reported inside a 200 response body; only malformed
//! requests get an error status.

use crate::catalog::Arguments;
use crate::dispatch::{BatchExecutionResult, ExecutionResult, ToolInvocation};
use crate::error::{AppError, Result};
use crate::state::AppState;
use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct ExecuteRequest {
    pub tool_name: String,
    /// Tool arguments. Must be an object; null or absent means none.
    #[serde(default)]
    pub arguments: Value,
}

#[derive(Debug, Deserialize)]
pub struct BatchExecuteRequest {
    pub tools: Vec<ExecuteRequest>,
    #[serde(default)]
    pub continue_on_error: bool,
}

/// POST /execute - Run one tool.
pub async fn execute_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ExecuteRequest>,
) -> Result<Json<ExecutionResult>> {
    let arguments = into_arguments(request.arguments)?;
    let cancel = state.request_token();

    let result = state
        .dispatcher
        .execute(&request.tool_name, arguments, &cancel)
        .await;

    Ok(Json(result))
}

/// POST /execute/batch - Run tools sequentially in request order.
///
/// Without `continue_on_error` the batch stops after the first failure, and
/// the response holds the results up to and including it.
pub async fn execute_batch_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<BatchExecuteRequest>,
) -> Result<Json<BatchExecutionResult>> {
    let max = state.config.max_batch_size;
    if request.tools.len() > max {
        return Err(AppError::ValidationError(format!(
            "Batch size {} exceeds maximum of {}",
            request.tools.len(),
            max
        )));
    }

    let invocations = request
        .tools
        .into_iter()
        .enumerate()
        .map(|(idx, entry)| {
            into_arguments(entry.arguments)
                .map(|arguments| ToolInvocation::new(entry.tool_name, arguments))
                .map_err(|e| AppError::ValidationError(format!("tools[{}]: {}", idx, e)))
        })
        .collect::<Result<Vec<_>>>()?;

    let cancel = state.request_token();
    let result = state
        .dispatcher
        .execute_batch(invocations, request.continue_on_error, &cancel)
        .await;

    Ok(Json(result))
}

fn into_arguments(value: Value) -> Result<Arguments> {
    match value {
        Value::Null => Ok(Arguments::new()),
        Value::Object(map) => Ok(map),
        other => Err(AppError::ValidationError(format!(
            "arguments must be a JSON object, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_into_arguments() {
        assert!(into_arguments(Value::Null).unwrap().is_empty());
        assert_eq!(into_arguments(json!({"a": 1})).unwrap()["a"], json!(1));

        let err = into_arguments(json!([1, 2])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid input: arguments must be a JSON object, got array"
        );
    }
}
