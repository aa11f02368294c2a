use crate::catalog::Arguments;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Machine-readable reason attached to a failed [`ExecutionResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionErrorKind {
    ToolNotFound,
    ExecutorNotFound,
    ExecutionError,
}

impl ExecutionErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionErrorKind::ToolNotFound => "tool_not_found",
            ExecutionErrorKind::ExecutorNotFound => "executor_not_found",
            ExecutionErrorKind::ExecutionError => "execution_error",
        }
    }
}

impl fmt::Display for ExecutionErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one invocation. Produced exactly once per invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub success: bool,
    pub tool_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<ExecutionErrorKind>,
    pub execution_time_ms: u64,
}

impl ExecutionResult {
    pub(crate) fn succeeded(
        tool_name: &str,
        result: Map<String, Value>,
        execution_time_ms: u64,
    ) -> Self {
        Self {
            success: true,
            tool_name: tool_name.to_string(),
            result: Some(result),
            error: None,
            error_type: None,
            execution_time_ms,
        }
    }

    pub(crate) fn failed(
        tool_name: &str,
        kind: ExecutionErrorKind,
        error: impl Into<String>,
        execution_time_ms: u64,
    ) -> Self {
        Self {
            success: false,
            tool_name: tool_name.to_string(),
            result: None,
            error: Some(error.into()),
            error_type: Some(kind),
            execution_time_ms,
        }
    }
}

/// One entry of a batch request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    pub tool_name: String,
    #[serde(default)]
    pub arguments: Arguments,
}

impl ToolInvocation {
    pub fn new(tool_name: impl Into<String>, arguments: Arguments) -> Self {
        Self {
            tool_name: tool_name.into(),
            arguments,
        }
    }
}

/// Aggregate of a sequential batch.
///
/// `results` holds one entry per attempted invocation, which is fewer than
/// requested when the batch stopped on a failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchExecutionResult {
    pub results: Vec<ExecutionResult>,
    pub total_execution_time_ms: u64,
    pub successful_count: usize,
    pub failed_count: usize,
}

/// Wrap a handler/executor return value into the uniform result payload.
/// Objects are used as-is, anything else lands under a single `result` key.
pub(crate) fn into_payload(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => {
            let mut map = Map::new();
            map.insert("result".to_string(), other);
            map
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_into_payload_keeps_objects() {
        let payload = into_payload(json!({"content": "hi"}));
        assert_eq!(payload.get("content"), Some(&json!("hi")));
        assert_eq!(payload.len(), 1);
    }

    #[test]
    fn test_into_payload_wraps_scalars_and_arrays() {
        assert_eq!(Value::Object(into_payload(json!("text"))), json!({"result": "text"}));
        assert_eq!(Value::Object(into_payload(json!([1, 2]))), json!({"result": [1, 2]}));
        assert_eq!(Value::Object(into_payload(Value::Null)), json!({"result": null}));
    }

    #[test]
    fn test_failed_result_serializes_error_kind() {
        let result =
            ExecutionResult::failed("nope", ExecutionErrorKind::ToolNotFound, "tool not found: nope", 0);
        let value = serde_json::to_value(&result).unwrap();

        assert_eq!(value["success"], json!(false));
        assert_eq!(value["error_type"], json!("tool_not_found"));
        assert!(value.get("result").is_none());
    }

    #[test]
    fn test_invocation_arguments_default_to_empty() {
        let inv: ToolInvocation = serde_json::from_value(json!({"tool_name": "x"})).unwrap();
        assert!(inv.arguments.is_empty());
    }
}
