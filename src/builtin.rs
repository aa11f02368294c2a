//! Internal tools registered at startup.

use crate::catalog::{handler_fn, Arguments, Catalog, Tool};
use crate::error::CatalogError;
use serde_json::{json, Value};
use std::time::Duration;

pub const CATEGORY: &str = "system";

/// Upper bound for `system_sleep`.
const MAX_SLEEP_MS: u64 = 60_000;

pub fn register_builtin_tools(catalog: &mut Catalog) -> Result<(), CatalogError> {
    catalog.register(echo_tool())?;
    catalog.register(sleep_tool())?;
    Ok(())
}

fn echo_tool() -> Tool {
    Tool::internal(
        "system_echo",
        CATEGORY,
        "Echo the provided arguments back unchanged",
        json!({
            "type": "object",
            "properties": {
                "message": { "type": "string", "description": "Text to echo back" }
            }
        }),
        handler_fn(|arguments: Arguments| async move { Ok(Value::Object(arguments)) }),
    )
}

fn sleep_tool() -> Tool {
    Tool::internal(
        "system_sleep",
        CATEGORY,
        "Wait for a number of milliseconds, then report how long it slept",
        json!({
            "type": "object",
            "properties": {
                "duration_ms": {
                    "type": "integer",
                    "description": "Milliseconds to wait",
                    "minimum": 0,
                    "maximum": MAX_SLEEP_MS
                }
            },
            "required": ["duration_ms"]
        }),
        handler_fn(|arguments: Arguments| async move {
            let duration_ms = arguments
                .get("duration_ms")
                .and_then(Value::as_u64)
                .ok_or_else(|| anyhow::anyhow!("duration_ms must be a non-negative integer"))?;
            if duration_ms > MAX_SLEEP_MS {
                anyhow::bail!("duration_ms must not exceed {}", MAX_SLEEP_MS);
            }

            tokio::time::sleep(Duration::from_millis(duration_ms)).await;
            Ok(json!({ "slept_ms": duration_ms }))
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Catalog {
        let mut catalog = Catalog::new();
        register_builtin_tools(&mut catalog).unwrap();
        catalog
    }

    #[test]
    fn test_builtins_registered_under_system() {
        let catalog = catalog();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.search("", Some(CATEGORY)).len(), 2);
    }

    #[tokio::test]
    async fn test_echo_returns_arguments() {
        let tool = catalog().get("system_echo").unwrap();
        let mut args = Arguments::new();
        args.insert("message".into(), json!("hello"));

        let out = tool.handler.as_ref().unwrap().call(args).await.unwrap();
        assert_eq!(out, json!({"message": "hello"}));
    }

    #[tokio::test]
    async fn test_sleep_validates_duration() {
        let tool = catalog().get("system_sleep").unwrap();
        let handler = tool.handler.as_ref().unwrap();

        let mut args = Arguments::new();
        args.insert("duration_ms".into(), json!(5));
        assert_eq!(handler.call(args).await.unwrap(), json!({"slept_ms": 5}));

        let mut bad = Arguments::new();
        bad.insert("duration_ms".into(), json!("soon"));
        assert!(handler.call(bad).await.is_err());
        assert!(handler.call(Arguments::new()).await.is_err());

        let mut too_long = Arguments::new();
        too_long.insert("duration_ms".into(), json!(MAX_SLEEP_MS + 1));
        assert!(handler.call(too_long).await.is_err());
    }

    #[test]
    fn test_registering_twice_fails() {
        let mut catalog = catalog();
        assert!(register_builtin_tools(&mut catalog).is_err());
    }
}
