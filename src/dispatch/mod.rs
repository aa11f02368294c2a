//! Execution dispatcher: resolves a tool by name, routes it to its local
//! handler or remote executor, and normalizes every outcome into an
//! [`ExecutionResult`].
//!
//! Execution-time failures are values, not errors. Callers inspect
//! `success` / `error_type` instead of an `Err` channel so that a batch (or
//! the protocol layer above) can keep going after a failed tool.

pub mod types;

pub use types::{BatchExecutionResult, ExecutionErrorKind, ExecutionResult, ToolInvocation};

use crate::catalog::{Arguments, Catalog, ToolExecutor, ToolHandler, ToolSource};
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use types::into_payload;
use uuid::Uuid;

/// Resolved invocation target for one tool.
enum Route {
    Local(Arc<dyn ToolHandler>),
    Remote {
        executor: Arc<dyn ToolExecutor>,
        remote_name: String,
    },
}

pub struct Dispatcher {
    catalog: Arc<Catalog>,
    /// Deadline applied to every single invocation. `None` waits forever.
    call_timeout: Option<Duration>,
}

impl Dispatcher {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            catalog,
            call_timeout: None,
        }
    }

    pub fn with_timeout(mut self, call_timeout: Option<Duration>) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Execute one tool.
    ///
    /// Never fails: unknown tools, unresolvable executors, handler errors,
    /// cancellation and deadline expiry all come back as a failed result.
    /// The elapsed time covers resolution and invocation.
    pub async fn execute(
        &self,
        tool_name: &str,
        arguments: Arguments,
        cancel: &CancellationToken,
    ) -> ExecutionResult {
        let start = Instant::now();

        let route = match self.resolve(tool_name) {
            Ok(route) => route,
            Err((kind, message)) => {
                tracing::warn!(tool = tool_name, error_type = %kind, error = %message, "Tool resolution failed");
                return record(ExecutionResult::failed(
                    tool_name,
                    kind,
                    message,
                    elapsed_ms(start),
                ));
            }
        };

        tracing::debug!(tool = tool_name, arguments = ?arguments, "Executing tool");

        let call = async move {
            match route {
                Route::Local(handler) => handler.call(arguments).await,
                Route::Remote {
                    executor,
                    remote_name,
                } => executor.call_tool(&remote_name, arguments).await,
            }
        };

        let outcome = self.guard(call, cancel).await;
        let execution_time_ms = elapsed_ms(start);

        let result = match outcome {
            Ok(value) => {
                tracing::info!(tool = tool_name, execution_time_ms, "Tool execution successful");
                ExecutionResult::succeeded(tool_name, into_payload(value), execution_time_ms)
            }
            Err(e) => {
                tracing::error!(tool = tool_name, execution_time_ms, error = %e, "Tool execution failed");
                ExecutionResult::failed(
                    tool_name,
                    ExecutionErrorKind::ExecutionError,
                    format!("{:#}", e),
                    execution_time_ms,
                )
            }
        };

        record(result)
    }

    /// Execute invocations strictly in order.
    ///
    /// With `continue_on_error == false` the batch stops right after the
    /// first failed invocation; that failure is still part of the results.
    pub async fn execute_batch(
        &self,
        invocations: Vec<ToolInvocation>,
        continue_on_error: bool,
        cancel: &CancellationToken,
    ) -> BatchExecutionResult {
        let batch_id = Uuid::new_v4();
        let span = tracing::info_span!("batch", %batch_id, requested = invocations.len());

        async move {
            let start = Instant::now();
            let mut results = Vec::with_capacity(invocations.len());
            let mut successful_count = 0;
            let mut failed_count = 0;

            for invocation in invocations {
                let result = self
                    .execute(&invocation.tool_name, invocation.arguments, cancel)
                    .await;
                let success = result.success;
                results.push(result);

                if success {
                    successful_count += 1;
                } else {
                    failed_count += 1;
                    if !continue_on_error {
                        tracing::warn!(
                            tool = %invocation.tool_name,
                            "Stopping batch execution due to error"
                        );
                        break;
                    }
                }
            }

            let total_execution_time_ms = elapsed_ms(start);
            tracing::info!(
                attempted = results.len(),
                successful_count,
                failed_count,
                total_execution_time_ms,
                "Batch execution finished"
            );
            metrics::counter!("batch_executions_total").increment(1);

            BatchExecutionResult {
                results,
                total_execution_time_ms,
                successful_count,
                failed_count,
            }
        }
        .instrument(span)
        .await
    }

    fn resolve(&self, tool_name: &str) -> Result<Route, (ExecutionErrorKind, String)> {
        let tool = self
            .catalog
            .get(tool_name)
            .map_err(|e| (ExecutionErrorKind::ToolNotFound, e.to_string()))?;

        match tool.source {
            ToolSource::Internal => tool.handler.clone().map(Route::Local).ok_or_else(|| {
                (
                    ExecutionErrorKind::ExecutionError,
                    format!("internal tool {} has no handler", tool.name),
                )
            }),
            ToolSource::External => {
                let source = tool.source_name.as_deref().unwrap_or_default();
                let executor = self.catalog.executor(source).ok_or_else(|| {
                    (
                        ExecutionErrorKind::ExecutorNotFound,
                        format!("external executor not found: {}", source),
                    )
                })?;

                Ok(Route::Remote {
                    executor,
                    remote_name: tool.remote_name().to_string(),
                })
            }
        }
    }

    /// Race `call` against cancellation and the per-call deadline. The losing
    /// future is dropped, which aborts the handler or remote call.
    async fn guard<F>(&self, call: F, cancel: &CancellationToken) -> anyhow::Result<Value>
    where
        F: std::future::Future<Output = anyhow::Result<Value>>,
    {
        let call_timeout = self.call_timeout;
        let deadline = async move {
            match call_timeout {
                Some(limit) => tokio::time::sleep(limit).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(anyhow::anyhow!("execution cancelled")),
            _ = deadline => Err(anyhow::anyhow!(
                "execution timed out after {:?}",
                call_timeout.unwrap_or_default()
            )),
            result = call => result,
        }
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

fn record(result: ExecutionResult) -> ExecutionResult {
    let outcome = match result.error_type {
        None => "success",
        Some(kind) => kind.as_str(),
    };
    metrics::counter!("tool_executions_total", "outcome" => outcome).increment(1);
    metrics::histogram!("tool_execution_latency_ms").record(result.execution_time_ms as f64);
    result
}
