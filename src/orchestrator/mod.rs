//! Tool orchestration with bounded retry
//!
//! The [`Orchestrator`] is the single entry point that turns a raw tool spec
//! and raw input into a result or a [`ClassifiedError`]:
//! - Validates the spec into a [`Tool`] (never retried)
//! - Validates the input shape (never retried)
//! - Invokes the [`ToolExecutor`], retrying execution failures immediately
//!   until the retry budget is spent

pub mod config;
pub mod options;

pub use config::OrchestratorConfig;
pub use options::ExecutionOptions;

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::FutureExt;
use serde_json::{Map, Value};
use tracing::Instrument;
use uuid::Uuid;

use crate::error::{ClassifiedError, Result};
use crate::tools::executor::{EchoExecutor, ToolExecutor};
use crate::tools::tool::Tool;

/// Why a single attempt did not produce a value
#[derive(Debug)]
enum AttemptError {
    /// The executor returned an error
    Failed(String),
    /// The attempt ran past its deadline
    TimedOut(Duration),
    /// The executor panicked
    Panicked(String),
}

/// Validates tools and drives their execution
pub struct Orchestrator {
    /// Collaborator that performs the actual tool work
    executor: Box<dyn ToolExecutor>,

    /// Shared defaults and timeout policy
    config: OrchestratorConfig,
}

impl Orchestrator {
    /// Create an orchestrator with the default configuration
    pub fn new(executor: Box<dyn ToolExecutor>) -> Self {
        Self {
            executor,
            config: OrchestratorConfig::default(),
        }
    }

    /// Replace the configuration
    pub fn with_config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Validate and execute a tool
    ///
    /// When `options` is `None` the configured defaults apply. Validation
    /// failures return `InvalidInput` without invoking the executor.
    /// Execution failures are retried `options.retry` times with no delay,
    /// then returned as `ExecutionFailure`. A panicking executor is reported
    /// as `UnknownInternal` and not retried.
    pub async fn execute(
        &self,
        spec: &Value,
        input: &Value,
        options: Option<ExecutionOptions>,
    ) -> Result<Value> {
        let options = options.unwrap_or_else(|| self.config.default_options());

        // Bound outside the macro: `Value` inside it names tracing's field trait
        let execution_id = Uuid::new_v4();
        let context = Value::Object(options.context.clone());
        let span = tracing::info_span!("execute_tool", %execution_id, %context);

        self.run(spec, input, &options).instrument(span).await
    }

    /// Same as [`execute`](Self::execute), with `context` merged into the
    /// options first
    ///
    /// The context is only recorded on the tracing span for correlation.
    pub async fn execute_with_context(
        &self,
        spec: &Value,
        input: &Value,
        context: Map<String, Value>,
        options: Option<ExecutionOptions>,
    ) -> Result<Value> {
        let mut options = options.unwrap_or_else(|| self.config.default_options());
        options.merge_context(context);
        self.execute(spec, input, Some(options)).await
    }

    async fn run(&self, spec: &Value, input: &Value, options: &ExecutionOptions) -> Result<Value> {
        let tool = Tool::new(spec)?;

        tool.validate_input(input).map_err(|message| {
            ClassifiedError::invalid(message)
                .with_field("input")
                .with_value(input.clone())
                .with_detail("tool", tool.name())
        })?;

        let deadline = self.deadline(&tool, options);
        let mut remaining = options.retry;
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            tracing::debug!(tool = tool.name(), %input, attempt, "executing tool");

            let (reason, timed_out) = match self.attempt(&tool, input, deadline).await {
                Ok(value) => return Ok(value),
                Err(AttemptError::Failed(reason)) => (reason, false),
                Err(AttemptError::TimedOut(limit)) => {
                    (format!("timed out after {}ms", limit.as_millis()), true)
                }
                Err(AttemptError::Panicked(message)) => {
                    tracing::error!(tool = tool.name(), attempt, error = %message, "tool panicked");
                    return Err(ClassifiedError::internal(format!(
                        "tool '{}' panicked: {}",
                        tool.name(),
                        message
                    ))
                    .with_detail("tool", tool.name())
                    .with_detail("error", message)
                    .with_detail("attempts", attempt));
                }
            };

            if remaining > 0 {
                remaining -= 1;
                tracing::warn!(
                    tool = tool.name(),
                    attempts_remaining = remaining,
                    error = %reason,
                    "retrying"
                );
                continue;
            }

            tracing::error!(tool = tool.name(), attempts = attempt, error = %reason, "tool execution failed");

            let mut err = ClassifiedError::execution(format!(
                "tool '{}' failed after {} attempt(s): {}",
                tool.name(),
                attempt,
                reason
            ))
            .with_detail("tool", tool.name())
            .with_detail("reason", reason)
            .with_detail("attempts", attempt);

            if timed_out {
                err = err.with_detail("timed_out", true);
                if let Some(limit) = deadline {
                    err = err.with_detail("timeout_ms", limit.as_millis() as u64);
                }
            }

            return Err(err);
        }
    }

    /// Run one attempt, under the deadline when there is one
    async fn attempt(
        &self,
        tool: &Tool,
        input: &Value,
        deadline: Option<Duration>,
    ) -> std::result::Result<Value, AttemptError> {
        let call = AssertUnwindSafe(self.executor.invoke(tool, input)).catch_unwind();

        let outcome = match deadline {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| AttemptError::TimedOut(limit))?,
            None => call.await,
        };

        match outcome {
            Ok(result) => result.map_err(AttemptError::Failed),
            Err(payload) => Err(AttemptError::Panicked(panic_message(payload))),
        }
    }

    /// The tighter of the call timeout and the tool's own timeout, never
    /// below 1ms
    fn deadline(&self, tool: &Tool, options: &ExecutionOptions) -> Option<Duration> {
        if !self.config.enforce_timeout {
            return None;
        }

        let millis = match tool.timeout() {
            Some(tool_timeout) => tool_timeout.min(options.timeout),
            None => options.timeout,
        };
        Some(Duration::from_millis(millis.max(1)))
    }
}

impl Default for Orchestrator {
    /// An orchestrator backed by [`EchoExecutor`]
    fn default() -> Self {
        Self::new(Box::new(EchoExecutor))
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
