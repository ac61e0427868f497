//! Per-call execution options

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ClassifiedError, Result};
use crate::tools::tool::positive_timeout;

/// Default per-call timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Options for a single `execute` call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionOptions {
    /// Deadline for each attempt, in milliseconds
    pub timeout: u64,
    /// Additional attempts allowed after an execution failure
    pub retry: u32,
    /// Caller correlation data, logged but never interpreted
    pub context: Map<String, Value>,
}

impl ExecutionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse options from an untrusted mapping
    ///
    /// Absent or null keys take their defaults. `timeout` must be a positive
    /// integer, `retry` a non-negative integer and `context` a map.
    pub fn from_value(raw: &Value) -> Result<Self> {
        let map = raw.as_object().ok_or_else(|| {
            ClassifiedError::invalid("options must be a map").with_value(raw.clone())
        })?;

        let mut options = Self::default();

        if let Some(value) = map.get("timeout").filter(|v| !v.is_null()) {
            options.timeout = positive_timeout(value, "timeout")?;
        }

        if let Some(value) = map.get("retry").filter(|v| !v.is_null()) {
            options.retry = value
                .as_u64()
                .and_then(|n| u32::try_from(n).ok())
                .ok_or_else(|| {
                    ClassifiedError::invalid("retry must be a non-negative integer")
                        .with_field("retry")
                        .with_value(value.clone())
                })?;
        }

        match map.get("context") {
            None | Some(Value::Null) => {}
            Some(Value::Object(context)) => options.context = context.clone(),
            Some(other) => {
                return Err(ClassifiedError::invalid("context must be a map")
                    .with_field("context")
                    .with_value(other.clone()));
            }
        }

        Ok(options)
    }

    /// Set the per-attempt timeout; zero is raised to 1ms
    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout = timeout_ms.max(1);
        self
    }

    pub fn with_retry(mut self, retry: u32) -> Self {
        self.retry = retry;
        self
    }

    /// Replace the context map
    pub fn with_context(mut self, context: Map<String, Value>) -> Self {
        self.context = context;
        self
    }

    /// Add a single context entry
    pub fn with_context_entry(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Merge `context` into the existing context, overwriting shared keys
    pub(crate) fn merge_context(&mut self, context: Map<String, Value>) {
        self.context.extend(context);
    }
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT_MS,
            retry: 0,
            context: Map::new(),
        }
    }
}
