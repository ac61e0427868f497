//! Tool executor trait and implementations

use async_trait::async_trait;
use serde_json::{json, Value};

use super::tool::Tool;

/// Trait for the collaborator that performs a tool's work
///
/// The orchestrator calls this after the tool and its input have been
/// validated. Implementations receive the validated [`Tool`] (its name and,
/// when present, its handler reference) together with the input map.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Invoke a tool
    ///
    /// # Returns
    ///
    /// * `Ok(Value)` - Result value, handed back to the caller unchanged
    /// * `Err(String)` - Error message describing what went wrong
    async fn invoke(&self, tool: &Tool, input: &Value) -> Result<Value, String>;
}

/// Executor that performs no work and echoes its call back
///
/// Returns `{"executed": true, "tool": <name>, "input": <input>}`. Useful
/// until a real agent backend is wired in.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoExecutor;

#[async_trait]
impl ToolExecutor for EchoExecutor {
    async fn invoke(&self, tool: &Tool, input: &Value) -> Result<Value, String> {
        Ok(json!({
            "executed": true,
            "tool": tool.name(),
            "input": input,
        }))
    }
}
