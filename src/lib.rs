//! Tool execution orchestrator
//!
//! Validates tool specs and their input, then drives an external
//! [`ToolExecutor`] with a bounded retry policy. Every failure comes back as a
//! [`ClassifiedError`].

pub mod error;
pub mod orchestrator;
pub mod tools;

// Re-export commonly used types
pub use error::{ClassifiedError, Details, ErrorKind, Result};
pub use orchestrator::{ExecutionOptions, Orchestrator, OrchestratorConfig};
pub use tools::{
    tool_from_schema, tool_spec, EchoExecutor, FunctionRegistry, RegistryError, Tool,
    ToolDefaults, ToolExecutor, ToolRegistration,
};

pub use tool_orchestrator_macros::tool;

#[doc(hidden)]
pub use serde_json;
