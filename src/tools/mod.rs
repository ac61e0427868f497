//! Tool definitions and execution
//!
//! This module provides the validated [`Tool`] type, the `ToolExecutor` trait
//! the orchestrator dispatches to, and the `FunctionRegistry` for backing
//! tools with plain Rust functions.

pub mod declaration;
pub mod executor;
pub mod registry;
pub mod tool;

// Re-export commonly used types
pub use declaration::{tool_from_schema, tool_spec};
pub use executor::{EchoExecutor, ToolExecutor};
pub use registry::{wrap_async, wrap_sync, FunctionRegistry, RegistryError, ToolFn, ToolRegistration};
pub use tool::{Tool, ToolDefaults, INPUT_NOT_A_MAP};

/// Helper macro to register multiple tools at once
///
/// Takes a registry and a list of modules generated by the `#[tool]`
/// attribute. Must be used in a function returning
/// `tool_orchestrator::Result<_>`.
///
/// # Example
///
/// ```ignore
/// #[tool(description = "Perform basic arithmetic operations")]
/// async fn calculator(args: CalculatorArgs) -> Result<CalculatorResult, String> {
///     // Implementation
/// }
///
/// #[tool(description = "Get the current weather")]
/// async fn weather(args: WeatherArgs) -> Result<WeatherResult, String> {
///     // Implementation
/// }
///
/// let mut registry = FunctionRegistry::new();
/// register_tools!(registry, calculator_tool, weather_tool);
///
/// let specs = registry.specs();
/// let orchestrator = Orchestrator::new(Box::new(registry));
/// ```
#[macro_export]
macro_rules! register_tools {
    ($registry:expr, $($tool_mod:path),+ $(,)?) => {
        $(
            {
                use $tool_mod as tool;
                $registry.register(tool::registration()?)?;
            }
        )+
    };
}
