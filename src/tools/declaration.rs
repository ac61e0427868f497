//! Tool spec helpers using JSON Schema generation

use schemars::{schema_for, JsonSchema};
use serde_json::{json, Value};

use crate::error::Result;
use crate::tools::tool::Tool;

/// Build a raw tool spec from a type that implements JsonSchema
///
/// The returned mapping has the same shape callers pass to
/// [`Orchestrator::execute`](crate::Orchestrator::execute), with
/// `input_schema` generated from `T` by schemars.
///
/// # Example
///
/// ```ignore
/// use schemars::JsonSchema;
/// use serde::Deserialize;
///
/// #[derive(Deserialize, JsonSchema)]
/// struct CalculatorArgs {
///     /// The operation to perform
///     operation: String,
///     /// First operand
///     a: f64,
///     /// Second operand
///     b: f64,
/// }
///
/// let spec = tool_spec::<CalculatorArgs>(
///     "calculator",
///     "Perform basic arithmetic operations"
/// )?;
/// ```
pub fn tool_spec<T: JsonSchema>(
    name: impl Into<String>,
    description: impl Into<String>,
) -> Result<Value> {
    let schema = serde_json::to_value(schema_for!(T))?;
    Ok(json!({
        "name": name.into(),
        "description": description.into(),
        "input_schema": schema,
    }))
}

/// Build a validated [`Tool`] from a type that implements JsonSchema
pub fn tool_from_schema<T: JsonSchema>(
    name: impl Into<String>,
    description: impl Into<String>,
) -> Result<Tool> {
    Tool::new(&tool_spec::<T>(name, description)?)
}
