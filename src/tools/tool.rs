//! Validated tool definitions

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ClassifiedError, Result};

/// Message returned by [`Tool::validate_input`] for non-map input
pub const INPUT_NOT_A_MAP: &str = "input must be a map";

/// A validated, immutable tool definition
///
/// Built from an untrusted spec mapping by [`Tool::new`]. The spec carries
/// `name`, `description` and `input_schema` (required) plus optional
/// `handler`, `timeout` (milliseconds) and `tags`.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use tool_orchestrator::Tool;
///
/// let tool = Tool::new(&json!({
///     "name": "echo",
///     "description": "Echo the input back",
///     "input_schema": {}
/// }))
/// .unwrap();
///
/// assert_eq!(tool.name(), "echo");
/// assert!(tool.tags().is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tool {
    name: String,
    description: String,
    input_schema: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    handler: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    timeout: Option<u64>,
    tags: Vec<String>,
}

impl Tool {
    /// Validate a raw spec mapping into a `Tool`
    ///
    /// Fails with `InvalidInput` when the spec is not a map, when a required
    /// key is missing or mistyped, or when an optional key is mistyped.
    pub fn new(spec: &Value) -> Result<Self> {
        let map = spec.as_object().ok_or_else(|| {
            ClassifiedError::invalid("tool spec must be a map").with_value(spec.clone())
        })?;

        let name = required_string(map, "name")?;
        let description = required_string(map, "description")?;

        let input_schema = match map.get("input_schema") {
            None | Some(Value::Null) => {
                return Err(ClassifiedError::invalid("input_schema is required")
                    .with_field("input_schema"));
            }
            Some(Value::Object(schema)) => schema.clone(),
            Some(other) => {
                return Err(ClassifiedError::invalid("input_schema must be a map")
                    .with_field("input_schema")
                    .with_value(other.clone()));
            }
        };

        let handler = optional(map, "handler").cloned();
        let timeout = optional(map, "timeout")
            .map(|value| positive_timeout(value, "timeout"))
            .transpose()?;
        let tags = optional(map, "tags")
            .map(|value| string_list(value, "tags"))
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            name,
            description,
            input_schema,
            handler,
            timeout,
            tags,
        })
    }

    /// Validate a spec that is known to be well-formed
    ///
    /// Only for call sites where a bad spec is a programmer error, such as
    /// specs built from literals. Never use this on untrusted input.
    ///
    /// # Panics
    ///
    /// Panics with the classified error when validation fails.
    pub fn new_or_raise(spec: &Value) -> Self {
        match Self::new(spec) {
            Ok(tool) => tool,
            Err(err) => panic!("invalid tool spec: {}", err),
        }
    }

    /// Check candidate input against this tool
    ///
    /// Only the top-level shape is checked: the input must be a map. The
    /// declared `input_schema` is not enforced.
    pub fn validate_input(&self, input: &Value) -> std::result::Result<(), String> {
        if input.is_object() {
            Ok(())
        } else {
            Err(INPUT_NOT_A_MAP.to_string())
        }
    }

    /// Return a copy with `defaults` applied
    ///
    /// `name`, `description` and `input_schema` are never touched. `self`
    /// is left unchanged.
    pub fn merge_defaults(&self, defaults: &ToolDefaults) -> Tool {
        let mut merged = self.clone();
        if let Some(handler) = &defaults.handler {
            merged.handler = Some(handler.clone());
        }
        if let Some(timeout) = defaults.timeout {
            merged.timeout = Some(timeout);
        }
        if let Some(tags) = &defaults.tags {
            merged.tags = tags.clone();
        }
        merged
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn input_schema(&self) -> &Map<String, Value> {
        &self.input_schema
    }

    /// Opaque reference to the code that performs this tool's work
    pub fn handler(&self) -> Option<&Value> {
        self.handler.as_ref()
    }

    /// Per-tool timeout in milliseconds
    pub fn timeout(&self) -> Option<u64> {
        self.timeout
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }
}

/// Overridable tool fields for [`Tool::merge_defaults`]
///
/// A `None` field leaves the tool's value in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolDefaults {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handler: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl ToolDefaults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse defaults from an untrusted mapping
    ///
    /// Unknown keys and the protected keys (`name`, `description`,
    /// `input_schema`) are ignored.
    pub fn from_map(map: &Map<String, Value>) -> Result<Self> {
        let handler = optional(map, "handler").cloned();
        let timeout = optional(map, "timeout")
            .map(|value| positive_timeout(value, "timeout"))
            .transpose()?;
        let tags = optional(map, "tags")
            .map(|value| string_list(value, "tags"))
            .transpose()?;

        Ok(Self {
            handler,
            timeout,
            tags,
        })
    }

    pub fn with_handler(mut self, handler: impl Into<Value>) -> Self {
        self.handler = Some(handler.into());
        self
    }

    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout = Some(timeout_ms);
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }
}

/// Look up an optional key, treating an explicit null as absent
fn optional<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    match map.get(key) {
        None | Some(Value::Null) => None,
        Some(value) => Some(value),
    }
}

fn required_string(map: &Map<String, Value>, key: &str) -> Result<String> {
    match optional(map, key) {
        None => Err(ClassifiedError::invalid(format!("{} is required", key)).with_field(key)),
        Some(Value::String(s)) if s.is_empty() => {
            Err(ClassifiedError::invalid(format!("{} must not be empty", key)).with_field(key))
        }
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(ClassifiedError::invalid(format!("{} must be a string", key))
            .with_field(key)
            .with_value(other.clone())),
    }
}

pub(crate) fn positive_timeout(value: &Value, key: &str) -> Result<u64> {
    match value.as_u64() {
        Some(ms) if ms > 0 => Ok(ms),
        _ => Err(
            ClassifiedError::invalid(format!("{} must be a positive integer", key))
                .with_field(key)
                .with_value(value.clone()),
        ),
    }
}

fn string_list(value: &Value, key: &str) -> Result<Vec<String>> {
    let mistyped = || {
        ClassifiedError::invalid(format!("{} must be a list of strings", key))
            .with_field(key)
            .with_value(value.clone())
    };

    value
        .as_array()
        .ok_or_else(mistyped)?
        .iter()
        .map(|item| item.as_str().map(str::to_string).ok_or_else(mistyped))
        .collect()
}
