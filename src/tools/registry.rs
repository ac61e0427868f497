//! Function registry for tool execution

use std::collections::HashMap;
use std::future::Future;

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::executor::ToolExecutor;
use super::tool::Tool;
use crate::error::ClassifiedError;

/// Type alias for boxed async tool functions
pub type ToolFn =
    Box<dyn Fn(Value) -> BoxFuture<'static, Result<Value, String>> + Send + Sync>;

/// Errors raised while registering tools
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// A function is already registered under this name
    #[error("Tool already registered: {0}")]
    DuplicateTool(String),
}

impl From<RegistryError> for ClassifiedError {
    fn from(err: RegistryError) -> Self {
        let message = err.to_string();
        match err {
            RegistryError::DuplicateTool(name) => ClassifiedError::config(message).with_key(name),
        }
    }
}

/// Everything needed to register one tool in a single call
///
/// Generated by the `#[tool]` attribute macro as `<fn>_tool::registration()`.
pub struct ToolRegistration {
    /// Dispatch key (the tool name, or the handler it is reached through)
    pub name: String,
    /// Raw tool spec, ready for [`Tool::new`]
    pub spec: Value,
    /// The wrapped function
    pub function: ToolFn,
}

/// Wrap an async function taking typed arguments into a [`ToolFn`]
///
/// Arguments are deserialized from the input map and the result is
/// serialized back to a JSON value.
pub fn wrap_async<F, Args, R, Fut>(func: F) -> ToolFn
where
    F: Fn(Args) -> Fut + Send + Sync + 'static,
    Args: DeserializeOwned + Send + 'static,
    R: Serialize + Send + 'static,
    Fut: Future<Output = Result<R, String>> + Send + 'static,
{
    Box::new(move |args_json: Value| {
        let args = match serde_json::from_value::<Args>(args_json) {
            Ok(args) => args,
            Err(e) => {
                let err_msg = format!("Failed to deserialize arguments: {}", e);
                return Box::pin(async move { Err(err_msg) }) as BoxFuture<'static, _>;
            }
        };

        let future = func(args);

        Box::pin(async move {
            match future.await {
                Ok(result) => serde_json::to_value(&result)
                    .map_err(|e| format!("Failed to serialize result: {}", e)),
                Err(e) => Err(e),
            }
        }) as BoxFuture<'static, _>
    })
}

/// Wrap a synchronous function taking typed arguments into a [`ToolFn`]
pub fn wrap_sync<F, Args, R>(func: F) -> ToolFn
where
    F: Fn(Args) -> Result<R, String> + Send + Sync + 'static,
    Args: DeserializeOwned + Send + 'static,
    R: Serialize + Send + 'static,
{
    Box::new(move |args_json: Value| {
        let result = serde_json::from_value::<Args>(args_json)
            .map_err(|e| format!("Failed to deserialize arguments: {}", e))
            .and_then(&func)
            .and_then(|result| {
                serde_json::to_value(&result)
                    .map_err(|e| format!("Failed to serialize result: {}", e))
            });

        Box::pin(async move { result }) as BoxFuture<'static, _>
    })
}

/// Registry for managing tool functions
///
/// The `FunctionRegistry` is a [`ToolExecutor`] backed by plain Rust
/// functions. A call is routed by the tool's `handler` when it is a string,
/// and by the tool's name otherwise.
///
/// # Example
///
/// ```ignore
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Deserialize)]
/// struct WeatherArgs {
///     location: String,
/// }
///
/// #[derive(Serialize)]
/// struct WeatherResult {
///     temperature: f32,
///     conditions: String,
/// }
///
/// async fn get_weather(args: WeatherArgs) -> Result<WeatherResult, String> {
///     Ok(WeatherResult {
///         temperature: 72.0,
///         conditions: "Sunny".to_string(),
///     })
/// }
///
/// let mut registry = FunctionRegistry::new();
/// registry.register_async("get_weather", get_weather);
/// ```
pub struct FunctionRegistry {
    functions: HashMap<String, ToolFn>,
    specs: HashMap<String, Value>,
}

impl FunctionRegistry {
    /// Create a new empty function registry
    pub fn new() -> Self {
        Self {
            functions: HashMap::new(),
            specs: HashMap::new(),
        }
    }

    /// Register an async function, replacing any function of the same name
    pub fn register_async<F, Args, R, Fut>(&mut self, name: impl Into<String>, func: F)
    where
        F: Fn(Args) -> Fut + Send + Sync + 'static,
        Args: DeserializeOwned + Send + 'static,
        R: Serialize + Send + 'static,
        Fut: Future<Output = Result<R, String>> + Send + 'static,
    {
        self.replace(name.into(), wrap_async(func));
    }

    /// Register a synchronous function, replacing any function of the same name
    pub fn register_sync<F, Args, R>(&mut self, name: impl Into<String>, func: F)
    where
        F: Fn(Args) -> Result<R, String> + Send + Sync + 'static,
        Args: DeserializeOwned + Send + 'static,
        R: Serialize + Send + 'static,
    {
        self.replace(name.into(), wrap_sync(func));
    }

    /// Install a bare function; a spec left by an earlier registration no
    /// longer describes it
    fn replace(&mut self, name: String, function: ToolFn) {
        self.specs.remove(&name);
        self.functions.insert(name, function);
    }

    /// Register a complete tool, usually one generated by `#[tool]`
    ///
    /// Unlike `register_async`/`register_sync`, this refuses to replace an
    /// existing function.
    pub fn register(&mut self, registration: ToolRegistration) -> Result<(), RegistryError> {
        if self.functions.contains_key(&registration.name) {
            return Err(RegistryError::DuplicateTool(registration.name));
        }

        tracing::debug!(tool = %registration.name, "registered tool");
        self.specs.insert(registration.name.clone(), registration.spec);
        self.functions.insert(registration.name, registration.function);
        Ok(())
    }

    /// Check if a function is registered
    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Get the number of registered functions
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Raw spec stored with a registration
    pub fn spec(&self, name: &str) -> Option<&Value> {
        self.specs.get(name)
    }

    /// All specs stored with registrations, sorted by name
    pub fn specs(&self) -> Vec<Value> {
        let mut names: Vec<&String> = self.specs.keys().collect();
        names.sort();
        names.into_iter().map(|name| self.specs[name].clone()).collect()
    }

    /// Name of the function a tool is routed to
    fn dispatch_key(tool: &Tool) -> &str {
        tool.handler()
            .and_then(Value::as_str)
            .unwrap_or_else(|| tool.name())
    }

    async fn execute_function(&self, name: &str, arguments: Value) -> Result<Value, String> {
        match self.functions.get(name) {
            Some(func) => func(arguments).await,
            None => Err(format!("Unknown tool: {}", name)),
        }
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ToolExecutor for FunctionRegistry {
    async fn invoke(&self, tool: &Tool, input: &Value) -> Result<Value, String> {
        self.execute_function(Self::dispatch_key(tool), input.clone())
            .await
    }
}
