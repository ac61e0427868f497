//! Classified error taxonomy
//!
//! Every failure the orchestrator reports is one of four kinds. Callers branch
//! on [`ClassifiedError::kind`] instead of parsing messages.

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Structured context attached to every classified error
pub type Details = Map<String, Value>;

/// Result type used across the crate
pub type Result<T> = std::result::Result<T, ClassifiedError>;

/// The closed set of error kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    /// Bad tool spec or bad input shape
    Invalid,
    /// Runtime failure while invoking the tool
    Execution,
    /// Missing or invalid configuration
    Config,
    /// Anything that could not be classified
    Internal,
}

impl ErrorKind {
    /// Lowercase name of the kind
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Invalid => "invalid",
            ErrorKind::Execution => "execution",
            ErrorKind::Config => "config",
            ErrorKind::Internal => "internal",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned by tool construction and orchestration
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "kind")]
pub enum ClassifiedError {
    /// Bad tool spec or input
    #[error("Invalid input: {message}")]
    #[serde(rename = "invalid")]
    InvalidInput {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        field: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        value: Option<Value>,
        details: Details,
    },

    /// The execution collaborator failed, after any retries
    #[error("Execution failed: {message}")]
    #[serde(rename = "execution")]
    ExecutionFailure { message: String, details: Details },

    /// Missing or invalid configuration
    #[error("Configuration error: {message}")]
    #[serde(rename = "config")]
    Config {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        key: Option<String>,
        details: Details,
    },

    /// Fallback for failures that match no other kind
    #[error("Internal error: {message}")]
    #[serde(rename = "internal")]
    UnknownInternal { message: String, details: Details },
}

impl ClassifiedError {
    /// Create an `InvalidInput` error with empty details
    pub fn invalid(message: impl Into<String>) -> Self {
        ClassifiedError::InvalidInput {
            message: message.into(),
            field: None,
            value: None,
            details: Details::new(),
        }
    }

    /// Create an `ExecutionFailure` error with empty details
    pub fn execution(message: impl Into<String>) -> Self {
        ClassifiedError::ExecutionFailure {
            message: message.into(),
            details: Details::new(),
        }
    }

    /// Create a `Config` error with empty details
    pub fn config(message: impl Into<String>) -> Self {
        ClassifiedError::Config {
            message: message.into(),
            key: None,
            details: Details::new(),
        }
    }

    /// Create an `UnknownInternal` error with empty details
    pub fn internal(message: impl Into<String>) -> Self {
        ClassifiedError::UnknownInternal {
            message: message.into(),
            details: Details::new(),
        }
    }

    /// Wrap an arbitrary error as `UnknownInternal`
    ///
    /// The original error text is kept under `details["error"]`.
    pub fn wrap<E: std::error::Error>(err: E) -> Self {
        let text = err.to_string();
        ClassifiedError::internal(format!("unexpected failure: {}", text))
            .with_detail("error", Value::String(text))
    }

    /// Replace the details mapping
    pub fn with_details(mut self, details: Details) -> Self {
        *self.details_mut() = details;
        self
    }

    /// Insert a single details entry
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details_mut().insert(key.into(), value.into());
        self
    }

    /// Set the offending field (`InvalidInput` only)
    pub fn with_field(mut self, name: impl Into<String>) -> Self {
        if let ClassifiedError::InvalidInput { field, .. } = &mut self {
            *field = Some(name.into());
        }
        self
    }

    /// Set the offending value (`InvalidInput` only)
    pub fn with_value(mut self, offending: impl Into<Value>) -> Self {
        if let ClassifiedError::InvalidInput { value, .. } = &mut self {
            *value = Some(offending.into());
        }
        self
    }

    /// Set the configuration key (`Config` only)
    pub fn with_key(mut self, name: impl Into<String>) -> Self {
        if let ClassifiedError::Config { key, .. } = &mut self {
            *key = Some(name.into());
        }
        self
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ClassifiedError::InvalidInput { .. } => ErrorKind::Invalid,
            ClassifiedError::ExecutionFailure { .. } => ErrorKind::Execution,
            ClassifiedError::Config { .. } => ErrorKind::Config,
            ClassifiedError::UnknownInternal { .. } => ErrorKind::Internal,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ClassifiedError::InvalidInput { message, .. }
            | ClassifiedError::ExecutionFailure { message, .. }
            | ClassifiedError::Config { message, .. }
            | ClassifiedError::UnknownInternal { message, .. } => message,
        }
    }

    pub fn details(&self) -> &Details {
        match self {
            ClassifiedError::InvalidInput { details, .. }
            | ClassifiedError::ExecutionFailure { details, .. }
            | ClassifiedError::Config { details, .. }
            | ClassifiedError::UnknownInternal { details, .. } => details,
        }
    }

    fn details_mut(&mut self) -> &mut Details {
        match self {
            ClassifiedError::InvalidInput { details, .. }
            | ClassifiedError::ExecutionFailure { details, .. }
            | ClassifiedError::Config { details, .. }
            | ClassifiedError::UnknownInternal { details, .. } => details,
        }
    }
}

impl From<serde_json::Error> for ClassifiedError {
    fn from(err: serde_json::Error) -> Self {
        ClassifiedError::wrap(err)
    }
}
