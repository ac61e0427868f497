//! Orchestrator configuration

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::options::{ExecutionOptions, DEFAULT_TIMEOUT_MS};
use crate::error::{ClassifiedError, Result};

pub const TIMEOUT_ENV: &str = "TOOL_ORCHESTRATOR_TIMEOUT_MS";
pub const RETRY_ENV: &str = "TOOL_ORCHESTRATOR_RETRY";
pub const ENFORCE_TIMEOUT_ENV: &str = "TOOL_ORCHESTRATOR_ENFORCE_TIMEOUT";

/// Settings shared by every call made through one orchestrator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Timeout used when the caller passes no options
    pub default_timeout_ms: u64,
    /// Retry budget used when the caller passes no options
    pub default_retry: u32,
    /// Run each attempt under a deadline
    pub enforce_timeout: bool,
}

impl OrchestratorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from the process environment
    ///
    /// Unset variables keep their defaults. A variable that is set but cannot
    /// be parsed yields a `Config` error naming it.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(timeout) = parse_var::<u64, _>(&lookup, TIMEOUT_ENV)? {
            if timeout == 0 {
                return Err(ClassifiedError::config(format!("{} must be positive", TIMEOUT_ENV))
                    .with_key(TIMEOUT_ENV));
            }
            config.default_timeout_ms = timeout;
        }

        if let Some(retry) = parse_var::<u32, _>(&lookup, RETRY_ENV)? {
            config.default_retry = retry;
        }

        if let Some(enforce) = parse_var::<bool, _>(&lookup, ENFORCE_TIMEOUT_ENV)? {
            config.enforce_timeout = enforce;
        }

        Ok(config)
    }

    /// Set the fallback timeout; zero is raised to 1ms
    pub fn with_default_timeout(mut self, timeout_ms: u64) -> Self {
        self.default_timeout_ms = timeout_ms.max(1);
        self
    }

    pub fn with_default_retry(mut self, retry: u32) -> Self {
        self.default_retry = retry;
        self
    }

    pub fn with_enforce_timeout(mut self, enforce: bool) -> Self {
        self.enforce_timeout = enforce;
        self
    }

    /// Options applied when a call supplies none
    pub fn default_options(&self) -> ExecutionOptions {
        ExecutionOptions::new()
            .with_timeout(self.default_timeout_ms)
            .with_retry(self.default_retry)
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            default_timeout_ms: DEFAULT_TIMEOUT_MS,
            default_retry: 0,
            enforce_timeout: true,
        }
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    let raw = match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw,
        _ => return Ok(None),
    };

    raw.trim().parse::<T>().map(Some).map_err(|e| {
        ClassifiedError::config(format!("{} has an invalid value: {}", key, e))
            .with_key(key)
            .with_detail("value", raw.clone())
    })
}
