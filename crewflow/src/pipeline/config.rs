//! Pipeline-level configuration.

use crate::errors::{ConfigurationError, CrewflowError};
use crate::gate::GatePolicy;
use crate::invoker::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Overrides `max_retries`.
pub const ENV_MAX_RETRIES: &str = "CREWFLOW_MAX_RETRIES";
/// Overrides `base_backoff_seconds`.
pub const ENV_BASE_BACKOFF_SECONDS: &str = "CREWFLOW_BASE_BACKOFF_SECONDS";
/// Overrides `attempt_timeout_seconds`.
pub const ENV_ATTEMPT_TIMEOUT_SECONDS: &str = "CREWFLOW_ATTEMPT_TIMEOUT_SECONDS";
/// Overrides the gate's `max_staleness_seconds`.
pub const ENV_GATE_MAX_STALENESS_SECONDS: &str = "CREWFLOW_GATE_MAX_STALENESS_SECONDS";

/// Retry and gate defaults shared by every stage of a pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Pipeline name used in reports and logs.
    #[serde(default = "default_name")]
    pub name: String,
    /// Default retry policy for every stage.
    #[serde(default)]
    pub retry: RetryPolicy,
    /// How the gate's answer is judged.
    #[serde(default)]
    pub gate: GatePolicy,
}

fn default_name() -> String {
    "pipeline".to_string()
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            retry: RetryPolicy::default(),
            gate: GatePolicy::default(),
        }
    }
}

impl PipelineConfig {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Sets the retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Sets the gate policy.
    #[must_use]
    pub fn with_gate_policy(mut self, gate: GatePolicy) -> Self {
        self.gate = gate;
        self
    }

    /// Parses and validates a JSON document.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a policy is invalid.
    pub fn from_json_str(json: &str) -> Result<Self, CrewflowError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, or as
    /// [`Self::from_json_str`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CrewflowError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Applies overrides from the process environment.
    ///
    /// # Errors
    ///
    /// As [`Self::apply_env_overrides`].
    pub fn with_env_overrides(self) -> Result<Self, ConfigurationError> {
        self.apply_env_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides read through `lookup`, then revalidates.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if a variable does not parse or the
    /// resulting policy is invalid.
    pub fn apply_env_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigurationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = parse_var(&lookup, ENV_MAX_RETRIES)? {
            self.retry.max_retries = value;
        }
        if let Some(value) = parse_var(&lookup, ENV_BASE_BACKOFF_SECONDS)? {
            self.retry.base_backoff_seconds = value;
        }
        if let Some(value) = parse_var(&lookup, ENV_ATTEMPT_TIMEOUT_SECONDS)? {
            self.retry.attempt_timeout_seconds = Some(value);
        }
        if let Some(value) = parse_var(&lookup, ENV_GATE_MAX_STALENESS_SECONDS)? {
            self.gate.max_staleness_seconds = Some(value);
        }
        self.validate()?;
        Ok(self)
    }

    /// Validates both policies.
    ///
    /// # Errors
    ///
    /// Returns the first policy error found.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.retry.validate()?;
        self.gate.validate()
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Result<Option<T>, ConfigurationError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigurationError::invalid_policy(format!("{key} has invalid value '{raw}'"))),
    }
}
