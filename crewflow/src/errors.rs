//! Error types for crewflow.
//!
//! Only [`ConfigurationError`] is ever returned to a caller before a run
//! starts. Everything that goes wrong during a run is absorbed into the
//! returned report; the invocation errors here exist so that stages and the
//! invoker can describe what happened.

use crate::agents::Strategy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// The main error type for crewflow operations.
#[derive(Debug, Error)]
pub enum CrewflowError {
    /// The pipeline definition is malformed.
    #[error("{0}")]
    Configuration(#[from] ConfigurationError),

    /// An invocation exhausted every strategy and attempt.
    #[error("{0}")]
    ExhaustedRetries(#[from] ExhaustedRetriesError),

    /// A gate payload did not match the expected shape.
    #[error("{0}")]
    GateParse(#[from] GateParseError),

    /// A stage attempted to record a result twice.
    #[error("{0}")]
    DuplicateResult(#[from] DuplicateResultError),

    /// The run was cancelled.
    #[error("{0}")]
    Cancelled(#[from] Cancelled),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Metadata about a configuration error for better diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ContractErrorInfo {
    /// Error code (e.g., "CONFIG-002-MULTIPLE_GATES").
    pub code: String,
    /// Short summary of the error.
    pub summary: String,
    /// Hint for fixing the error.
    pub fix_hint: Option<String>,
    /// Additional context key-value pairs.
    #[serde(default)]
    pub context: HashMap<String, String>,
}

impl ContractErrorInfo {
    /// Creates a new contract error info.
    #[must_use]
    pub fn new(code: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            summary: summary.into(),
            fix_hint: None,
            context: HashMap::new(),
        }
    }

    /// Sets the fix hint.
    #[must_use]
    pub fn with_fix_hint(mut self, hint: impl Into<String>) -> Self {
        self.fix_hint = Some(hint.into());
        self
    }

    /// Adds a single context entry.
    #[must_use]
    pub fn with_context_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }
}

/// Error raised when a pipeline definition or policy is malformed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct ConfigurationError {
    /// The error message.
    pub message: String,
    /// The stages involved in the error.
    pub stages: Vec<String>,
    /// Optional contract error info.
    pub error_info: Option<ContractErrorInfo>,
}

impl ConfigurationError {
    /// Creates a new configuration error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stages: Vec::new(),
            error_info: None,
        }
    }

    /// Sets the stages involved.
    #[must_use]
    pub fn with_stages(mut self, stages: Vec<String>) -> Self {
        self.stages = stages;
        self
    }

    /// Sets the contract error info.
    #[must_use]
    pub fn with_error_info(mut self, info: ContractErrorInfo) -> Self {
        self.error_info = Some(info);
        self
    }

    /// Returns the contract error code, if any.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        self.error_info.as_ref().map(|info| info.code.as_str())
    }

    /// Pipeline defines no stages at all.
    #[must_use]
    pub fn empty_pipeline(pipeline: &str) -> Self {
        Self::new(format!("Pipeline '{pipeline}' has no stages")).with_error_info(
            ContractErrorInfo::new("CONFIG-001-EMPTY", "Cannot build an empty pipeline")
                .with_fix_hint("Add a validation gate and at least one work stage."),
        )
    }

    /// Pipeline has no stage flagged as the validation gate.
    #[must_use]
    pub fn missing_gate(pipeline: &str) -> Self {
        Self::new(format!("Pipeline '{pipeline}' has no validation gate")).with_error_info(
            ContractErrorInfo::new("CONFIG-002-NO_GATE", "Exactly one gate stage is required")
                .with_fix_hint("Mark the validation stage with `Stage::gate`."),
        )
    }

    /// Pipeline has more than one stage flagged as the validation gate.
    #[must_use]
    pub fn multiple_gates(pipeline: &str, gates: Vec<String>) -> Self {
        Self::new(format!(
            "Pipeline '{pipeline}' has {} validation gates: {}",
            gates.len(),
            gates.join(", ")
        ))
        .with_stages(gates)
        .with_error_info(
            ContractErrorInfo::new("CONFIG-003-MULTIPLE_GATES", "Exactly one gate stage is allowed")
                .with_fix_hint("Keep a single validation stage and turn the others into work stages."),
        )
    }

    /// Two stages share the same identifier.
    #[must_use]
    pub fn duplicate_stage(stage: &str) -> Self {
        Self::new(format!("Duplicate stage identifier '{stage}'"))
            .with_stages(vec![stage.to_string()])
            .with_error_info(
                ContractErrorInfo::new("CONFIG-004-DUPLICATE", "Stage identifiers must be unique")
                    .with_fix_hint("Rename one of the stages."),
            )
    }

    /// A stage reads from a stage that is unknown or does not precede it.
    #[must_use]
    pub fn unknown_read(stage: &str, source: &str) -> Self {
        Self::new(format!(
            "Stage '{stage}' reads from '{source}', which is not an earlier stage"
        ))
        .with_stages(vec![stage.to_string(), source.to_string()])
        .with_error_info(
            ContractErrorInfo::new("CONFIG-005-UNKNOWN_READ", format!("'{source}' does not precede '{stage}'"))
                .with_fix_hint("Only read results of stages declared earlier in the pipeline."),
        )
    }

    /// A stage's agent exposes none of the strategies its policy tries.
    #[must_use]
    pub fn no_usable_strategy(stage: &str, agent: &str) -> Self {
        Self::new(format!(
            "Agent '{agent}' bound to stage '{stage}' exposes none of the configured strategies"
        ))
        .with_stages(vec![stage.to_string()])
        .with_error_info(
            ContractErrorInfo::new("CONFIG-007-NO_STRATEGY", "Agent cannot be invoked")
                .with_context_entry("agent", agent)
                .with_fix_hint("Register at least one strategy listed in the retry policy."),
        )
    }

    /// The validation gate declares reads; it always runs with no context.
    #[must_use]
    pub fn gate_reads(stage: &str) -> Self {
        Self::new(format!("Validation gate '{stage}' cannot read other stages"))
            .with_stages(vec![stage.to_string()])
            .with_error_info(
                ContractErrorInfo::new("CONFIG-008-GATE_READS", "The gate runs before any other stage")
                    .with_fix_hint("Remove `with_reads` from the gate stage."),
            )
    }

    /// A retry or gate policy is invalid.
    #[must_use]
    pub fn invalid_policy(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(format!("Invalid policy: {message}"))
            .with_error_info(ContractErrorInfo::new("CONFIG-006-POLICY", message))
    }
}

/// A single failed (attempt, strategy) invocation.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InvocationError {
    /// The strategy returned an error.
    #[error("{message}")]
    Raised {
        /// The underlying error message.
        message: String,
    },

    /// The strategy returned an empty response.
    #[error("empty response")]
    Empty,

    /// The strategy did not answer before the attempt deadline.
    #[error("timed out after {timeout_ms}ms")]
    TimedOut {
        /// The deadline that was exceeded.
        timeout_ms: u64,
    },
}

impl InvocationError {
    /// Creates a raised error from any displayable error.
    #[must_use]
    pub fn raised(err: impl std::fmt::Display) -> Self {
        Self::Raised {
            message: err.to_string(),
        }
    }
}

/// One failed (strategy, attempt) pair kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationAttempt {
    /// The strategy that was tried.
    pub strategy: Strategy,
    /// The 1-indexed attempt (pass) number.
    pub attempt: u32,
    /// Why the attempt did not produce a response.
    pub error: InvocationError,
}

/// Every strategy in every attempt failed to produce a non-empty response.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error(
    "Agent '{agent}' returned no usable response after {attempts} attempts. Last error: {}",
    last_error.as_ref().map_or_else(|| "none".to_string(), ToString::to_string)
)]
pub struct ExhaustedRetriesError {
    /// The agent that was invoked.
    pub agent: String,
    /// Number of full passes over the strategy list.
    pub attempts: u32,
    /// The most recent underlying error, if any strategy raised.
    pub last_error: Option<InvocationError>,
    /// Every failed (strategy, attempt) pair in order.
    pub trace: Vec<InvocationAttempt>,
}

/// Failure modes of [`crate::invoker::ResilientInvoker::invoke`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InvokeError {
    /// All attempts were exhausted.
    #[error("{0}")]
    Exhausted(#[from] ExhaustedRetriesError),

    /// The cancellation token fired.
    #[error("Invocation cancelled: {0}")]
    Cancelled(String),
}

/// A stage or gate was interrupted by the cancellation token.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Cancelled: {reason}")]
pub struct Cancelled {
    /// The reason given to the token.
    pub reason: String,
}

impl Cancelled {
    /// Creates a new cancellation error.
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

/// The gate's response did not have the expected structured shape.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GateParseError {
    /// No JSON object could be located in the response.
    #[error("no JSON object found in gate response")]
    NoObject,

    /// The located JSON was malformed.
    #[error("malformed gate JSON: {0}")]
    Malformed(String),

    /// A required field family is absent.
    #[error("missing field '{0}'")]
    MissingField(&'static str),

    /// More than one alias of the same field was supplied.
    #[error("ambiguous field '{field}': found {found:?}")]
    AmbiguousField {
        /// Canonical field name.
        field: &'static str,
        /// Aliases that were present.
        found: Vec<String>,
    },

    /// A field has the wrong type or value.
    #[error("invalid field '{field}': {reason}")]
    InvalidField {
        /// Canonical field name.
        field: &'static str,
        /// What was wrong.
        reason: String,
    },
}

/// A result was recorded twice for the same stage in one run.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Result for stage '{stage}' already recorded")]
pub struct DuplicateResultError {
    /// The stage identifier.
    pub stage: String,
}

impl DuplicateResultError {
    /// Creates a new duplicate result error.
    #[must_use]
    pub fn new(stage: impl Into<String>) -> Self {
        Self { stage: stage.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contract_error_info_creation() {
        let info = ContractErrorInfo::new("TEST-001", "Test error")
            .with_fix_hint("Fix this by doing that")
            .with_context_entry("stage", "my_stage");

        assert_eq!(info.code, "TEST-001");
        assert_eq!(info.fix_hint, Some("Fix this by doing that".to_string()));
        assert_eq!(info.context.get("stage"), Some(&"my_stage".to_string()));
    }

    #[test]
    fn test_multiple_gates_lists_stages() {
        let err = ConfigurationError::multiple_gates("triage", vec!["a".into(), "b".into()]);
        assert_eq!(err.code(), Some("CONFIG-003-MULTIPLE_GATES"));
        assert_eq!(err.stages, vec!["a".to_string(), "b".to_string()]);
        assert!(err.to_string().contains("a, b"));
    }

    #[test]
    fn test_exhausted_message_names_last_error() {
        let err = ExhaustedRetriesError {
            agent: "diagnostics".into(),
            attempts: 3,
            last_error: Some(InvocationError::raised("quota exceeded")),
            trace: Vec::new(),
        };
        let msg = err.to_string();
        assert!(msg.contains("after 3 attempts"));
        assert!(msg.contains("quota exceeded"));
    }

    #[test]
    fn test_exhausted_message_without_error() {
        let err = ExhaustedRetriesError {
            agent: "a".into(),
            attempts: 1,
            last_error: None,
            trace: Vec::new(),
        };
        assert!(err.to_string().ends_with("Last error: none"));
    }

    #[test]
    fn test_invocation_error_serializes_tagged() {
        let json = serde_json::to_value(InvocationError::TimedOut { timeout_ms: 50 }).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "timed_out", "timeout_ms": 50}));
    }
}
