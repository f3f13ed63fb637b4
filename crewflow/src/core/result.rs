//! Per-stage result record.

use super::StageStatus;
use crate::gate::GateResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What one stage produced in one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageResult {
    /// Stage identifier.
    pub stage: String,
    /// Stage status.
    pub status: StageStatus,
    /// Raw output; the error description when the stage failed.
    pub output: serde_json::Value,
    /// When the stage started.
    pub started_at: DateTime<Utc>,
    /// When the stage completed.
    pub completed_at: DateTime<Utc>,
    /// Parsed gate outcome, present only for the validation gate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gate: Option<GateResult>,
    /// Error message if failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StageResult {
    /// Creates a successful result.
    #[must_use]
    pub fn ok(stage: impl Into<String>, started_at: DateTime<Utc>, output: serde_json::Value) -> Self {
        Self {
            stage: stage.into(),
            status: StageStatus::Ok,
            output,
            started_at,
            completed_at: Utc::now(),
            gate: None,
            error: None,
        }
    }

    /// Creates a failed result whose output is the error description.
    #[must_use]
    pub fn error(stage: impl Into<String>, started_at: DateTime<Utc>, error: impl Into<String>) -> Self {
        let error = error.into();
        Self {
            stage: stage.into(),
            status: StageStatus::Error,
            output: serde_json::Value::String(error.clone()),
            started_at,
            completed_at: Utc::now(),
            gate: None,
            error: Some(error),
        }
    }

    /// Creates the gate's result; its status follows the gate outcome.
    #[must_use]
    pub fn gate(
        stage: impl Into<String>,
        started_at: DateTime<Utc>,
        output: serde_json::Value,
        gate: GateResult,
    ) -> Self {
        let error = (!gate.status.is_ok()).then(|| gate.describe_failure());
        Self {
            stage: stage.into(),
            status: gate.status,
            output,
            started_at,
            completed_at: Utc::now(),
            gate: Some(gate),
            error,
        }
    }

    /// Returns the duration in milliseconds.
    #[must_use]
    pub fn duration_ms(&self) -> i64 {
        (self.completed_at - self.started_at).num_milliseconds()
    }

    /// Returns true if the stage succeeded.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::StageStatus;
    use std::collections::BTreeSet;

    #[test]
    fn test_ok_result() {
        let result = StageResult::ok("analyze", Utc::now(), serde_json::json!("trend up"));
        assert!(result.is_success());
        assert!(result.error.is_none());
        assert!(result.gate.is_none());
        assert!(result.completed_at >= result.started_at);
    }

    #[test]
    fn test_error_result_carries_description_as_output() {
        let result = StageResult::error("analyze", Utc::now(), "backend down");
        assert!(!result.is_success());
        assert_eq!(result.output, serde_json::json!("backend down"));
        assert_eq!(result.error.as_deref(), Some("backend down"));
    }

    #[test]
    fn test_gate_result_status_follows_gate() {
        let gate = GateResult {
            status: StageStatus::Error,
            checked_at: Utc::now(),
            unavailable_resources: BTreeSet::from(["euctr".to_string()]),
        };
        let result = StageResult::gate("validate", Utc::now(), serde_json::json!({}), gate);
        assert_eq!(result.status, StageStatus::Error);
        assert!(result.error.unwrap().contains("euctr"));
    }

    #[test]
    fn test_serialization_omits_absent_fields() {
        let result = StageResult::ok("s", Utc::now(), serde_json::json!(1));
        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("gate").is_none());
        assert!(json.get("error").is_none());
        assert_eq!(json["status"], "ok");
    }
}
