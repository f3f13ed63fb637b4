//! The structured outcome of a run.

use crate::core::{PipelineStatus, RunState, StageResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Everything a caller learns about one run.
///
/// Results are in declared stage order and contain only stages that
/// actually ran.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineReport {
    /// Pipeline name.
    pub pipeline: String,
    /// Unique id of this run.
    pub run_id: Uuid,
    /// Overall outcome.
    pub status: PipelineStatus,
    /// The stage responsible for an abort, failure or cancellation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failing_stage: Option<String>,
    /// Why the run was cancelled, if it was.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancel_reason: Option<String>,
    /// Per-stage results in declared order.
    pub results: Vec<StageResult>,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the run finished.
    pub finished_at: DateTime<Utc>,
    /// The terminal run state.
    pub final_state: RunState,
}

impl PipelineReport {
    /// Returns true if every stage completed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == PipelineStatus::Completed
    }

    /// Returns true if the run stopped because of cancellation.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        self.cancel_reason.is_some()
    }

    /// Returns the result of a stage, if it ran.
    #[must_use]
    pub fn result(&self, stage: &str) -> Option<&StageResult> {
        self.results.iter().find(|r| r.stage == stage)
    }

    /// Returns the ids of the stages that ran, in declared order.
    #[must_use]
    pub fn stage_ids(&self) -> Vec<&str> {
        self.results.iter().map(|r| r.stage.as_str()).collect()
    }

    /// Returns the wall-clock duration in milliseconds.
    #[must_use]
    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }

    /// Renders the report as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if an output cannot be serialized.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn report() -> PipelineReport {
        let now = Utc::now();
        PipelineReport {
            pipeline: "inventory".to_string(),
            run_id: Uuid::new_v4(),
            status: PipelineStatus::Failed,
            failing_stage: Some("purchase".to_string()),
            cancel_reason: None,
            results: vec![
                StageResult::ok("validate", now, json!("fresh")),
                StageResult::error("purchase", now, "backend down"),
            ],
            started_at: now,
            finished_at: now + chrono::Duration::milliseconds(250),
            final_state: RunState::Failed,
        }
    }

    #[test]
    fn test_accessors() {
        let report = report();
        assert!(!report.is_success());
        assert!(!report.is_cancelled());
        assert_eq!(report.stage_ids(), vec!["validate", "purchase"]);
        assert_eq!(report.result("purchase").unwrap().error.as_deref(), Some("backend down"));
        assert!(report.result("policy").is_none());
        assert_eq!(report.duration_ms(), 250);
    }

    #[test]
    fn test_serializes_snake_case_status() {
        let value: serde_json::Value = serde_json::from_str(&report().to_json_pretty().unwrap()).unwrap();
        assert_eq!(value["status"], json!("failed"));
        assert_eq!(value["final_state"], json!("failed"));
        assert_eq!(value["failing_stage"], json!("purchase"));
        assert!(value.get("cancel_reason").is_none());
    }
}
