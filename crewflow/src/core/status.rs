//! Stage, pipeline and run status enums.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The outcome of a single stage (or of the gate check).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    /// Stage completed successfully.
    Ok,
    /// Stage failed.
    Error,
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "ok"),
            Self::Error => write!(f, "error"),
        }
    }
}

impl StageStatus {
    /// Returns true if the status indicates success.
    #[must_use]
    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }
}

/// Overall status of a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStatus {
    /// Every stage completed with `ok`.
    Completed,
    /// The validation gate reported `error`; nothing else ran.
    AbortedAtGate,
    /// A stage failed or the run was cancelled.
    Failed,
}

impl fmt::Display for PipelineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => write!(f, "completed"),
            Self::AbortedAtGate => write!(f, "aborted_at_gate"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Lifecycle of a single run.
///
/// `NotStarted -> GateEvaluating -> {Aborted | Running} -> {Completed | Failed}`.
/// Cancellation moves any non-terminal state to `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    /// The run has not begun.
    #[default]
    NotStarted,
    /// The gate stage is being evaluated.
    GateEvaluating,
    /// The gate failed.
    Aborted,
    /// Work stages are executing.
    Running,
    /// Every stage succeeded.
    Completed,
    /// A stage failed or the run was cancelled.
    Failed,
}

impl RunState {
    /// Returns true if no further transitions are possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Aborted | Self::Completed | Self::Failed)
    }

    /// Returns true if moving from `self` to `next` is a legal transition.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::NotStarted, Self::GateEvaluating | Self::Failed)
                | (Self::GateEvaluating, Self::Aborted | Self::Running | Self::Failed)
                | (Self::Running, Self::Completed | Self::Failed)
        )
    }

    /// The report status for a terminal state.
    #[must_use]
    pub const fn pipeline_status(self) -> Option<PipelineStatus> {
        match self {
            Self::Aborted => Some(PipelineStatus::AbortedAtGate),
            Self::Completed => Some(PipelineStatus::Completed),
            Self::Failed => Some(PipelineStatus::Failed),
            Self::NotStarted | Self::GateEvaluating | Self::Running => None,
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NotStarted => "not_started",
            Self::GateEvaluating => "gate_evaluating",
            Self::Aborted => "aborted",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_status_serialize() {
        let json = serde_json::to_string(&StageStatus::Error).unwrap();
        assert_eq!(json, r#""error""#);
        let back: StageStatus = serde_json::from_str(r#""ok""#).unwrap();
        assert_eq!(back, StageStatus::Ok);
    }

    #[test]
    fn test_pipeline_status_names() {
        assert_eq!(PipelineStatus::AbortedAtGate.to_string(), "aborted_at_gate");
        let json = serde_json::to_string(&PipelineStatus::AbortedAtGate).unwrap();
        assert_eq!(json, r#""aborted_at_gate""#);
    }

    #[test]
    fn test_run_state_transitions() {
        use RunState::*;
        assert!(NotStarted.can_transition_to(GateEvaluating));
        assert!(GateEvaluating.can_transition_to(Aborted));
        assert!(GateEvaluating.can_transition_to(Running));
        assert!(Running.can_transition_to(Completed));
        assert!(Running.can_transition_to(Failed));

        assert!(!NotStarted.can_transition_to(Running));
        assert!(!Aborted.can_transition_to(Running));
        assert!(!Completed.can_transition_to(Failed));
        assert!(!Running.can_transition_to(Aborted));
    }

    #[test]
    fn test_terminal_states_map_to_report_status() {
        assert_eq!(RunState::Aborted.pipeline_status(), Some(PipelineStatus::AbortedAtGate));
        assert_eq!(RunState::Completed.pipeline_status(), Some(PipelineStatus::Completed));
        assert_eq!(RunState::Failed.pipeline_status(), Some(PipelineStatus::Failed));
        assert!(RunState::Running.pipeline_status().is_none());
        assert!(!RunState::GateEvaluating.is_terminal());
    }
}
