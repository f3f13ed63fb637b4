//! Test assertions for pipeline reports.

use crate::core::PipelineStatus;
use crate::pipeline::PipelineReport;

/// Asserts that every stage ran and succeeded.
pub fn assert_completed(report: &PipelineReport) {
    assert_eq!(
        report.status,
        PipelineStatus::Completed,
        "Expected completed run, failing stage: {:?}, cancel reason: {:?}",
        report.failing_stage,
        report.cancel_reason
    );
    assert!(report.failing_stage.is_none());
    assert!(report.results.iter().all(|r| r.is_success()));
}

/// Asserts that the gate aborted the run and nothing else ran.
pub fn assert_aborted_at_gate(report: &PipelineReport, gate: &str) {
    assert_eq!(report.status, PipelineStatus::AbortedAtGate);
    assert_eq!(report.failing_stage.as_deref(), Some(gate));
    assert_eq!(report.stage_ids(), vec![gate], "Only the gate should have run");
}

/// Asserts that the run failed at `stage`.
pub fn assert_failed_at(report: &PipelineReport, stage: &str) {
    assert_eq!(report.status, PipelineStatus::Failed);
    assert_eq!(report.failing_stage.as_deref(), Some(stage));
}

/// Asserts that the run was cancelled while at `stage`.
pub fn assert_cancelled_at(report: &PipelineReport, stage: &str) {
    assert_failed_at(report, stage);
    assert!(report.is_cancelled(), "Expected a cancel reason");
}

/// Asserts the ids of the stages that ran, in report order.
pub fn assert_stage_order(report: &PipelineReport, expected: &[&str]) {
    assert_eq!(report.stage_ids(), expected, "Unexpected stage results");
}
