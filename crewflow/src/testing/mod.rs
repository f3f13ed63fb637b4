//! Testing utilities for crewflow pipelines.
//!
//! This module provides:
//! - Scripted invocation strategies and a shared call log
//! - Fixtures for gate payloads, agents and whole pipelines
//! - Assertions over pipeline reports

mod assertions;
mod fixtures;
mod mocks;

pub use assertions::{
    assert_aborted_at_gate, assert_cancelled_at, assert_completed, assert_failed_at,
    assert_stage_order,
};
pub use fixtures::{failed_gate_payload, fresh_gate_payload, scripted_agent, TestPipeline};
pub use mocks::{CallLog, ScriptedStrategy};
