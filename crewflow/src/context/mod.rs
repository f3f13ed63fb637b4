//! Per-run state shared between stages.
//!
//! A [`PipelineContext`] is owned by exactly one run. Stages read the
//! outputs of their predecessors from it and the orchestrator records each
//! stage's result into it.

mod run;

pub use run::PipelineContext;
