//! Core domain model types for crewflow.
//!
//! This module contains the fundamental types used throughout the crate:
//! - Stage, pipeline and run-state enums
//! - The per-stage result record

mod result;
mod status;

pub use result::StageResult;
pub use status::{PipelineStatus, RunState, StageStatus};
