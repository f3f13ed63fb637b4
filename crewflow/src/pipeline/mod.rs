//! Pipeline definition and execution.
//!
//! This module provides:
//! - Pipeline configuration with file and environment loading
//! - A validating builder producing immutable pipeline definitions
//! - The sequential orchestrator and its report

mod builder;
mod config;
mod definition;
mod orchestrator;
mod report;

pub use builder::PipelineBuilder;
pub use config::{
    PipelineConfig, ENV_ATTEMPT_TIMEOUT_SECONDS, ENV_BASE_BACKOFF_SECONDS,
    ENV_GATE_MAX_STALENESS_SECONDS, ENV_MAX_RETRIES,
};
pub use definition::Pipeline;
pub use orchestrator::PipelineOrchestrator;
pub use report::PipelineReport;
