//! # Crewflow
//!
//! Sequential agent pipelines with a validation gate and resilient
//! invocation.
//!
//! Crewflow runs a fixed, ordered list of stages, each bound to an agent:
//!
//! - **Validation gate**: one stage checks upstream sources before any
//!   other stage runs; a failed or unparseable answer aborts the run
//! - **Resilient invocation**: every call walks the agent's strategies in
//!   preference order and retries whole passes with backoff
//! - **Forward context**: each stage sees the outputs of earlier stages
//! - **Structured reports**: failures come back as a [`pipeline::PipelineReport`],
//!   never as errors; only configuration problems are returned as `Err`
//! - **Cancellation**: a cooperative token is checked before each stage and
//!   each attempt, and interrupts backoff sleeps
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use crewflow::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), ConfigurationError> {
//! let backend: Arc<dyn InvocationStrategy> = Arc::new(FnStrategy::new(|req: &AgentRequest| {
//!     Ok(serde_json::json!(format!("handled {}", req.stage)))
//! }));
//! let agent = Arc::new(Agent::new("Analyst").with_strategy(Strategy::Chat, backend));
//!
//! let pipeline = PipelineBuilder::new("demo")
//!     .stage(Stage::gate("validate", "Check data freshness", Arc::clone(&agent)))
//!     .stage(Stage::new("analyze", "Summarize the data", agent))
//!     .build()?;
//!
//! let report = PipelineOrchestrator::new().run(&pipeline).await;
//! println!("{:?} {:?}", report.status, report.failing_stage);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod agents;
pub mod cancellation;
pub mod context;
pub mod core;
pub mod crews;
pub mod errors;
pub mod events;
pub mod gate;
pub mod invoker;
pub mod observability;
pub mod pipeline;
pub mod stages;
pub mod testing;
pub mod utils;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::agents::{
        Agent, AgentProfile, AgentRequest, AsyncFnStrategy, FnStrategy, InvocationStrategy,
        PriorOutput, Strategy, ToolDefinition, ToolKind,
    };
    pub use crate::cancellation::CancellationToken;
    pub use crate::context::PipelineContext;
    pub use crate::core::{PipelineStatus, RunState, StageResult, StageStatus};
    pub use crate::errors::{
        ConfigurationError, ContractErrorInfo, CrewflowError, ExhaustedRetriesError,
        GateParseError, InvocationError, InvokeError,
    };
    pub use crate::events::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::gate::{GatePolicy, GateResult, PartialAvailability, ValidationGate};
    pub use crate::invoker::{BackoffStrategy, JitterStrategy, ResilientInvoker, RetryPolicy};
    pub use crate::observability::{init_tracing, LogFormat};
    pub use crate::pipeline::{
        Pipeline, PipelineBuilder, PipelineConfig, PipelineOrchestrator, PipelineReport,
    };
    pub use crate::stages::Stage;
    pub use crate::utils::{iso_timestamp, parse_timestamp};
}
