//! Pipeline stages.
//!
//! A stage pairs a description of work with the agent that does it. Stages
//! carry no execution state; the orchestrator passes them the run context
//! and the invoker to use.

mod stage;

pub use stage::Stage;
