//! Event sinks for run observability.
//!
//! The orchestrator and invoker report lifecycle transitions to an
//! [`EventSink`] owned by the orchestrator. There is no process-wide sink;
//! each orchestrator carries its own.

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};
