//! The validation gate.
//!
//! The gate is the one stage a pipeline evaluates before anything else. Its
//! agent reports whether upstream data sources are reachable and fresh; the
//! answer is parsed into a [`GateResult`] and judged against a
//! [`GatePolicy`]. Anything that cannot be parsed fails the gate.

mod evaluate;
mod payload;
mod policy;

pub use evaluate::{GateResult, ValidationGate, GATE_RESPONSE_SHAPE};
pub use payload::{parse_gate_payload, GatePayload, CHECKED_AT_FIELDS, UNAVAILABLE_FIELDS};
pub use policy::{GatePolicy, PartialAvailability};
