//! Agents and the invocation strategies they expose.
//!
//! An [`Agent`] is an immutable bundle of a profile, a set of named
//! [`Strategy`] implementations, and tool metadata. The invoker only ever
//! calls strategies the agent declares; tools are forwarded to the backend
//! inside the request and never called by crewflow itself.

mod agent;
mod request;
mod strategy;
mod tools;

pub use agent::{Agent, AgentProfile};
pub use request::{AgentRequest, PriorOutput};
pub use strategy::{
    is_empty_response, AsyncFnStrategy, FnStrategy, InvocationStrategy, Strategy,
};
#[cfg(test)]
pub use strategy::MockInvocationStrategy;
pub use tools::{ToolDefinition, ToolKind};
