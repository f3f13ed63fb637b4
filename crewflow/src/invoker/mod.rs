//! Resilient invocation of agents.
//!
//! The invoker walks a preference-ordered strategy list, short-circuits on
//! the first non-empty response, and retries whole passes with backoff.

mod policy;
mod resilient;

pub use policy::{BackoffStrategy, JitterStrategy, RetryPolicy};
pub use resilient::ResilientInvoker;
