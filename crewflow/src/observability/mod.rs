//! Observability utilities.

mod subscriber;

pub use subscriber::{filter_directive, init_tracing, LogFormat, LOG_ENV};
