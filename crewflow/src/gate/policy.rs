//! Gate judgement policy.

use crate::errors::ConfigurationError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What to do when the gate says `ok` but lists unavailable resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartialAvailability {
    /// Treat it as a failed gate.
    #[default]
    Abort,
    /// Let the pipeline run with what is available.
    Proceed,
}

/// How the gate's parsed payload is judged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GatePolicy {
    /// Handling of `ok` with a non-empty unavailable list.
    #[serde(default)]
    pub partial_availability: PartialAvailability,
    /// Maximum age of the reported check time, in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_staleness_seconds: Option<f64>,
}

impl GatePolicy {
    /// Creates the default policy: abort on partial availability, no freshness window.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the partial-availability handling.
    #[must_use]
    pub const fn with_partial_availability(mut self, handling: PartialAvailability) -> Self {
        self.partial_availability = handling;
        self
    }

    /// Sets the freshness window.
    #[must_use]
    pub fn with_max_staleness(mut self, window: Duration) -> Self {
        self.max_staleness_seconds = Some(window.as_secs_f64());
        self
    }

    /// Returns the freshness window as a chrono duration.
    #[must_use]
    pub fn max_staleness(&self) -> Option<chrono::Duration> {
        self.max_staleness_seconds
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
            .and_then(|window| chrono::Duration::from_std(window).ok())
    }

    /// Checks the policy is usable.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if the freshness window is not positive
    /// or too large to represent.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        match self.max_staleness_seconds {
            Some(secs) if !(secs.is_finite() && secs > 0.0) => Err(ConfigurationError::invalid_policy(
                format!("max_staleness_seconds must be positive, got {secs}"),
            )),
            Some(secs) if self.max_staleness().is_none() => Err(ConfigurationError::invalid_policy(
                format!("max_staleness_seconds is out of range, got {secs}"),
            )),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_aborts_on_partial() {
        let policy = GatePolicy::default();
        assert_eq!(policy.partial_availability, PartialAvailability::Abort);
        assert!(policy.max_staleness().is_none());
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn test_staleness_window() {
        let policy = GatePolicy::new().with_max_staleness(Duration::from_secs(3600));
        assert_eq!(policy.max_staleness(), Some(chrono::Duration::hours(1)));

        let bad = GatePolicy {
            max_staleness_seconds: Some(0.0),
            ..GatePolicy::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_unrepresentable_window_rejected() {
        let huge = GatePolicy {
            max_staleness_seconds: Some(1e20),
            ..GatePolicy::default()
        };
        assert!(huge.max_staleness().is_none());
        let err = huge.validate().unwrap_err();
        assert!(err.to_string().contains("out of range"));

        let year = GatePolicy::new().with_max_staleness(Duration::from_secs(365 * 24 * 3600));
        assert!(year.validate().is_ok());
    }

    #[test]
    fn test_deserialize() {
        let policy: GatePolicy = serde_json::from_str(r#"{"partial_availability": "proceed"}"#).unwrap();
        assert_eq!(policy.partial_availability, PartialAvailability::Proceed);
    }
}
