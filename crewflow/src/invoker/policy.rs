//! Retry policy with configurable backoff and jitter.

use crate::agents::Strategy;
use crate::errors::ConfigurationError;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Backoff strategy for delays between passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffStrategy {
    /// delay = base * attempt
    #[default]
    Linear,
    /// delay = base * 2^(attempt - 1)
    Exponential,
    /// delay = base
    Constant,
}

/// Jitter strategy to spread out concurrent retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JitterStrategy {
    /// No jitter
    #[default]
    None,
    /// Random from 0 to delay
    Full,
    /// Half fixed, half random
    Equal,
}

/// How an agent invocation is retried.
///
/// One attempt is a full pass over `strategies`. `max_retries` is the total
/// number of passes, not the number of extra ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Number of passes over the strategy list.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Base delay between passes in seconds.
    #[serde(default = "default_base_backoff")]
    pub base_backoff_seconds: f64,
    /// How the delay grows with the attempt number.
    #[serde(default)]
    pub backoff: BackoffStrategy,
    /// Upper bound on a single delay in seconds.
    #[serde(default = "default_max_backoff")]
    pub max_backoff_seconds: f64,
    /// Jitter applied after capping.
    #[serde(default)]
    pub jitter: JitterStrategy,
    /// Deadline for a single strategy call in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attempt_timeout_seconds: Option<f64>,
    /// Strategies to try, in preference order.
    #[serde(default = "default_strategies")]
    pub strategies: Vec<Strategy>,
}

fn default_max_retries() -> u32 {
    3
}

fn default_base_backoff() -> f64 {
    1.5
}

fn default_max_backoff() -> f64 {
    30.0
}

fn default_strategies() -> Vec<Strategy> {
    Strategy::ALL.to_vec()
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_backoff_seconds: default_base_backoff(),
            backoff: BackoffStrategy::default(),
            max_backoff_seconds: default_max_backoff(),
            jitter: JitterStrategy::default(),
            attempt_timeout_seconds: None,
            strategies: default_strategies(),
        }
    }
}

impl RetryPolicy {
    /// Creates a new retry policy with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of passes.
    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the base backoff.
    #[must_use]
    pub fn with_base_backoff(mut self, backoff: Duration) -> Self {
        self.base_backoff_seconds = backoff.as_secs_f64();
        self
    }

    /// Sets the maximum backoff.
    #[must_use]
    pub fn with_max_backoff(mut self, backoff: Duration) -> Self {
        self.max_backoff_seconds = backoff.as_secs_f64();
        self
    }

    /// Sets the backoff strategy.
    #[must_use]
    pub const fn with_backoff(mut self, strategy: BackoffStrategy) -> Self {
        self.backoff = strategy;
        self
    }

    /// Sets the jitter strategy.
    #[must_use]
    pub const fn with_jitter(mut self, strategy: JitterStrategy) -> Self {
        self.jitter = strategy;
        self
    }

    /// Sets the per-call deadline.
    #[must_use]
    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout_seconds = Some(timeout.as_secs_f64());
        self
    }

    /// Sets the strategy preference list.
    #[must_use]
    pub fn with_strategies(mut self, strategies: impl Into<Vec<Strategy>>) -> Self {
        self.strategies = strategies.into();
        self
    }

    /// Returns the per-call deadline, if any.
    #[must_use]
    pub fn attempt_timeout(&self) -> Option<Duration> {
        self.attempt_timeout_seconds
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
    }

    /// Checks the policy is usable.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` for zero passes, a non-positive backoff,
    /// an empty strategy list, or a non-positive timeout.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.max_retries == 0 {
            return Err(ConfigurationError::invalid_policy("max_retries must be at least 1"));
        }
        if !(self.base_backoff_seconds.is_finite() && self.base_backoff_seconds > 0.0) {
            return Err(ConfigurationError::invalid_policy(format!(
                "base_backoff_seconds must be positive, got {}",
                self.base_backoff_seconds
            )));
        }
        if !(self.max_backoff_seconds.is_finite() && self.max_backoff_seconds >= self.base_backoff_seconds) {
            return Err(ConfigurationError::invalid_policy(
                "max_backoff_seconds must be finite and at least base_backoff_seconds",
            ));
        }
        if self.strategies.is_empty() {
            return Err(ConfigurationError::invalid_policy("strategies must not be empty"));
        }
        if let Some(timeout) = self.attempt_timeout_seconds {
            if !(timeout.is_finite() && timeout > 0.0) {
                return Err(ConfigurationError::invalid_policy(format!(
                    "attempt_timeout_seconds must be positive, got {timeout}"
                )));
            }
        }
        Ok(())
    }

    /// Calculates the delay after a failed pass (1-indexed).
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let base = Duration::try_from_secs_f64(self.base_backoff_seconds).unwrap_or_default();
        let max = Duration::try_from_secs_f64(self.max_backoff_seconds).unwrap_or(Duration::MAX);
        let attempt = attempt.max(1);

        let delay = match self.backoff {
            BackoffStrategy::Linear => base.saturating_mul(attempt),
            BackoffStrategy::Exponential => base.saturating_mul(2u32.saturating_pow(attempt - 1)),
            BackoffStrategy::Constant => base,
        }
        .min(max);

        match self.jitter {
            JitterStrategy::None => delay,
            JitterStrategy::Full => delay.mul_f64(rand::thread_rng().gen_range(0.0..=1.0)),
            JitterStrategy::Equal => {
                let half = delay / 2;
                half + half.mul_f64(rand::thread_rng().gen_range(0.0..=1.0))
            }
        }
    }
}
