//! Multi-strategy invocation with bounded retries.

use super::RetryPolicy;
use crate::agents::{is_empty_response, Agent, AgentRequest, InvocationStrategy, Strategy};
use crate::cancellation::CancellationToken;
use crate::errors::{ExhaustedRetriesError, InvocationAttempt, InvocationError, InvokeError};
use crate::events::{EventSink, NoOpEventSink};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Calls an agent through its strategies until one returns a usable
/// response.
///
/// Each attempt is one pass over the policy's strategy list, skipping
/// strategies the agent does not expose. The first non-empty response wins
/// and nothing else is called afterwards. A strategy that errors, times out
/// or answers empty is recorded and the next one is tried. After a pass with
/// no winner the invoker sleeps `policy.delay_for(attempt)` and starts the
/// next pass; after `max_retries` passes it gives up.
#[derive(Clone)]
pub struct ResilientInvoker {
    policy: RetryPolicy,
    events: Arc<dyn EventSink>,
}

impl ResilientInvoker {
    /// Creates an invoker with the given policy.
    #[must_use]
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            events: Arc::new(NoOpEventSink),
        }
    }

    /// Sets the sink that receives per-attempt diagnostics.
    #[must_use]
    pub fn with_event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// Returns a copy of this invoker that uses a different policy but
    /// reports to the same sink.
    #[must_use]
    pub fn with_policy(&self, policy: RetryPolicy) -> Self {
        Self {
            policy,
            events: Arc::clone(&self.events),
        }
    }

    /// Returns the retry policy.
    #[must_use]
    pub const fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Invokes the agent with the request.
    ///
    /// # Errors
    ///
    /// Returns [`InvokeError::Exhausted`] when every pass failed, or
    /// [`InvokeError::Cancelled`] if the token fired first.
    pub async fn invoke(
        &self,
        agent: &Agent,
        request: &AgentRequest,
        cancel: &CancellationToken,
    ) -> Result<serde_json::Value, InvokeError> {
        let max_retries = self.policy.max_retries.max(1);
        let mut trace: Vec<InvocationAttempt> = Vec::new();
        let mut last_error: Option<InvocationError> = None;

        for attempt in 1..=max_retries {
            for &strategy in &self.policy.strategies {
                let Some(implementation) = agent.strategy(strategy) else {
                    continue;
                };

                let outcome = tokio::select! {
                    biased;
                    () = cancel.cancelled() => return Err(cancelled(cancel)),
                    outcome = self.call(implementation.as_ref(), request) => outcome,
                };

                let error = match outcome {
                    Ok(response) if !is_empty_response(&response) => {
                        debug!(
                            agent = agent.role(),
                            strategy = %strategy,
                            attempt,
                            "Invocation succeeded"
                        );
                        return Ok(response);
                    }
                    Ok(_) => InvocationError::Empty,
                    Err(err) => {
                        last_error = Some(err.clone());
                        err
                    }
                };

                self.record_failure(agent, strategy, attempt, &error);
                trace.push(InvocationAttempt {
                    strategy,
                    attempt,
                    error,
                });
            }

            if attempt < max_retries {
                let delay = self.policy.delay_for(attempt);
                debug!(
                    agent = agent.role(),
                    attempt,
                    delay_ms = millis(delay),
                    "No usable response, backing off"
                );
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => return Err(cancelled(cancel)),
                    () = tokio::time::sleep(delay) => {}
                }
            }
        }

        let err = ExhaustedRetriesError {
            agent: agent.role().to_string(),
            attempts: max_retries,
            last_error,
            trace,
        };
        warn!(agent = agent.role(), attempts = max_retries, error = %err, "Invocation exhausted");
        self.events.try_emit(
            "invocation.exhausted",
            Some(serde_json::json!({
                "agent": agent.role(),
                "attempts": max_retries,
                "last_error": err.last_error.as_ref().map(ToString::to_string),
            })),
        );
        Err(err.into())
    }

    async fn call(
        &self,
        implementation: &dyn InvocationStrategy,
        request: &AgentRequest,
    ) -> Result<serde_json::Value, InvocationError> {
        match self.policy.attempt_timeout() {
            Some(deadline) => match tokio::time::timeout(deadline, implementation.invoke(request)).await {
                Ok(result) => result.map_err(|e| InvocationError::raised(format!("{e:#}"))),
                Err(_) => Err(InvocationError::TimedOut {
                    timeout_ms: millis(deadline),
                }),
            },
            None => implementation
                .invoke(request)
                .await
                .map_err(|e| InvocationError::raised(format!("{e:#}"))),
        }
    }

    fn record_failure(&self, agent: &Agent, strategy: Strategy, attempt: u32, error: &InvocationError) {
        debug!(
            agent = agent.role(),
            strategy = %strategy,
            attempt,
            error = %error,
            "Invocation attempt failed"
        );
        self.events.try_emit(
            "invocation.attempt_failed",
            Some(serde_json::json!({
                "agent": agent.role(),
                "strategy": strategy,
                "attempt": attempt,
                "error": error.to_string(),
            })),
        );
    }
}

impl std::fmt::Debug for ResilientInvoker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResilientInvoker")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

fn cancelled(cancel: &CancellationToken) -> InvokeError {
    InvokeError::Cancelled(cancel.reason().unwrap_or_else(|| "cancelled".to_string()))
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
