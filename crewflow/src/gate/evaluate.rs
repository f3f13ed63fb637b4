//! Gate evaluation.

use super::{parse_gate_payload, GatePolicy, PartialAvailability};
use crate::cancellation::CancellationToken;
use crate::core::{StageResult, StageStatus};
use crate::errors::{Cancelled, ExhaustedRetriesError, GateParseError, InvokeError};
use crate::invoker::ResilientInvoker;
use crate::stages::Stage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{info, warn};

/// The JSON shape the gate asks its agent to answer with.
pub const GATE_RESPONSE_SHAPE: &str = r#"{
  "status": "ok" or "error",
  "checked_at": "<ISO-8601 time of the check>",
  "unavailable_resources": ["<each unreachable or stale source>"]
}"#;

/// Structured outcome of the validation gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateResult {
    /// Whether the pipeline may proceed.
    pub status: StageStatus,
    /// When the sources were last checked.
    pub checked_at: DateTime<Utc>,
    /// Sources that are unreachable, stale, or a description of why the
    /// gate answer could not be used.
    pub unavailable_resources: BTreeSet<String>,
}

impl GateResult {
    /// A failed gate describing why the agent's answer could not be parsed.
    #[must_use]
    pub fn parse_failure(err: &GateParseError, now: DateTime<Utc>) -> Self {
        Self {
            status: StageStatus::Error,
            checked_at: now,
            unavailable_resources: BTreeSet::from([format!("gate_parse_error: {err}")]),
        }
    }

    /// A failed gate describing why the agent could not be reached.
    #[must_use]
    pub fn invocation_failure(err: &ExhaustedRetriesError, now: DateTime<Utc>) -> Self {
        Self {
            status: StageStatus::Error,
            checked_at: now,
            unavailable_resources: BTreeSet::from([format!("gate_invocation_failed: {err}")]),
        }
    }

    /// Returns true if the gate passed.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.status.is_ok()
    }

    /// One-line explanation of a failed gate.
    #[must_use]
    pub fn describe_failure(&self) -> String {
        if self.unavailable_resources.is_empty() {
            "validation gate reported error".to_string()
        } else {
            let resources: Vec<&str> = self.unavailable_resources.iter().map(String::as_str).collect();
            format!("validation gate failed: {}", resources.join(", "))
        }
    }
}

/// Runs the gate stage and judges its answer.
#[derive(Debug, Clone, Default)]
pub struct ValidationGate {
    policy: GatePolicy,
}

impl ValidationGate {
    /// Creates a gate with the given policy.
    #[must_use]
    pub const fn new(policy: GatePolicy) -> Self {
        Self { policy }
    }

    /// Returns the policy.
    #[must_use]
    pub const fn policy(&self) -> &GatePolicy {
        &self.policy
    }

    /// Turns a raw agent answer into a gate result.
    ///
    /// Parse failures always fail the gate. A parsed `ok` still fails when
    /// resources are missing under [`PartialAvailability::Abort`], or when
    /// the check time falls outside the freshness window.
    #[must_use]
    pub fn judge(&self, raw: &serde_json::Value, now: DateTime<Utc>) -> GateResult {
        let payload = match parse_gate_payload(raw) {
            Ok(payload) => payload,
            Err(err) => return GateResult::parse_failure(&err, now),
        };

        let mut status = payload.status;
        let mut unavailable = payload.unavailable_resources;

        if status.is_ok()
            && !unavailable.is_empty()
            && self.policy.partial_availability == PartialAvailability::Abort
        {
            status = StageStatus::Error;
        }

        if let Some(window) = self.policy.max_staleness() {
            let skew = now.signed_duration_since(payload.checked_at);
            if skew > window || -skew > window {
                status = StageStatus::Error;
                unavailable.insert(format!("stale: {}", payload.checked_at.to_rfc3339()));
            }
        }

        GateResult {
            status,
            checked_at: payload.checked_at,
            unavailable_resources: unavailable,
        }
    }

    /// Invokes the gate stage's agent and judges the answer.
    ///
    /// Exhausted retries fail the gate rather than erroring.
    ///
    /// # Errors
    ///
    /// Returns `Cancelled` if the token fired during invocation.
    pub async fn evaluate(
        &self,
        stage: &Stage,
        invoker: &ResilientInvoker,
        cancel: &CancellationToken,
    ) -> Result<StageResult, Cancelled> {
        let started_at = Utc::now();
        let request = stage.request(Vec::new()).with_expected_output(validation_instructions(stage));

        let (raw, gate) = match stage.invoker(invoker).invoke(stage.agent(), &request, cancel).await {
            Ok(raw) => {
                let gate = self.judge(&raw, Utc::now());
                (raw, gate)
            }
            Err(InvokeError::Exhausted(err)) => {
                let gate = GateResult::invocation_failure(&err, Utc::now());
                (serde_json::Value::String(err.to_string()), gate)
            }
            Err(InvokeError::Cancelled(reason)) => return Err(Cancelled::new(reason)),
        };

        if gate.is_ok() {
            info!(stage = stage.id(), checked_at = %gate.checked_at, "Validation gate passed");
        } else {
            warn!(
                stage = stage.id(),
                unavailable = ?gate.unavailable_resources,
                "Validation gate failed"
            );
        }

        Ok(StageResult::gate(stage.id(), started_at, raw, gate))
    }
}

fn validation_instructions(stage: &Stage) -> String {
    let shape = format!("Respond with a single JSON object of this shape:\n{GATE_RESPONSE_SHAPE}");
    if stage.expected_output().is_empty() {
        shape
    } else {
        format!("{}\n\n{shape}", stage.expected_output())
    }
}
