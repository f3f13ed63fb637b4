//! Fixtures for building test agents and pipelines.

use super::{CallLog, ScriptedStrategy};
use crate::agents::{Agent, Strategy};
use crate::errors::ConfigurationError;
use crate::gate::GatePolicy;
use crate::invoker::RetryPolicy;
use crate::pipeline::{Pipeline, PipelineBuilder};
use crate::stages::Stage;
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

/// A gate answer reporting every source reachable and checked just now.
#[must_use]
pub fn fresh_gate_payload() -> Value {
    json!({
        "status": "ok",
        "checked_at": Utc::now().to_rfc3339(),
        "unavailable_resources": [],
    })
}

/// A gate answer reporting the given sources as unreachable.
#[must_use]
pub fn failed_gate_payload(unavailable: &[&str]) -> Value {
    json!({
        "status": "error",
        "checked_at": Utc::now().to_rfc3339(),
        "unavailable_resources": unavailable,
    })
}

/// An agent that answers every request through the chat strategy.
#[must_use]
pub fn scripted_agent(role: &str, strategy: ScriptedStrategy) -> Arc<Agent> {
    Arc::new(Agent::new(role).with_strategy(Strategy::Chat, Arc::new(strategy)))
}

/// Builds a pipeline of scripted stages and keeps handles on their
/// strategies so tests can check who was called and in what order.
///
/// Every stage logs its id to a shared [`CallLog`] when invoked.
#[derive(Debug)]
pub struct TestPipeline {
    name: String,
    stages: Vec<Stage>,
    strategies: Vec<(String, Arc<ScriptedStrategy>)>,
    log: CallLog,
    retry: RetryPolicy,
    gate_policy: GatePolicy,
}

impl TestPipeline {
    /// Creates an empty test pipeline with two fast passes per stage.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stages: Vec::new(),
            strategies: Vec::new(),
            log: CallLog::new(),
            retry: RetryPolicy::new()
                .with_max_retries(2)
                .with_base_backoff(Duration::from_millis(10)),
            gate_policy: GatePolicy::default(),
        }
    }

    /// Appends a gate stage.
    #[must_use]
    pub fn gate(self, id: &str, strategy: ScriptedStrategy) -> Self {
        self.push(id, strategy, true, |stage| stage)
    }

    /// Appends a work stage.
    #[must_use]
    pub fn stage(self, id: &str, strategy: ScriptedStrategy) -> Self {
        self.push(id, strategy, false, |stage| stage)
    }

    /// Appends a work stage after adjusting it.
    #[must_use]
    pub fn stage_with(self, id: &str, strategy: ScriptedStrategy, adjust: impl FnOnce(Stage) -> Stage) -> Self {
        self.push(id, strategy, false, adjust)
    }

    /// Sets the default retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Sets the gate policy.
    #[must_use]
    pub fn with_gate_policy(mut self, policy: GatePolicy) -> Self {
        self.gate_policy = policy;
        self
    }

    fn push(mut self, id: &str, strategy: ScriptedStrategy, gate: bool, adjust: impl FnOnce(Stage) -> Stage) -> Self {
        let strategy = Arc::new(strategy.with_log(&self.log, id));
        let agent = Arc::new(Agent::new(format!("{id} agent")).with_strategy(Strategy::Chat, strategy.clone()));
        let stage = if gate {
            Stage::gate(id, format!("{id} task"), agent)
        } else {
            Stage::new(id, format!("{id} task"), agent)
        };
        self.stages.push(adjust(stage));
        self.strategies.push((id.to_string(), strategy));
        self
    }

    /// Returns the declared stages.
    #[must_use]
    pub fn stages(&self) -> Vec<Stage> {
        self.stages.clone()
    }

    /// Validates and builds the pipeline.
    ///
    /// # Errors
    ///
    /// Returns the builder's `ConfigurationError`.
    pub fn build(&self) -> Result<Pipeline, ConfigurationError> {
        PipelineBuilder::new(&self.name)
            .stages(self.stages.clone())
            .with_retry_policy(self.retry.clone())
            .with_gate_policy(self.gate_policy.clone())
            .build()
    }

    /// Returns the strategy bound to a stage.
    ///
    /// # Panics
    ///
    /// Panics if no stage has the id.
    #[must_use]
    pub fn strategy(&self, id: &str) -> &ScriptedStrategy {
        self.strategies
            .iter()
            .find(|(stage, _)| stage == id)
            .map(|(_, strategy)| strategy.as_ref())
            .unwrap_or_else(|| panic!("no stage '{id}' in test pipeline"))
    }

    /// Returns how many times a stage's agent was invoked.
    #[must_use]
    pub fn calls(&self, id: &str) -> usize {
        self.strategy(id).calls()
    }

    /// Returns stage ids in invocation order, one entry per call.
    #[must_use]
    pub fn invocation_order(&self) -> Vec<String> {
        self.log.entries()
    }
}
