//! Pipeline builder with validation.

use super::{Pipeline, PipelineConfig};
use crate::errors::ConfigurationError;
use crate::gate::GatePolicy;
use crate::invoker::RetryPolicy;
use crate::stages::Stage;
use std::collections::HashSet;

/// Builder for creating validated pipelines.
#[derive(Debug, Clone)]
pub struct PipelineBuilder {
    name: String,
    stages: Vec<Stage>,
    retry: RetryPolicy,
    gate_policy: GatePolicy,
}

impl PipelineBuilder {
    /// Creates a new pipeline builder with default policies.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stages: Vec::new(),
            retry: RetryPolicy::default(),
            gate_policy: GatePolicy::default(),
        }
    }

    /// Creates a builder that takes its name and policies from `config`.
    #[must_use]
    pub fn from_config(config: PipelineConfig) -> Self {
        Self {
            name: config.name,
            stages: Vec::new(),
            retry: config.retry,
            gate_policy: config.gate,
        }
    }

    /// Appends a stage.
    #[must_use]
    pub fn stage(mut self, stage: Stage) -> Self {
        self.stages.push(stage);
        self
    }

    /// Appends several stages.
    #[must_use]
    pub fn stages(mut self, stages: impl IntoIterator<Item = Stage>) -> Self {
        self.stages.extend(stages);
        self
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

    /// Returns the pipeline name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Validates the stages and policies and builds the pipeline.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if the pipeline is empty, has duplicate
    /// stage ids, does not have exactly one gate, has a stage reading from a
    /// stage that does not run before it, has an invalid policy, or binds an
    /// agent that exposes none of the strategies its policy tries.
    pub fn build(self) -> Result<Pipeline, ConfigurationError> {
        if self.stages.is_empty() {
            return Err(ConfigurationError::empty_pipeline(&self.name));
        }

        let mut seen = HashSet::new();
        for stage in &self.stages {
            if !seen.insert(stage.id()) {
                return Err(ConfigurationError::duplicate_stage(stage.id()));
            }
        }

        let gates: Vec<usize> = self
            .stages
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_gate())
            .map(|(i, _)| i)
            .collect();
        let gate_index = match gates.as_slice() {
            [] => return Err(ConfigurationError::missing_gate(&self.name)),
            [index] => *index,
            _ => {
                let ids = gates.iter().map(|&i| self.stages[i].id().to_string()).collect();
                return Err(ConfigurationError::multiple_gates(&self.name, ids));
            }
        };

        self.retry.validate()?;
        self.gate_policy.validate()?;

        // The gate runs before everything else, so any stage may read it.
        let gate_id = self.stages[gate_index].id();
        let mut earlier: HashSet<&str> = HashSet::from([gate_id]);
        for stage in &self.stages {
            if stage.is_gate() {
                if !stage.reads().is_empty() {
                    return Err(ConfigurationError::gate_reads(stage.id()));
                }
            } else if let Some(source) = stage.reads().iter().find(|r| !earlier.contains(r.as_str())) {
                return Err(ConfigurationError::unknown_read(stage.id(), source));
            }
            earlier.insert(stage.id());

            let policy = match stage.retry_policy() {
                Some(policy) => {
                    policy
                        .validate()
                        .map_err(|e| e.with_stages(vec![stage.id().to_string()]))?;
                    policy
                }
                None => &self.retry,
            };
            if !policy.strategies.iter().any(|s| stage.agent().supports(*s)) {
                return Err(ConfigurationError::no_usable_strategy(stage.id(), stage.agent().role()));
            }
        }

        Ok(Pipeline {
            name: self.name,
            stages: self.stages,
            gate_index,
            retry: self.retry,
            gate_policy: self.gate_policy,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::{Agent, Strategy};
    use crate::testing::{scripted_agent, ScriptedStrategy};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;

    fn agent() -> Arc<Agent> {
        scripted_agent("worker", ScriptedStrategy::always(json!("done")))
    }

    fn gate(id: &str) -> Stage {
        Stage::gate(id, "validate", agent())
    }

    fn work(id: &str) -> Stage {
        Stage::new(id, "work", agent())
    }

    fn code(result: Result<Pipeline, ConfigurationError>) -> String {
        result.unwrap_err().code().unwrap_or_default().to_string()
    }

    #[test]
    fn test_build_valid_pipeline() {
        let pipeline = PipelineBuilder::new("p")
            .stage(work("a"))
            .stage(gate("g"))
            .stage(work("b"))
            .build()
            .unwrap();

        assert_eq!(pipeline.name(), "p");
        assert_eq!(pipeline.len(), 3);
        assert_eq!(pipeline.gate().id(), "g");
        assert_eq!(pipeline.gate_index(), 1);
        assert!(pipeline.stage("b").is_some());
    }

    #[test]
    fn test_empty_pipeline_rejected() {
        assert_eq!(code(PipelineBuilder::new("p").build()), "CONFIG-001-EMPTY");
    }

    #[test]
    fn test_gate_count_enforced() {
        assert_eq!(code(PipelineBuilder::new("p").stage(work("a")).build()), "CONFIG-002-NO_GATE");

        let err = PipelineBuilder::new("p")
            .stages([gate("g1"), work("a"), gate("g2")])
            .build()
            .unwrap_err();
        assert_eq!(err.code(), Some("CONFIG-003-MULTIPLE_GATES"));
        assert_eq!(err.stages, vec!["g1", "g2"]);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let result = PipelineBuilder::new("p").stages([gate("g"), work("a"), work("a")]).build();
        assert_eq!(code(result), "CONFIG-004-DUPLICATE");
    }

    #[test]
    fn test_reads_must_precede() {
        let ok = PipelineBuilder::new("p")
            .stages([work("a").with_reads(["g"]), gate("g"), work("b").with_reads(["a", "g"])])
            .build();
        assert!(ok.is_ok());

        let forward = PipelineBuilder::new("p")
            .stages([gate("g"), work("a").with_reads(["b"]), work("b")])
            .build();
        assert_eq!(code(forward), "CONFIG-005-UNKNOWN_READ");

        let unknown = PipelineBuilder::new("p")
            .stages([gate("g"), work("a").with_reads(["nope"])])
            .build();
        assert_eq!(code(unknown), "CONFIG-005-UNKNOWN_READ");
    }

    #[test]
    fn test_gate_cannot_read() {
        let result = PipelineBuilder::new("p")
            .stages([work("a"), gate("g").with_reads(["a"])])
            .build();
        assert_eq!(code(result), "CONFIG-008-GATE_READS");

        let unknown = PipelineBuilder::new("p")
            .stages([gate("g").with_reads(["nope"]), work("a")])
            .build();
        assert_eq!(code(unknown), "CONFIG-008-GATE_READS");
    }

    #[test]
    fn test_invalid_policies_rejected() {
        let result = PipelineBuilder::new("p")
            .stage(gate("g"))
            .with_retry_policy(RetryPolicy::new().with_max_retries(0))
            .build();
        assert_eq!(code(result), "CONFIG-006-POLICY");

        let err = PipelineBuilder::new("p")
            .stages([gate("g"), work("a").with_retry_policy(RetryPolicy::new().with_strategies(Vec::<Strategy>::new()))])
            .build()
            .unwrap_err();
        assert_eq!(err.code(), Some("CONFIG-006-POLICY"));
        assert_eq!(err.stages, vec!["a"]);
    }

    #[test]
    fn test_agent_without_usable_strategy_rejected() {
        let chat_only = Arc::new(
            Agent::new("chatty").with_strategy(Strategy::Chat, Arc::new(ScriptedStrategy::empty())),
        );
        let result = PipelineBuilder::new("p")
            .stages([gate("g"), Stage::new("a", "work", chat_only)])
            .with_retry_policy(RetryPolicy::new().with_strategies(vec![Strategy::Generate]))
            .build();
        assert_eq!(code(result), "CONFIG-007-NO_STRATEGY");
    }

    #[test]
    fn test_from_config_carries_policies() {
        let config = PipelineConfig::new("cfg").with_retry_policy(RetryPolicy::new().with_max_retries(9));
        let pipeline = PipelineBuilder::from_config(config).stage(gate("g")).build().unwrap();
        assert_eq!(pipeline.name(), "cfg");
        assert_eq!(pipeline.retry_policy().max_retries, 9);
        assert_eq!(pipeline.config().name, "cfg");
    }
}
