//! Validated pipeline definitions.

use super::{PipelineBuilder, PipelineConfig};
use crate::gate::GatePolicy;
use crate::invoker::RetryPolicy;
use crate::stages::Stage;

/// An immutable, validated sequence of stages with exactly one gate.
///
/// Built with [`PipelineBuilder`]; a `Pipeline` value is always runnable.
#[derive(Debug, Clone)]
pub struct Pipeline {
    pub(super) name: String,
    pub(super) stages: Vec<Stage>,
    pub(super) gate_index: usize,
    pub(super) retry: RetryPolicy,
    pub(super) gate_policy: GatePolicy,
}

impl Pipeline {
    /// Starts building a pipeline.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> PipelineBuilder {
        PipelineBuilder::new(name)
    }

    /// Returns the pipeline name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the stages in declared order.
    #[must_use]
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Returns a stage by id.
    #[must_use]
    pub fn stage(&self, id: &str) -> Option<&Stage> {
        self.stages.iter().find(|s| s.id() == id)
    }

    /// Returns the gate stage.
    #[must_use]
    pub fn gate(&self) -> &Stage {
        &self.stages[self.gate_index]
    }

    /// Returns the gate's position in declared order.
    #[must_use]
    pub const fn gate_index(&self) -> usize {
        self.gate_index
    }

    /// Returns the number of stages, gate included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Always false; an empty pipeline cannot be built.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Returns the default retry policy.
    #[must_use]
    pub const fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Returns the gate policy.
    #[must_use]
    pub const fn gate_policy(&self) -> &GatePolicy {
        &self.gate_policy
    }

    /// Returns the pipeline-level configuration.
    #[must_use]
    pub fn config(&self) -> PipelineConfig {
        PipelineConfig {
            name: self.name.clone(),
            retry: self.retry.clone(),
            gate: self.gate_policy.clone(),
        }
    }
}
