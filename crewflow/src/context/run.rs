//! The run context.

use crate::agents::PriorOutput;
use crate::core::StageResult;
use crate::errors::DuplicateResultError;
use std::collections::HashMap;
use uuid::Uuid;

/// Results recorded so far in one pipeline run, in execution order.
#[derive(Debug, Clone)]
pub struct PipelineContext {
    run_id: Uuid,
    pipeline: String,
    results: Vec<StageResult>,
    index: HashMap<String, usize>,
}

impl PipelineContext {
    /// Creates an empty context with a fresh run id.
    #[must_use]
    pub fn new(pipeline: impl Into<String>) -> Self {
        Self::with_run_id(pipeline, Uuid::new_v4())
    }

    /// Creates an empty context with the given run id.
    #[must_use]
    pub fn with_run_id(pipeline: impl Into<String>, run_id: Uuid) -> Self {
        Self {
            run_id,
            pipeline: pipeline.into(),
            results: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Returns the run id.
    #[must_use]
    pub const fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Returns the pipeline name.
    #[must_use]
    pub fn pipeline(&self) -> &str {
        &self.pipeline
    }

    /// Records a stage result.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateResultError` if the stage already has a result.
    pub fn record(&mut self, result: StageResult) -> Result<(), DuplicateResultError> {
        if self.index.contains_key(&result.stage) {
            return Err(DuplicateResultError::new(&result.stage));
        }
        self.index.insert(result.stage.clone(), self.results.len());
        self.results.push(result);
        Ok(())
    }

    /// Returns the result recorded for a stage.
    #[must_use]
    pub fn get(&self, stage: &str) -> Option<&StageResult> {
        self.index.get(stage).map(|&i| &self.results[i])
    }

    /// Returns the raw output recorded for a stage.
    #[must_use]
    pub fn output(&self, stage: &str) -> Option<&serde_json::Value> {
        self.get(stage).map(|r| &r.output)
    }

    /// Returns true if the stage has a result.
    #[must_use]
    pub fn contains(&self, stage: &str) -> bool {
        self.index.contains_key(stage)
    }

    /// Returns all results in execution order.
    #[must_use]
    pub fn results(&self) -> &[StageResult] {
        &self.results
    }

    /// Returns the number of recorded results.
    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Returns true if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Consumes the context, returning its results in execution order.
    #[must_use]
    pub fn into_results(self) -> Vec<StageResult> {
        self.results
    }

    /// Collects the outputs a stage is allowed to see.
    ///
    /// An empty `reads` list means every recorded output. Otherwise only the
    /// named stages are included. Either way outputs keep execution order.
    #[must_use]
    pub fn prior_outputs(&self, reads: &[String]) -> Vec<PriorOutput> {
        self.results
            .iter()
            .filter(|r| reads.is_empty() || reads.iter().any(|s| s == &r.stage))
            .map(|r| PriorOutput {
                stage: r.stage.clone(),
                output: r.output.clone(),
            })
            .collect()
    }
}
