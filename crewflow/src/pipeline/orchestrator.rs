//! Sequential pipeline execution.

use super::{Pipeline, PipelineBuilder, PipelineConfig, PipelineReport};
use crate::cancellation::CancellationToken;
use crate::context::PipelineContext;
use crate::core::{PipelineStatus, RunState, StageResult};
use crate::errors::{Cancelled, ConfigurationError};
use crate::events::{EventSink, NoOpEventSink};
use crate::gate::ValidationGate;
use crate::invoker::ResilientInvoker;
use crate::stages::Stage;
use chrono::{DateTime, Utc};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Runs pipelines: gate first, then the remaining stages in declared order,
/// stopping at the first failure.
///
/// Every run gets its own context, run id and cancellation token, so one
/// orchestrator can drive several runs concurrently. Failures during a run
/// never surface as `Err`; they are described by the returned
/// [`PipelineReport`].
#[derive(Clone)]
pub struct PipelineOrchestrator {
    events: Arc<dyn EventSink>,
}

impl Default for PipelineOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineOrchestrator {
    /// Creates an orchestrator with no event sink.
    #[must_use]
    pub fn new() -> Self {
        Self {
            events: Arc::new(NoOpEventSink),
        }
    }

    /// Sets the event sink.
    #[must_use]
    pub fn with_event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// Validates an ad-hoc stage list and runs it.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` before invoking anything if the stages
    /// or policies are invalid.
    pub async fn run_stages(
        &self,
        stages: Vec<Stage>,
        config: PipelineConfig,
    ) -> Result<PipelineReport, ConfigurationError> {
        let pipeline = PipelineBuilder::from_config(config).stages(stages).build()?;
        Ok(self.run(&pipeline).await)
    }

    /// Runs a pipeline to completion, abort or failure.
    ///
    /// The run cannot be cancelled; use [`Self::run_with_cancellation`] to
    /// keep a handle on it.
    pub async fn run(&self, pipeline: &Pipeline) -> PipelineReport {
        self.run_with_cancellation(pipeline, &CancellationToken::new()).await
    }

    /// Runs a pipeline, stopping early if `cancel` fires.
    ///
    /// The token is observed by this run only. Other runs on the same
    /// orchestrator are unaffected when it fires.
    pub async fn run_with_cancellation(&self, pipeline: &Pipeline, cancel: &CancellationToken) -> PipelineReport {
        let mut run = Run::new(pipeline, Arc::clone(&self.events));
        let invoker = ResilientInvoker::new(pipeline.retry_policy().clone()).with_event_sink(Arc::clone(&self.events));
        let gate_stage = pipeline.gate();

        info!(pipeline = pipeline.name(), run_id = %run.ctx.run_id(), stages = pipeline.len(), "Pipeline started");
        self.events.try_emit(
            "pipeline.started",
            Some(json!({
                "pipeline": pipeline.name(),
                "run_id": run.ctx.run_id(),
                "stages": pipeline.stages().iter().map(Stage::id).collect::<Vec<_>>(),
                "gate": gate_stage.id(),
            })),
        );

        if let Some(reason) = cancel.reason() {
            return run.cancelled(gate_stage.id(), &reason);
        }

        run.advance(RunState::GateEvaluating);
        let gate = ValidationGate::new(pipeline.gate_policy().clone());
        let gate_result = match gate.evaluate(gate_stage, &invoker, cancel).await {
            Ok(result) => result,
            Err(Cancelled { reason }) => return run.cancelled(gate_stage.id(), &reason),
        };

        let passed = gate_result.is_success();
        self.events.try_emit(
            "gate.evaluated",
            Some(json!({
                "stage": gate_stage.id(),
                "status": gate_result.status,
                "gate": gate_result.gate,
            })),
        );
        if let Err(report) = run.record(gate_result) {
            return *report;
        }

        if !passed {
            self.events.try_emit(
                "pipeline.aborted",
                Some(json!({ "pipeline": pipeline.name(), "stage": gate_stage.id() })),
            );
            return run.finish(RunState::Aborted, Some(gate_stage.id()));
        }

        run.advance(RunState::Running);
        for (index, stage) in pipeline.stages().iter().enumerate() {
            if index == pipeline.gate_index() {
                continue;
            }
            if let Some(reason) = cancel.reason() {
                return run.cancelled(stage.id(), &reason);
            }

            debug!(pipeline = pipeline.name(), stage = stage.id(), "Stage started");
            self.events.try_emit("stage.started", Some(json!({ "stage": stage.id() })));

            let result = match stage.run(&run.ctx, &invoker, cancel).await {
                Ok(result) => result,
                Err(Cancelled { reason }) => return run.cancelled(stage.id(), &reason),
            };

            let ok = result.is_success();
            if ok {
                info!(stage = stage.id(), duration_ms = result.duration_ms(), "Stage completed");
                self.events.try_emit(
                    "stage.completed",
                    Some(json!({ "stage": stage.id(), "duration_ms": result.duration_ms() })),
                );
            } else {
                warn!(stage = stage.id(), error = ?result.error, "Stage failed");
                self.events.try_emit(
                    "stage.failed",
                    Some(json!({ "stage": stage.id(), "error": result.error })),
                );
            }

            if let Err(report) = run.record(result) {
                return *report;
            }
            if !ok {
                return run.finish(RunState::Failed, Some(stage.id()));
            }
        }

        run.finish(RunState::Completed, None)
    }
}

impl std::fmt::Debug for PipelineOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineOrchestrator").finish_non_exhaustive()
    }
}

/// Bookkeeping for one in-flight run.
struct Run<'p> {
    pipeline: &'p Pipeline,
    events: Arc<dyn EventSink>,
    ctx: PipelineContext,
    state: RunState,
    started_at: DateTime<Utc>,
}

impl<'p> Run<'p> {
    fn new(pipeline: &'p Pipeline, events: Arc<dyn EventSink>) -> Self {
        Self {
            pipeline,
            events,
            ctx: PipelineContext::new(pipeline.name()),
            state: RunState::NotStarted,
            started_at: Utc::now(),
        }
    }

    fn advance(&mut self, next: RunState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal run transition {} -> {next}",
            self.state
        );
        debug!(run_id = %self.ctx.run_id(), from = %self.state, to = %next, "Run state changed");
        self.state = next;
    }

    /// Records a result, failing the run if the stage already has one.
    fn record(&mut self, result: StageResult) -> Result<(), Box<PipelineReport>> {
        let stage = result.stage.clone();
        match self.ctx.record(result) {
            Ok(()) => Ok(()),
            Err(err) => {
                error!(stage = %stage, error = %err, "Stage result recorded twice");
                Err(Box::new(self.finish(RunState::Failed, Some(&stage))))
            }
        }
    }

    fn cancelled(&mut self, stage: &str, reason: &str) -> PipelineReport {
        warn!(pipeline = self.pipeline.name(), stage, reason, "Pipeline cancelled");
        self.events.try_emit(
            "pipeline.cancelled",
            Some(json!({ "pipeline": self.pipeline.name(), "stage": stage, "reason": reason })),
        );
        let mut report = self.finish(RunState::Failed, Some(stage));
        report.cancel_reason = Some(reason.to_string());
        report
    }

    fn finish(&mut self, terminal: RunState, failing_stage: Option<&str>) -> PipelineReport {
        self.advance(terminal);
        let status = terminal.pipeline_status().unwrap_or(PipelineStatus::Failed);

        let order: HashMap<&str, usize> = self
            .pipeline
            .stages()
            .iter()
            .enumerate()
            .map(|(i, s)| (s.id(), i))
            .collect();
        let mut results = self.ctx.results().to_vec();
        results.sort_by_key(|r| order.get(r.stage.as_str()).copied().unwrap_or(usize::MAX));

        let report = PipelineReport {
            pipeline: self.pipeline.name().to_string(),
            run_id: self.ctx.run_id(),
            status,
            failing_stage: failing_stage.map(ToString::to_string),
            cancel_reason: None,
            results,
            started_at: self.started_at,
            finished_at: Utc::now(),
            final_state: terminal,
        };

        match status {
            PipelineStatus::Completed => {
                info!(pipeline = %report.pipeline, duration_ms = report.duration_ms(), "Pipeline completed");
                self.events.try_emit(
                    "pipeline.completed",
                    Some(json!({ "pipeline": report.pipeline, "duration_ms": report.duration_ms() })),
                );
            }
            PipelineStatus::AbortedAtGate => {
                warn!(pipeline = %report.pipeline, stage = ?report.failing_stage, "Pipeline aborted at gate");
            }
            PipelineStatus::Failed => {
                warn!(pipeline = %report.pipeline, stage = ?report.failing_stage, "Pipeline failed");
                self.events.try_emit(
                    "pipeline.failed",
                    Some(json!({ "pipeline": report.pipeline, "stage": report.failing_stage })),
                );
            }
        }

        report
    }
}
