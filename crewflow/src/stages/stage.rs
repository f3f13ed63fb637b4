//! The stage type.

use crate::agents::{Agent, AgentRequest, PriorOutput};
use crate::cancellation::CancellationToken;
use crate::context::PipelineContext;
use crate::core::StageResult;
use crate::errors::{Cancelled, InvokeError};
use crate::invoker::{ResilientInvoker, RetryPolicy};
use chrono::Utc;
use std::sync::Arc;
use tracing::debug;

/// One unit of work in a pipeline.
#[derive(Debug, Clone)]
pub struct Stage {
    id: String,
    description: String,
    expected_output: String,
    agent: Arc<Agent>,
    is_gate: bool,
    reads: Vec<String>,
    retry: Option<RetryPolicy>,
}

impl Stage {
    /// Creates an ordinary stage.
    #[must_use]
    pub fn new(id: impl Into<String>, description: impl Into<String>, agent: Arc<Agent>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            expected_output: String::new(),
            agent,
            is_gate: false,
            reads: Vec::new(),
            retry: None,
        }
    }

    /// Creates the validation gate stage.
    #[must_use]
    pub fn gate(id: impl Into<String>, description: impl Into<String>, agent: Arc<Agent>) -> Self {
        Self {
            is_gate: true,
            ..Self::new(id, description, agent)
        }
    }

    /// Describes what the stage's answer should look like.
    #[must_use]
    pub fn with_expected_output(mut self, expected: impl Into<String>) -> Self {
        self.expected_output = expected.into();
        self
    }

    /// Restricts which earlier outputs the stage sees.
    ///
    /// Not allowed on the gate, which always runs without context.
    #[must_use]
    pub fn with_reads<I, S>(mut self, reads: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reads = reads.into_iter().map(Into::into).collect();
        self
    }

    /// Overrides the pipeline's retry policy for this stage.
    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = Some(policy);
        self
    }

    /// Returns the stage id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the expected output description.
    #[must_use]
    pub fn expected_output(&self) -> &str {
        &self.expected_output
    }

    /// Returns the agent.
    #[must_use]
    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    /// Returns true for the validation gate.
    #[must_use]
    pub const fn is_gate(&self) -> bool {
        self.is_gate
    }

    /// Returns the stages this one reads; empty means all earlier stages.
    #[must_use]
    pub fn reads(&self) -> &[String] {
        &self.reads
    }

    /// Returns the per-stage retry override.
    #[must_use]
    pub const fn retry_policy(&self) -> Option<&RetryPolicy> {
        self.retry.as_ref()
    }

    /// Returns the invoker this stage uses: the pipeline's, or a copy
    /// carrying the stage's own retry policy.
    #[must_use]
    pub fn invoker(&self, pipeline: &ResilientInvoker) -> ResilientInvoker {
        match &self.retry {
            Some(policy) => pipeline.with_policy(policy.clone()),
            None => pipeline.clone(),
        }
    }

    /// Builds the request sent to the agent with the given context.
    #[must_use]
    pub fn request(&self, context: Vec<PriorOutput>) -> AgentRequest {
        AgentRequest::new(&self.id, self.agent.role(), &self.description)
            .with_expected_output(&self.expected_output)
            .with_context(context)
            .with_tools(self.agent.tools().to_vec())
    }

    /// Builds the request for this stage from the run so far.
    #[must_use]
    pub fn build_request(&self, ctx: &PipelineContext) -> AgentRequest {
        self.request(ctx.prior_outputs(&self.reads))
    }

    /// Runs the stage through the invoker.
    ///
    /// Exhausted retries produce an error result rather than an `Err`.
    ///
    /// # Errors
    ///
    /// Returns `Cancelled` if the token fired during invocation.
    pub async fn run(
        &self,
        ctx: &PipelineContext,
        invoker: &ResilientInvoker,
        cancel: &CancellationToken,
    ) -> Result<StageResult, Cancelled> {
        let started_at = Utc::now();
        let request = self.build_request(ctx);

        match self.invoker(invoker).invoke(&self.agent, &request, cancel).await {
            Ok(output) => {
                debug!(stage = %self.id, agent = self.agent.role(), "Stage produced output");
                Ok(StageResult::ok(&self.id, started_at, output))
            }
            Err(InvokeError::Exhausted(err)) => Ok(StageResult::error(&self.id, started_at, err.to_string())),
            Err(InvokeError::Cancelled(reason)) => Err(Cancelled::new(reason)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::{Strategy, ToolDefinition};
    use crate::core::StageStatus;
    use crate::testing::ScriptedStrategy;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn agent(strategy: ScriptedStrategy) -> Arc<Agent> {
        Arc::new(
            Agent::new("Market Analyst")
                .with_strategy(Strategy::Chat, Arc::new(strategy))
                .with_tool(ToolDefinition::web_search()),
        )
    }

    #[test]
    fn test_request_carries_stage_fields() {
        let stage = Stage::new("analyze", "Analyze the market", agent(ScriptedStrategy::empty()))
            .with_expected_output("A summary")
            .with_reads(["validate"]);

        let mut ctx = PipelineContext::new("p");
        ctx.record(StageResult::ok("validate", Utc::now(), json!("ok"))).unwrap();
        ctx.record(StageResult::ok("extract", Utc::now(), json!("rows"))).unwrap();

        let request = stage.build_request(&ctx);
        assert_eq!(request.stage, "analyze");
        assert_eq!(request.role, "Market Analyst");
        assert_eq!(request.expected_output, "A summary");
        assert_eq!(request.context.len(), 1);
        assert_eq!(request.prior("validate"), Some(&json!("ok")));
        assert_eq!(request.tools.len(), 1);
        assert!(!stage.is_gate());
    }

    #[tokio::test]
    async fn test_run_success() {
        let stage = Stage::new("analyze", "Analyze", agent(ScriptedStrategy::always(json!("trend up"))));
        let result = stage
            .run(
                &PipelineContext::new("p"),
                &ResilientInvoker::new(RetryPolicy::new()),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(result.stage, "analyze");
        assert_eq!(result.status, StageStatus::Ok);
        assert_eq!(result.output, json!("trend up"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_exhaustion_is_error_result() {
        let stage = Stage::new("analyze", "Analyze", agent(ScriptedStrategy::failing("rate limited")));
        let result = stage
            .run(
                &PipelineContext::new("p"),
                &ResilientInvoker::new(RetryPolicy::new().with_max_retries(2)),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(result.status, StageStatus::Error);
        let error = result.error.unwrap();
        assert!(error.contains("after 2 attempts"));
        assert!(error.contains("rate limited"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_per_stage_override_wins() {
        let scripted = Arc::new(ScriptedStrategy::failing("down"));
        let agent = Arc::new(Agent::new("r").with_strategy(Strategy::Chat, scripted.clone()));
        let stage = Stage::new("s", "d", agent).with_retry_policy(RetryPolicy::new().with_max_retries(1));

        let result = stage
            .run(
                &PipelineContext::new("p"),
                &ResilientInvoker::new(RetryPolicy::new().with_max_retries(5)),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert!(!result.is_success());
        assert_eq!(scripted.calls(), 1);
    }
}
