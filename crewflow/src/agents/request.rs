//! The payload sent to an agent's strategies.

use super::ToolDefinition;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// Output of an earlier stage made available to a later one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorOutput {
    /// Identifier of the stage that produced the output.
    pub stage: String,
    /// The raw output.
    pub output: serde_json::Value,
}

/// A request forwarded verbatim to every strategy the invoker tries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentRequest {
    /// The stage issuing the request.
    pub stage: String,
    /// Role of the agent being asked.
    pub role: String,
    /// What the agent should do.
    pub description: String,
    /// What the answer should look like.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub expected_output: String,
    /// Outputs of earlier stages, in pipeline order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub context: Vec<PriorOutput>,
    /// Tools the agent may use.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,
}

impl AgentRequest {
    /// Creates a request with no context or tools.
    #[must_use]
    pub fn new(stage: impl Into<String>, role: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            role: role.into(),
            description: description.into(),
            expected_output: String::new(),
            context: Vec::new(),
            tools: Vec::new(),
        }
    }

    /// Sets the expected output description.
    #[must_use]
    pub fn with_expected_output(mut self, expected: impl Into<String>) -> Self {
        self.expected_output = expected.into();
        self
    }

    /// Sets the prior outputs.
    #[must_use]
    pub fn with_context(mut self, context: Vec<PriorOutput>) -> Self {
        self.context = context;
        self
    }

    /// Sets the tools.
    #[must_use]
    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }

    /// Returns the output of an earlier stage, if it was forwarded.
    #[must_use]
    pub fn prior(&self, stage: &str) -> Option<&serde_json::Value> {
        self.context
            .iter()
            .find(|p| p.stage == stage)
            .map(|p| &p.output)
    }

    /// Renders the request as a plain-text prompt for text-only backends.
    #[must_use]
    pub fn to_prompt(&self) -> String {
        let mut prompt = format!("You are acting as: {}\n\nTask: {}\n", self.role, self.description);

        if !self.expected_output.is_empty() {
            let _ = write!(prompt, "\nExpected output:\n{}\n", self.expected_output);
        }

        if !self.context.is_empty() {
            prompt.push_str("\nContext from previous steps:\n");
            for prior in &self.context {
                let rendered = match &prior.output {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                let _ = writeln!(prompt, "[{}]\n{}", prior.stage, rendered);
            }
        }

        if !self.tools.is_empty() {
            let names: Vec<&str> = self.tools.iter().map(|t| t.name.as_str()).collect();
            let _ = write!(prompt, "\nAvailable tools: {}\n", names.join(", "));
        }

        prompt
    }
}
