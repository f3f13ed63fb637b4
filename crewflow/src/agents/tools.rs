//! Tool metadata bound to agents.

use serde::{Deserialize, Serialize};

/// The broad capability a tool provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    /// Web search provider.
    WebSearch,
    /// Code execution / calculator sandbox.
    CodeInterpreter,
    /// Anything else.
    Custom,
}

/// Definition of a tool an agent may use.
///
/// crewflow never calls tools. The definition travels inside the request so
/// the backend can offer the tool to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// The tool name.
    pub name: String,
    /// What kind of capability this is.
    pub kind: ToolKind,
    /// Description of what the tool does.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl ToolDefinition {
    /// Creates a new tool definition.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: ToolKind) -> Self {
        Self {
            name: name.into(),
            kind,
            description: String::new(),
        }
    }

    /// A web search tool.
    #[must_use]
    pub fn web_search() -> Self {
        Self::new("web_search", ToolKind::WebSearch)
            .with_description("Search the web for current information")
    }

    /// A code interpreter tool.
    #[must_use]
    pub fn code_interpreter() -> Self {
        Self::new("code_interpreter", ToolKind::CodeInterpreter)
            .with_description("Execute code for calculations and data analysis")
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }
}
