//! The agent type.

use super::{InvocationStrategy, Strategy, ToolDefinition};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Descriptive profile of an agent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentProfile {
    /// The role the agent plays; also its identifier.
    pub role: String,
    /// What the agent is trying to achieve.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub goal: String,
    /// Background that shapes the agent's answers.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub backstory: String,
}

/// A named executor that can be asked to do work through one or more
/// strategies.
///
/// Agents are assembled with the `with_*` methods and are immutable once
/// shared. Stages hold them behind an `Arc`, so one agent can serve several
/// stages and several concurrent runs.
#[derive(Clone)]
pub struct Agent {
    profile: AgentProfile,
    strategies: BTreeMap<Strategy, Arc<dyn InvocationStrategy>>,
    tools: Vec<ToolDefinition>,
}

impl Agent {
    /// Creates an agent with the given role and no strategies.
    #[must_use]
    pub fn new(role: impl Into<String>) -> Self {
        Self {
            profile: AgentProfile {
                role: role.into(),
                ..AgentProfile::default()
            },
            strategies: BTreeMap::new(),
            tools: Vec::new(),
        }
    }

    /// Sets the goal.
    #[must_use]
    pub fn with_goal(mut self, goal: impl Into<String>) -> Self {
        self.profile.goal = goal.into();
        self
    }

    /// Sets the backstory.
    #[must_use]
    pub fn with_backstory(mut self, backstory: impl Into<String>) -> Self {
        self.profile.backstory = backstory.into();
        self
    }

    /// Registers an implementation for a strategy, replacing any previous one.
    #[must_use]
    pub fn with_strategy(mut self, strategy: Strategy, implementation: Arc<dyn InvocationStrategy>) -> Self {
        self.strategies.insert(strategy, implementation);
        self
    }

    /// Registers one implementation under several strategy names.
    #[must_use]
    pub fn with_strategies(mut self, strategies: &[Strategy], implementation: &Arc<dyn InvocationStrategy>) -> Self {
        for strategy in strategies {
            self.strategies.insert(*strategy, Arc::clone(implementation));
        }
        self
    }

    /// Binds a tool to the agent.
    #[must_use]
    pub fn with_tool(mut self, tool: ToolDefinition) -> Self {
        self.tools.push(tool);
        self
    }

    /// Returns the agent's role.
    #[must_use]
    pub fn role(&self) -> &str {
        &self.profile.role
    }

    /// Returns the full profile.
    #[must_use]
    pub const fn profile(&self) -> &AgentProfile {
        &self.profile
    }

    /// Returns the bound tools.
    #[must_use]
    pub fn tools(&self) -> &[ToolDefinition] {
        &self.tools
    }

    /// Returns true if the agent exposes the strategy.
    #[must_use]
    pub fn supports(&self, strategy: Strategy) -> bool {
        self.strategies.contains_key(&strategy)
    }

    /// Returns the implementation of a strategy, if exposed.
    #[must_use]
    pub fn strategy(&self, strategy: Strategy) -> Option<&Arc<dyn InvocationStrategy>> {
        self.strategies.get(&strategy)
    }

    /// Returns the exposed strategies.
    pub fn strategies(&self) -> impl Iterator<Item = Strategy> + '_ {
        self.strategies.keys().copied()
    }
}

impl fmt::Debug for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Agent")
            .field("role", &self.profile.role)
            .field("strategies", &self.strategies.keys().collect::<Vec<_>>())
            .field("tools", &self.tools.iter().map(|t| &t.name).collect::<Vec<_>>())
            .finish()
    }
}
