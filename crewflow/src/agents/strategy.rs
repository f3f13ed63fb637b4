//! Invocation strategies.

use super::AgentRequest;
use async_trait::async_trait;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};

/// A named way of calling an agent's backend.
///
/// The variants mirror the call styles LLM client libraries tend to expose.
/// Declaration order is the default preference order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Single-shot text generation.
    Generate,
    /// Chat-style completion.
    Chat,
    /// Calling the client object directly.
    DirectCall,
    /// Raw request against the backend API.
    Request,
}

impl Strategy {
    /// All strategies in default preference order.
    pub const ALL: [Self; 4] = [Self::Generate, Self::Chat, Self::DirectCall, Self::Request];

    /// Returns the wire name of the strategy.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Generate => "generate",
            Self::Chat => "chat",
            Self::DirectCall => "direct_call",
            Self::Request => "request",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A backend call the invoker can make on behalf of an agent.
///
/// Implementations forward the request verbatim and return whatever the
/// backend produced. Errors are opaque to crewflow.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InvocationStrategy: Send + Sync {
    /// Invokes the backend with the request.
    async fn invoke(&self, request: &AgentRequest) -> anyhow::Result<serde_json::Value>;
}

/// Returns true if a response carries nothing usable.
///
/// Null, the empty string, and empty arrays or objects are empty.
#[must_use]
pub fn is_empty_response(response: &serde_json::Value) -> bool {
    match response {
        serde_json::Value::Null => true,
        serde_json::Value::String(s) => s.is_empty(),
        serde_json::Value::Array(items) => items.is_empty(),
        serde_json::Value::Object(map) => map.is_empty(),
        serde_json::Value::Bool(_) | serde_json::Value::Number(_) => false,
    }
}

/// A strategy backed by a synchronous closure.
pub struct FnStrategy<F>
where
    F: Fn(&AgentRequest) -> anyhow::Result<serde_json::Value> + Send + Sync,
{
    func: F,
}

impl<F> FnStrategy<F>
where
    F: Fn(&AgentRequest) -> anyhow::Result<serde_json::Value> + Send + Sync,
{
    /// Creates a new closure-backed strategy.
    pub const fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> Debug for FnStrategy<F>
where
    F: Fn(&AgentRequest) -> anyhow::Result<serde_json::Value> + Send + Sync,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnStrategy").finish_non_exhaustive()
    }
}

#[async_trait]
impl<F> InvocationStrategy for FnStrategy<F>
where
    F: Fn(&AgentRequest) -> anyhow::Result<serde_json::Value> + Send + Sync,
{
    async fn invoke(&self, request: &AgentRequest) -> anyhow::Result<serde_json::Value> {
        (self.func)(request)
    }
}

/// A strategy backed by an async closure.
///
/// The closure receives an owned copy of the request so the returned future
/// can be `'static`.
pub struct AsyncFnStrategy<F>
where
    F: Fn(AgentRequest) -> BoxFuture<'static, anyhow::Result<serde_json::Value>> + Send + Sync,
{
    func: F,
}

impl<F> AsyncFnStrategy<F>
where
    F: Fn(AgentRequest) -> BoxFuture<'static, anyhow::Result<serde_json::Value>> + Send + Sync,
{
    /// Creates a new async closure-backed strategy.
    pub const fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> Debug for AsyncFnStrategy<F>
where
    F: Fn(AgentRequest) -> BoxFuture<'static, anyhow::Result<serde_json::Value>> + Send + Sync,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncFnStrategy").finish_non_exhaustive()
    }
}

#[async_trait]
impl<F> InvocationStrategy for AsyncFnStrategy<F>
where
    F: Fn(AgentRequest) -> BoxFuture<'static, anyhow::Result<serde_json::Value>> + Send + Sync,
{
    async fn invoke(&self, request: &AgentRequest) -> anyhow::Result<serde_json::Value> {
        (self.func)(request.clone()).await
    }
}
