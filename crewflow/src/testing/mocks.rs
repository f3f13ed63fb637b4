//! Scripted strategies for testing.

use crate::agents::{AgentRequest, InvocationStrategy};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Shared, ordered record of which strategies were called.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl CallLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry.
    pub fn push(&self, entry: impl Into<String>) {
        self.entries.lock().push(entry.into());
    }

    /// Returns a copy of the entries in call order.
    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }

    /// Returns true if nothing was logged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

#[derive(Debug)]
enum Script {
    Always(Result<Value, String>),
    Sequence(Vec<Result<Value, String>>),
    Hanging,
}

/// A strategy that answers from a fixed script and counts its calls.
#[derive(Debug)]
pub struct ScriptedStrategy {
    script: Script,
    calls: AtomicUsize,
    requests: Mutex<Vec<AgentRequest>>,
    log: Option<(CallLog, String)>,
}

impl ScriptedStrategy {
    fn with_script(script: Script) -> Self {
        Self {
            script,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
            log: None,
        }
    }

    /// Always returns the value.
    #[must_use]
    pub fn always(value: Value) -> Self {
        Self::with_script(Script::Always(Ok(value)))
    }

    /// Always raises an error with the message.
    #[must_use]
    pub fn failing(message: &str) -> Self {
        Self::with_script(Script::Always(Err(message.to_string())))
    }

    /// Always returns an empty string.
    #[must_use]
    pub fn empty() -> Self {
        Self::always(Value::String(String::new()))
    }

    /// Never returns.
    #[must_use]
    pub fn hanging() -> Self {
        Self::with_script(Script::Hanging)
    }

    /// Answers call `n` with entry `n`; the last entry repeats once the
    /// script runs out.
    #[must_use]
    pub fn sequence(script: Vec<Result<Value, String>>) -> Self {
        Self::with_script(Script::Sequence(script))
    }

    /// Records each call under `label` in a shared log.
    #[must_use]
    pub fn with_log(mut self, log: &CallLog, label: &str) -> Self {
        self.log = Some((log.clone(), label.to_string()));
        self
    }

    /// Returns how many times the strategy was called.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Returns every request received, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<AgentRequest> {
        self.requests.lock().clone()
    }

    /// Returns the most recent request, if any.
    #[must_use]
    pub fn last_request(&self) -> Option<AgentRequest> {
        self.requests.lock().last().cloned()
    }
}

#[async_trait]
impl InvocationStrategy for ScriptedStrategy {
    async fn invoke(&self, request: &AgentRequest) -> anyhow::Result<Value> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(request.clone());
        if let Some((log, label)) = &self.log {
            log.push(label.as_str());
        }

        let answer = match &self.script {
            Script::Always(answer) => answer.clone(),
            Script::Sequence(steps) => steps
                .get(call)
                .or_else(|| steps.last())
                .cloned()
                .unwrap_or(Ok(Value::Null)),
            Script::Hanging => std::future::pending().await,
        };

        answer.map_err(anyhow::Error::msg)
    }
}
