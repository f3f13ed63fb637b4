//! Ready-made crews.
//!
//! Each crew is a validated [`Pipeline`](crate::pipeline::Pipeline) whose
//! agents all delegate to one caller-supplied backend, registered as
//! [`Strategy::Chat`](crate::agents::Strategy::Chat). The retry policy must
//! list `Chat`; each pass then calls the backend once.

mod clinical;
mod inventory;
mod triage;

pub use clinical::clinical_trial_matching;
pub use inventory::inventory_optimization;
pub use triage::incident_triage;

use crate::agents::{Agent, InvocationStrategy, Strategy, ToolDefinition};
use std::sync::Arc;

fn crew_agent(
    backend: &Arc<dyn InvocationStrategy>,
    role: &str,
    goal: &str,
    backstory: &str,
    tools: &[ToolDefinition],
) -> Arc<Agent> {
    let agent = tools.iter().cloned().fold(
        Agent::new(role)
            .with_goal(goal)
            .with_backstory(backstory)
            .with_strategy(Strategy::Chat, Arc::clone(backend)),
        Agent::with_tool,
    );
    Arc::new(agent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::{AgentRequest, FnStrategy};
    use crate::invoker::RetryPolicy;
    use crate::pipeline::{PipelineConfig, PipelineOrchestrator};
    use crate::testing::{assert_aborted_at_gate, assert_completed, fresh_gate_payload, ScriptedStrategy};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::time::Duration;

    /// Answers gate requests with a fresh payload and echoes everything else.
    fn backend() -> Arc<dyn InvocationStrategy> {
        Arc::new(FnStrategy::new(|req: &AgentRequest| {
            if req.expected_output.contains("unavailable_resources") {
                Ok(fresh_gate_payload())
            } else {
                Ok(json!(format!("{} done", req.stage)))
            }
        }))
    }

    #[test]
    fn test_crew_agent_shares_backend() {
        let backend = backend();
        let agent = crew_agent(&backend, "r", "g", "b", &[ToolDefinition::web_search()]);
        assert_eq!(agent.strategies().collect::<Vec<_>>(), vec![Strategy::Chat]);
        assert_eq!(agent.tools().len(), 1);
        assert_eq!(agent.profile().backstory, "b");
    }

    #[tokio::test]
    async fn test_every_crew_completes() {
        let crews = [
            clinical_trial_matching(&backend(), PipelineConfig::new("clinical")).unwrap(),
            inventory_optimization(&backend(), PipelineConfig::new("inventory")).unwrap(),
            incident_triage(&backend(), PipelineConfig::new("triage")).unwrap(),
        ];

        for crew in &crews {
            let report = PipelineOrchestrator::new().run(crew).await;
            assert_completed(&report);
            assert_eq!(report.results.len(), crew.len());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_backend_called_once_per_pass() {
        let scripted = Arc::new(ScriptedStrategy::failing("503 Service Unavailable"));
        let backend: Arc<dyn InvocationStrategy> = scripted.clone();
        let config = PipelineConfig::new("inventory").with_retry_policy(
            RetryPolicy::new()
                .with_max_retries(3)
                .with_base_backoff(Duration::from_millis(10)),
        );
        let crew = inventory_optimization(&backend, config).unwrap();

        let report = PipelineOrchestrator::new().run(&crew).await;

        assert_aborted_at_gate(&report, "validate_suppliers");
        assert_eq!(scripted.calls(), 3);
    }

    #[test]
    fn test_policy_without_chat_is_rejected() {
        let config = PipelineConfig::new("triage")
            .with_retry_policy(RetryPolicy::new().with_strategies(vec![Strategy::Generate]));
        let err = incident_triage(&backend(), config).unwrap_err();
        assert_eq!(err.code(), Some("CONFIG-007-NO_STRATEGY"));
    }
}
