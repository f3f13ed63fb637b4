//! Incident triage crew.

use super::crew_agent;
use crate::agents::{InvocationStrategy, ToolDefinition};
use crate::errors::ConfigurationError;
use crate::pipeline::{Pipeline, PipelineBuilder, PipelineConfig};
use crate::stages::Stage;
use std::sync::Arc;

/// Validate alerting webhooks, diagnose, plan remediation, then decide on
/// escalation.
///
/// # Errors
///
/// Returns `ConfigurationError` if `config` holds an invalid policy.
pub fn incident_triage(
    backend: &Arc<dyn InvocationStrategy>,
    config: PipelineConfig,
) -> Result<Pipeline, ConfigurationError> {
    let oncall = crew_agent(
        backend,
        "On-call Site Reliability Engineer",
        "Diagnose production outages and recommend remediation steps",
        "SRE with 6 years handling distributed system incidents",
        &[ToolDefinition::code_interpreter(), ToolDefinition::web_search()],
    );
    let diagnostics = crew_agent(
        backend,
        "Automated Diagnostics Agent",
        "Run health checks, collect logs and surface root-cause signals",
        "Observability specialist embedded into monitoring stack",
        &[],
    );
    let escalation = crew_agent(
        backend,
        "Incident Escalation Coordinator",
        "Decide when to escalate and prepare communications",
        "Incident manager with experience coordinating cross-team response",
        &[],
    );

    PipelineBuilder::from_config(config)
        .stage(
            Stage::gate(
                "validate_webhooks",
                "Verify monitoring and alerting webhook connectivity",
                Arc::clone(&diagnostics),
            )
            .with_expected_output(
                r#"{"status": "ok|error", "last_checked": "2025-11-20T05:15:00Z", "failed_endpoints": ["pagerduty_webhook"]}"#,
            ),
        )
        .stage(
            Stage::new(
                "diagnose",
                "Run automated diagnostics across services flagged by alerts",
                diagnostics,
            )
            .with_expected_output("List of failing services, error traces, and likely root causes"),
        )
        .stage(
            Stage::new(
                "remediate",
                "Produce incident remediation steps and escalation notes",
                oncall,
            )
            .with_expected_output("Step-by-step playbook + teams to notify"),
        )
        .stage(
            Stage::new(
                "escalate",
                "Prepare stakeholder communication and decide escalation",
                escalation,
            )
            .with_expected_output("Incident severity, timeline, and escalation decision"),
        )
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoker::RetryPolicy;
    use crate::agents::Strategy;

    #[test]
    fn test_invalid_config_rejected() {
        let backend: Arc<dyn InvocationStrategy> =
            Arc::new(crate::testing::ScriptedStrategy::empty());
        let config = PipelineConfig::new("triage").with_retry_policy(RetryPolicy::new().with_max_retries(0));
        let err = incident_triage(&backend, config).unwrap_err();
        assert_eq!(err.code(), Some("CONFIG-006-POLICY"));
    }

    #[test]
    fn test_remediation_agent_has_tools() {
        let backend: Arc<dyn InvocationStrategy> =
            Arc::new(crate::testing::ScriptedStrategy::empty());
        let crew = incident_triage(&backend, PipelineConfig::new("triage")).unwrap();
        let remediate = crew.stage("remediate").unwrap();
        assert_eq!(remediate.agent().tools().len(), 2);
        assert!(remediate.agent().supports(Strategy::DirectCall));
    }
}
