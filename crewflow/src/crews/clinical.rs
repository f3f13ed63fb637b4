//! Clinical trial matching crew.

use super::crew_agent;
use crate::agents::{InvocationStrategy, ToolDefinition};
use crate::errors::ConfigurationError;
use crate::pipeline::{Pipeline, PipelineBuilder, PipelineConfig};
use crate::stages::Stage;
use std::sync::Arc;

/// Validate registry access, normalize criteria, screen patients, then
/// prepare referrals.
///
/// # Errors
///
/// Returns `ConfigurationError` if `config` holds an invalid policy.
pub fn clinical_trial_matching(
    backend: &Arc<dyn InvocationStrategy>,
    config: PipelineConfig,
) -> Result<Pipeline, ConfigurationError> {
    let coordinator = crew_agent(
        backend,
        "Clinical Research Coordinator",
        "Identify eligible patients and coordinate trial enrollment",
        "CRC with experience in oncology trial workflows",
        &[ToolDefinition::web_search()],
    );
    let data_engineer = crew_agent(
        backend,
        "Trial Registry Data Engineer",
        "Aggregate and normalize trial metadata from registries",
        "Data engineer focused on clinical data pipelines",
        &[ToolDefinition::code_interpreter()],
    );
    let screener = crew_agent(
        backend,
        "Patient Screening Specialist",
        "Screen EHR data for eligibility criteria",
        "Clinical informaticist skilled at EHR-derived phenotyping",
        &[],
    );

    PipelineBuilder::from_config(config)
        .stage(
            Stage::gate(
                "validate_registries",
                "Verify clinical registry API access and timestamp freshness",
                Arc::clone(&data_engineer),
            )
            .with_expected_output(
                r#"{"status": "ok|error", "last_sync": "2025-11-20T05:15:00Z", "missing_registries": ["euctr"]}"#,
            ),
        )
        .stage(
            Stage::new(
                "normalize_criteria",
                "Normalize trial inclusion/exclusion criteria from registries",
                data_engineer,
            )
            .with_expected_output("Structured criteria usable for programmatic matching"),
        )
        .stage(
            Stage::new(
                "screen_patients",
                "Screen patient EHR records for candidate matches",
                screener,
            )
            .with_expected_output("Ranked list of candidate patients with match scores"),
        )
        .stage(
            Stage::new(
                "referral_summaries",
                "Generate referral summaries and enrollment instructions",
                coordinator,
            )
            .with_expected_output("Patient-facing referral package and site contact info"),
        )
        .build()
}
