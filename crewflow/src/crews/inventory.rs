//! Inventory optimization crew.

use super::crew_agent;
use crate::agents::{InvocationStrategy, ToolDefinition};
use crate::errors::ConfigurationError;
use crate::pipeline::{Pipeline, PipelineBuilder, PipelineConfig};
use crate::stages::Stage;
use std::sync::Arc;

/// Forecast demand and draft purchase orders, gated on supplier feed
/// freshness.
///
/// The validation stage is declared last but still runs first.
///
/// # Errors
///
/// Returns `ConfigurationError` if `config` holds an invalid policy.
pub fn inventory_optimization(
    backend: &Arc<dyn InvocationStrategy>,
    config: PipelineConfig,
) -> Result<Pipeline, ConfigurationError> {
    let analyst = crew_agent(
        backend,
        "Demand Forecasting Specialist",
        "Predict optimal stock levels using ML models",
        "Data scientist with 8 years in retail analytics",
        &[ToolDefinition::code_interpreter(), ToolDefinition::web_search()],
    );
    let procurement = crew_agent(
        backend,
        "Procurement Optimization Manager",
        "Generate purchase orders balancing cost and lead time",
        "Supply chain expert with global vendor networks",
        &[],
    );
    let validator = crew_agent(
        backend,
        "Data Quality Auditor",
        "Ensure input data integrity and freshness",
        "Data engineer specializing in ETL pipelines",
        &[],
    );

    PipelineBuilder::from_config(config)
        .stage(
            Stage::new("analyze_sales", "Analyze sales trends from last 90 days", analyst)
                .with_expected_output("Time-series forecast with confidence intervals"),
        )
        .stage(
            Stage::new("purchase_orders", "Generate vendor-specific purchase orders", procurement)
                .with_expected_output("XML formatted POs with delivery timelines"),
        )
        .stage(
            Stage::gate(
                "validate_suppliers",
                "Verify supplier API connectivity and data freshness",
                validator,
            )
            .with_expected_output(
                r#"{"status": "ok|error", "last_update": "2025-11-20T05:15:00Z", "failed_sources": ["vendorX_api"]}"#,
            ),
        )
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::PipelineOrchestrator;
    use crate::testing::{assert_aborted_at_gate, failed_gate_payload, ScriptedStrategy};

    #[tokio::test]
    async fn test_stale_suppliers_block_ordering() {
        let scripted = Arc::new(ScriptedStrategy::always(failed_gate_payload(&["vendorX_api"])));
        let backend: Arc<dyn InvocationStrategy> = scripted.clone();
        let crew = inventory_optimization(&backend, PipelineConfig::new("inventory")).unwrap();
        assert_eq!(crew.gate_index(), 2);

        let report = PipelineOrchestrator::new().run(&crew).await;

        assert_aborted_at_gate(&report, "validate_suppliers");
        assert_eq!(scripted.calls(), 1);
        assert_eq!(scripted.last_request().unwrap().role, "Data Quality Auditor");
    }
}
