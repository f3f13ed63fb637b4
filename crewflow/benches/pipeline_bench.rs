//! Benchmarks for pipeline execution.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use crewflow::prelude::*;
use std::sync::Arc;

fn instant_backend() -> Arc<dyn InvocationStrategy> {
    Arc::new(FnStrategy::new(|req: &AgentRequest| {
        if req.expected_output.contains("unavailable_resources") {
            Ok(serde_json::json!({
                "status": "ok",
                "checked_at": iso_timestamp(),
                "unavailable_resources": [],
            }))
        } else {
            Ok(serde_json::json!(format!("{} output", req.stage)))
        }
    }))
}

fn four_stage_pipeline() -> Pipeline {
    let backend = instant_backend();
    let agent = Arc::new(Agent::new("bench agent").with_strategy(Strategy::Chat, backend));

    Pipeline::builder("bench")
        .stage(Stage::gate("validate", "Check sources", Arc::clone(&agent)))
        .stage(Stage::new("extract", "Extract", Arc::clone(&agent)))
        .stage(Stage::new("analyze", "Analyze", Arc::clone(&agent)))
        .stage(Stage::new("report", "Report", agent))
        .build()
        .expect("bench pipeline is valid")
}

fn pipeline_benchmark(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .expect("runtime");
    let pipeline = four_stage_pipeline();
    let orchestrator = PipelineOrchestrator::new();

    c.bench_function("four_stage_pipeline", |b| {
        b.iter(|| {
            let report = runtime.block_on(orchestrator.run(black_box(&pipeline)));
            black_box(report)
        })
    });

    c.bench_function("gate_judge", |b| {
        let gate = ValidationGate::new(GatePolicy::default());
        let payload = serde_json::json!(
            "```json\n{\"status\": \"ok\", \"last_sync\": \"2025-11-20T05:15:00Z\", \"missing_registries\": []}\n```"
        );
        b.iter(|| black_box(gate.judge(black_box(&payload), chrono::Utc::now())))
    });
}

criterion_group!(benches, pipeline_benchmark);
criterion_main!(benches);
