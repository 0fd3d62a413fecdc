//! Benchmark smoke test for the normalize and aggregate pipeline.

use std::time::Instant;

use sarif_dash_aggregate::{chart_series, summary_metrics};
use sarif_dash_core::AnalysisLog;
use sarif_dash_normalize::normalize;
use serde_json::json;

fn synthetic_log(runs: usize, results_per_run: usize) -> AnalysisLog {
    let runs: Vec<_> = (0..runs)
        .map(|run| {
            let rules: Vec<_> = (0..50)
                .map(|rule| {
                    let level = ["error", "warning", "note"][rule % 3];
                    json!({
                        "id": format!("bench.pkg{run}.rule{rule}"),
                        "shortDescription": {"text": "synthetic rule"},
                        "defaultConfiguration": {"level": level},
                        "properties": {"tags": ["bench"]}
                    })
                })
                .collect();
            let results: Vec<_> = (0..results_per_run)
                .map(|index| {
                    json!({
                        "ruleId": format!("bench.pkg{run}.rule{}", index % 60),
                        "message": {"text": format!("finding {index}")},
                        "locations": [{"physicalLocation": {
                            "artifactLocation": {"uri": format!("src/mod{}/file{}.rs", index % 7, index % 40)},
                            "region": {"startLine": index + 1}
                        }}],
                        "properties": {"fixAvailable": index % 4 == 0}
                    })
                })
                .collect();
            json!({
                "tool": {"driver": {"name": format!("bench-{run}"), "rules": rules}},
                "results": results
            })
        })
        .collect();

    serde_json::from_value(json!({"version": "2.1.0", "runs": runs}))
        .expect("synthetic log should decode")
}

#[test]
fn benchmark_pipeline_smoke_prints_latency() {
    let log = synthetic_log(4, 5_000);

    let start = Instant::now();
    let rows = normalize(&log);
    let charts = chart_series(&log);
    let metrics = summary_metrics(&log);
    let elapsed_ms = start.elapsed().as_millis();

    println!("benchmark_pipeline_elapsed_ms={elapsed_ms}");
    println!("benchmark_rows={}", rows.len());

    assert_eq!(rows.len(), 20_000);
    assert_eq!(metrics.total_findings, 20_000);
    assert_eq!(metrics.fixable_findings, 5_000);
    assert_eq!(charts.rules.len(), 11);
    assert_eq!(
        charts.severity.iter().map(|bucket| bucket.count).sum::<usize>(),
        20_000
    );

    // Lightweight guardrail; strict latency budgets are environment-specific.
    assert!(
        elapsed_ms < 5_000,
        "pipeline smoke benchmark should stay bounded"
    );
}
