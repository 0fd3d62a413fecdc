//! Integration tests for dashboard derivation, memoization, and sessions.

mod common;

use std::sync::Arc;

use common::{VALID_LOG, WRONG_VERSION_LOG, fixture_document};
use sarif_dash_app::{AppError, DashboardCache, DashboardSession, build_dashboard};
use sarif_dash_intake::{IntakeError, MemoryBlob};

#[test]
fn dashboard_metrics_match_fixture() {
    let document = fixture_document();
    let dashboard = build_dashboard(&document.log);

    assert_eq!(dashboard.rows.len(), 3);
    assert_eq!(dashboard.metrics.total_findings, 3);
    assert_eq!(dashboard.metrics.unique_files, 2);
    assert_eq!(dashboard.metrics.fixable_findings, 1);
    assert_eq!(dashboard.metrics.fixable_percent, 33);
    assert_eq!(dashboard.metrics.avg_findings_per_file_display(), "1.5");
    assert_eq!(
        dashboard.metrics.most_common_rule.display_label(),
        "sequelize-raw-query"
    );
}

#[test]
fn dashboard_rows_resolve_rule_fallbacks() {
    let dashboard = build_dashboard(&fixture_document().log);
    let severities: Vec<&str> = dashboard.rows.iter().map(|row| row.severity.as_str()).collect();
    assert_eq!(severities, vec!["Error", "Warning", "Unknown"]);

    assert_eq!(dashboard.rows[0].tags, vec!["security", "cwe-89"]);
    assert_eq!(dashboard.rows[1].tags, vec!["style"]);
    assert_eq!(dashboard.rows[2].file_name, "Unknown");

    let counts: Vec<usize> = dashboard.charts.severity.iter().map(|b| b.count).collect();
    assert_eq!(counts, vec![1, 1, 0, 0, 1]);
    let extensions: Vec<&str> = dashboard
        .charts
        .extensions
        .iter()
        .map(|bucket| bucket.name.as_str())
        .collect();
    assert_eq!(extensions, vec![".js", ".py"]);
}

#[test]
fn cache_rebuilds_only_for_a_new_document() {
    let document = fixture_document();
    let mut cache = DashboardCache::new();

    let first = cache.get(&document.log);
    let second = cache.get(&document.log);
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(cache.builds(), 1);

    let reloaded = fixture_document();
    let third = cache.get(&reloaded.log);
    assert_eq!(cache.builds(), 2);
    assert_eq!(*first, *third);
}

#[test]
fn failed_load_keeps_previous_document() {
    let mut session = DashboardSession::new();
    assert!(session.dashboard().is_none());

    let loaded = session
        .load(&MemoryBlob::new("scan.sarif", VALID_LOG))
        .expect("valid load");
    assert!(loaded);
    assert_eq!(session.dashboard().map(|d| d.rows.len()), Some(3));

    let error = session
        .load(&MemoryBlob::new("old.sarif", WRONG_VERSION_LOG))
        .expect_err("2.0.0 is rejected");
    assert!(matches!(error, AppError::Intake(IntakeError::Invalid(_))));

    let unreadable = session.load(&MemoryBlob::new("bin.sarif", vec![0xc3_u8, 0x28]));
    assert!(matches!(
        unreadable,
        Err(AppError::Intake(IntakeError::Read { .. }))
    ));

    assert_eq!(session.current().map(|doc| doc.name.as_str()), Some("scan.sarif"));
    session.dashboard();
    assert_eq!(session.dashboard_builds(), 1);
}

#[test]
fn rejected_first_upload_leaves_session_empty() {
    let mut session = DashboardSession::new();
    assert!(session.load(&MemoryBlob::new("old.sarif", WRONG_VERSION_LOG)).is_err());
    assert!(session.current().is_none());
    assert!(session.dashboard().is_none());
}

#[test]
fn dashboard_serializes_for_json_output() {
    let dashboard = build_dashboard(&fixture_document().log);
    let value = serde_json::to_value(&dashboard).expect("dashboard serializes");
    assert_eq!(value["metrics"]["total_findings"], 3);
    assert_eq!(value["rows"][0]["fileName"], "src/db/users.js");
    assert_eq!(value["charts"]["severity"][0]["color"], "#ef4444");
}
