//! Integration tests for recording documents and reopening them by id.

mod common;

use std::sync::Arc;

use common::{fixture_document, memory_history};
use sarif_dash_app::{AppError, build_dashboard, load_entry, record_document};
use sarif_dash_history::{DirSessionBackend, EXPIRY_MS, HistoryError, HistoryStore};

#[test]
fn reopened_entry_yields_identical_rows() {
    let history = memory_history();
    let document = fixture_document();
    let entry = record_document(&history, &document, 1_000).expect("record");

    let reopened = load_entry(&history, &entry.id, 2_000).expect("reopen");
    assert_eq!(reopened.name, "scan.sarif");
    assert_eq!(
        build_dashboard(&reopened.log).rows,
        build_dashboard(&document.log).rows
    );
}

#[test]
fn unknown_id_is_not_found() {
    let history = memory_history();
    let error = load_entry(&history, "missing", 0).expect_err("unknown id");
    assert!(error.is_not_found());
}

#[test]
fn expired_entry_is_not_found() {
    let history = memory_history();
    let entry = record_document(&history, &fixture_document(), 0).expect("record");

    let error = load_entry(&history, &entry.id, EXPIRY_MS + 1).expect_err("expired");
    assert!(matches!(error, AppError::History(HistoryError::NotFound(id)) if id == entry.id));
}

#[test]
fn tampered_entry_is_rejected_on_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    let history = HistoryStore::open(Arc::new(DirSessionBackend::new(dir.path())));
    let entry = history
        .record("bad.sarif", r#"{"version":"2.0.0","runs":[]}"#, 5)
        .expect("record raw text");

    let error = load_entry(&history, &entry.id, 6).expect_err("gate rejects stored text");
    assert!(matches!(error, AppError::Intake(_)));
    assert!(!error.is_not_found());
}

#[test]
fn directory_history_is_shared_across_stores() {
    let dir = tempfile::tempdir().expect("tempdir");
    let writer = HistoryStore::open(Arc::new(DirSessionBackend::new(dir.path())));
    let entry = record_document(&writer, &fixture_document(), 10).expect("record");

    let reader = HistoryStore::open(Arc::new(DirSessionBackend::new(dir.path())));
    let reopened = load_entry(&reader, &entry.id, 20).expect("reopen from disk");
    assert_eq!(reopened.log.finding_count(), 3);
}
