//! Shared fixtures for app integration tests.

use std::sync::Arc;

use sarif_dash_history::{HistoryStore, MemorySessionBackend};
use sarif_dash_intake::{AdmittedDocument, admit_text};

/// Two-run document: three semgrep findings and an empty gitleaks run.
#[allow(dead_code)]
pub const VALID_LOG: &str = include_str!("../../../../contracts/fixtures/sarif-log.valid.json");

/// Well-formed document declaring SARIF 2.0.0.
#[allow(dead_code)]
pub const WRONG_VERSION_LOG: &str =
    include_str!("../../../../contracts/fixtures/sarif-log.wrong-version.json");

/// Admitted document whose optional fields carry wrong JSON types.
#[allow(dead_code)]
pub const LOOSE_TYPES_LOG: &str =
    include_str!("../../../../contracts/fixtures/sarif-log.loose-types.json");

/// Admits the valid fixture.
#[allow(dead_code)]
pub fn fixture_document() -> AdmittedDocument {
    admit_text("scan.sarif", VALID_LOG.trim().to_string()).expect("fixture should be admitted")
}

/// Creates a history store over a fresh in-memory backend.
#[allow(dead_code)]
pub fn memory_history() -> HistoryStore {
    HistoryStore::open(Arc::new(MemorySessionBackend::new()))
}
