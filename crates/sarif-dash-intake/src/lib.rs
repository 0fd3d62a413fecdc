#![warn(missing_docs)]
//! # sarif-dash-intake
//!
//! ## Purpose
//! Turns uploaded blobs and pasted text into admitted SARIF documents.
//!
//! ## Responsibilities
//! - Abstract blob reading behind [`BlobSource`] (files, in-memory buffers).
//! - Decode bytes as UTF-8 text with surrounding whitespace trimmed.
//! - Run every input through the shape gate before it reaches the dashboard.
//! - Discard reads that were overtaken by a newer read (cancel-and-replace).
//!
//! ## Data flow
//! [`BlobSource`] -> [`IntakeController::finish_read`] -> [`decode_text`] ->
//! shape gate -> [`AdmittedDocument`] handed to the app.
//!
//! ## Ownership and lifetimes
//! Admitted documents own their text and share the parsed log through an
//! `Arc` so downstream caches can key on document identity.
//!
//! ## Error model
//! Read and decode failures are [`IntakeError::Read`]; they are transient and
//! leave any previously admitted document untouched. Gate rejections are
//! [`IntakeError::Invalid`]. A stale read is not an error; it completes as
//! [`IntakeOutcome::Superseded`].

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use sarif_dash_contract::{ContractError, parse_analysis_log};
use sarif_dash_core::AnalysisLog;
use thiserror::Error;
use tracing::{debug, warn};

/// Message shown when paste intake receives only whitespace.
pub const EMPTY_PASTE_MESSAGE: &str = "SARIF content is required.";

/// Default display name for pasted documents.
pub const PASTED_NAME: &str = "Pasted SARIF";

/// File-like input.
pub trait BlobSource: Send + Sync {
    /// Display name recorded with the document.
    fn name(&self) -> &str;

    /// Reads the full blob.
    ///
    /// # Errors
    /// Returns [`IntakeError::Read`] when the bytes cannot be obtained.
    fn read_bytes(&self) -> Result<Vec<u8>, IntakeError>;
}

/// Blob read from the local filesystem.
#[derive(Debug, Clone)]
pub struct FileBlob {
    path: PathBuf,
    name: String,
}

impl FileBlob {
    /// Creates a blob named after the path's final component.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self { path, name }
    }

    /// Source path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BlobSource for FileBlob {
    fn name(&self) -> &str {
        &self.name
    }

    fn read_bytes(&self) -> Result<Vec<u8>, IntakeError> {
        fs::read(&self.path).map_err(|error| IntakeError::Read {
            name: self.name.clone(),
            reason: error.to_string(),
        })
    }
}

/// Blob held in memory (stdin, tests).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryBlob {
    name: String,
    bytes: Vec<u8>,
}

impl MemoryBlob {
    /// Creates an in-memory blob.
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

impl BlobSource for MemoryBlob {
    fn name(&self) -> &str {
        &self.name
    }

    fn read_bytes(&self) -> Result<Vec<u8>, IntakeError> {
        Ok(self.bytes.clone())
    }
}

/// Decodes UTF-8 and trims surrounding whitespace.
///
/// # Errors
/// Returns [`IntakeError::Read`] for invalid UTF-8.
pub fn decode_text(name: &str, bytes: &[u8]) -> Result<String, IntakeError> {
    let text = std::str::from_utf8(bytes).map_err(|error| IntakeError::Read {
        name: name.to_string(),
        reason: format!("not UTF-8 text: {error}"),
    })?;
    Ok(text.trim().to_string())
}

/// A document that passed the shape gate.
#[derive(Debug, Clone)]
pub struct AdmittedDocument {
    /// Display name.
    pub name: String,
    /// Decoded, trimmed text.
    pub text: String,
    /// Parsed log shared with derived-data caches.
    pub log: Arc<AnalysisLog>,
}

/// Admits text through the shape gate.
///
/// # Errors
/// Returns [`IntakeError::Invalid`] when the gate rejects the text.
pub fn admit_text(name: impl Into<String>, text: String) -> Result<AdmittedDocument, IntakeError> {
    let name = name.into();
    let log = parse_analysis_log(&text).inspect_err(|error| {
        warn!(name = %name, error = %error, "SARIF document rejected");
    })?;
    Ok(AdmittedDocument {
        name,
        text,
        log: Arc::new(log),
    })
}

/// Admits pasted text.
///
/// # Errors
/// Returns [`IntakeError::EmptyPaste`] for blank input, otherwise the gate's
/// rejection.
pub fn admit_pasted(text: &str) -> Result<AdmittedDocument, IntakeError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(IntakeError::EmptyPaste);
    }
    admit_text(PASTED_NAME, trimmed.to_string())
}

/// Handle for one read started by [`IntakeController::begin_read`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ReadTicket(u64);

impl ReadTicket {
    /// Monotonic sequence number.
    pub fn sequence(self) -> u64 {
        self.0
    }
}

/// Completion of a read.
#[derive(Debug, Clone)]
pub enum IntakeOutcome {
    /// The read was current and the document passed the gate.
    Admitted(AdmittedDocument),
    /// A newer read started first; the result was discarded.
    Superseded,
}

/// Serializes blob reads so only the most recent one is delivered.
#[derive(Debug, Default)]
pub struct IntakeController {
    latest: AtomicU64,
}

impl IntakeController {
    /// Creates a controller with no reads in flight.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a read, superseding any read still in flight.
    pub fn begin_read(&self) -> ReadTicket {
        ReadTicket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Returns `true` when no newer read has started since `ticket`.
    pub fn is_current(&self, ticket: ReadTicket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }

    /// Reads, decodes, and admits `source` for `ticket`.
    ///
    /// Staleness is checked after the read completes, so a read overtaken
    /// mid-flight is discarded even when it succeeded.
    ///
    /// # Errors
    /// Returns read, decode, or gate failures for a current ticket. Failures
    /// of stale tickets are swallowed as [`IntakeOutcome::Superseded`].
    pub fn finish_read(
        &self,
        ticket: ReadTicket,
        source: &dyn BlobSource,
    ) -> Result<IntakeOutcome, IntakeError> {
        let result = source
            .read_bytes()
            .and_then(|bytes| decode_text(source.name(), &bytes))
            .and_then(|text| admit_text(source.name(), text));

        if !self.is_current(ticket) {
            debug!(
                ticket = ticket.sequence(),
                name = source.name(),
                "discarding superseded read"
            );
            return Ok(IntakeOutcome::Superseded);
        }

        result.map(IntakeOutcome::Admitted)
    }

    /// Begins and finishes a read in one step.
    ///
    /// # Errors
    /// See [`IntakeController::finish_read`].
    pub fn read(&self, source: &dyn BlobSource) -> Result<IntakeOutcome, IntakeError> {
        let ticket = self.begin_read();
        self.finish_read(ticket, source)
    }
}

/// Intake errors.
#[derive(Debug, Error)]
pub enum IntakeError {
    /// Blob could not be read or decoded.
    #[error("failed to read {name}: {reason}")]
    Read {
        /// Blob display name.
        name: String,
        /// Failure detail.
        reason: String,
    },
    /// Paste intake received blank text.
    #[error("SARIF content is required.")]
    EmptyPaste,
    /// Shape gate rejected the text.
    #[error(transparent)]
    Invalid(#[from] ContractError),
}
