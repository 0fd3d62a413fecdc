#![warn(missing_docs)]
//! # sarif-dash-history
//!
//! ## Purpose
//! Keeps a session-scoped list of previously viewed SARIF documents so they
//! can be reopened by id.
//!
//! ## Responsibilities
//! - Persist `{ id, name, content, timestamp }` entries under one key.
//! - Prune entries older than 24 hours whenever the list is read.
//! - Derive opaque, time-based ids that stay unique within the list.
//!
//! ## Data flow
//! Intake admits text -> [`HistoryStore::record`] -> backend key
//! [`HISTORY_KEY`] -> [`HistoryStore::find`] re-reads content for the
//! dashboard.
//!
//! ## Ownership and lifetimes
//! The store owns an `Arc<dyn SessionBackend>` so callers can share one
//! backend between the store and their own inspection code. Entries are
//! owned values copied out of the backend on every read.
//!
//! ## Error model
//! Missing or expired ids surface as [`HistoryError::NotFound`]. A list that
//! no longer parses is [`HistoryError::Corrupt`]; backend I/O failures are
//! reported as-is.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use sarif_dash_history::{HistoryStore, MemorySessionBackend};
//!
//! let store = HistoryStore::open(Arc::new(MemorySessionBackend::new()));
//! let entry = store.record("scan.sarif", "{}", 1_000).expect("record");
//! assert_eq!(store.find(&entry.id, 2_000).expect("find").name, "scan.sarif");
//! ```

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::debug;

/// Backend key holding the serialized entry list.
pub const HISTORY_KEY: &str = "sarifHistory";

/// Entry lifetime in milliseconds (24 hours).
pub const EXPIRY_MS: u64 = 24 * 60 * 60 * 1000;

/// One stored document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Opaque id used to reopen the entry.
    pub id: String,
    /// Display name, usually the source file name.
    pub name: String,
    /// Full document text.
    pub content: String,
    /// Unix milliseconds when recorded.
    pub timestamp: u64,
}

impl HistoryEntry {
    /// Returns `true` once the entry is older than [`EXPIRY_MS`] at `now_ms`.
    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.timestamp) > EXPIRY_MS
    }
}

/// Key-value text storage scoped to one session.
pub trait SessionBackend: Send + Sync {
    /// Reads a value, `None` when the key is unset.
    fn load(&self, key: &str) -> Result<Option<String>, HistoryError>;
    /// Writes a value, replacing any previous one.
    fn store(&self, key: &str, value: &str) -> Result<(), HistoryError>;
    /// Removes a key. Removing an unset key succeeds.
    fn remove(&self, key: &str) -> Result<(), HistoryError>;
}

/// Process-local backend; contents vanish with the process.
#[derive(Debug, Default)]
pub struct MemorySessionBackend {
    values: Mutex<HashMap<String, String>>,
}

impl MemorySessionBackend {
    /// Creates an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    fn values(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, HistoryError> {
        self.values
            .lock()
            .map_err(|_| HistoryError::Backend("session lock poisoned".to_string()))
    }
}

impl SessionBackend for MemorySessionBackend {
    fn load(&self, key: &str) -> Result<Option<String>, HistoryError> {
        Ok(self.values()?.get(key).cloned())
    }

    fn store(&self, key: &str, value: &str) -> Result<(), HistoryError> {
        self.values()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), HistoryError> {
        self.values()?.remove(key);
        Ok(())
    }
}

/// Backend storing each key as `<root>/<key>.json`.
#[derive(Debug, Clone)]
pub struct DirSessionBackend {
    root: PathBuf,
}

impl DirSessionBackend {
    /// Creates a backend rooted at `root`. The directory is created on first
    /// write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Backend directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }
}

impl SessionBackend for DirSessionBackend {
    fn load(&self, key: &str) -> Result<Option<String>, HistoryError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(error.into()),
        }
    }

    fn store(&self, key: &str, value: &str) -> Result<(), HistoryError> {
        fs::create_dir_all(&self.root)?;
        fs::write(self.path_for(key), value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), HistoryError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(error.into()),
        }
    }
}

/// Session history over an injected backend.
#[derive(Clone)]
pub struct HistoryStore {
    backend: Arc<dyn SessionBackend>,
}

impl HistoryStore {
    /// Opens the history kept by `backend`.
    pub fn open(backend: Arc<dyn SessionBackend>) -> Self {
        Self { backend }
    }

    /// Returns live entries in insertion order, pruning expired ones.
    ///
    /// # Errors
    /// Returns [`HistoryError::Corrupt`] when the stored list does not parse,
    /// or the backend's error.
    pub fn entries(&self, now_ms: u64) -> Result<Vec<HistoryEntry>, HistoryError> {
        let Some(raw) = self.backend.load(HISTORY_KEY)? else {
            return Ok(Vec::new());
        };
        let stored: Vec<HistoryEntry> = serde_json::from_str(&raw)?;

        let before = stored.len();
        let live: Vec<HistoryEntry> = stored
            .into_iter()
            .filter(|entry| !entry.is_expired(now_ms))
            .collect();

        if live.len() != before {
            debug!(pruned = before - live.len(), "pruned expired history entries");
            self.save(&live)?;
        }

        Ok(live)
    }

    /// Appends a document and returns its entry.
    ///
    /// # Errors
    /// Propagates read and write failures of the backing list.
    pub fn record(
        &self,
        name: impl Into<String>,
        content: impl Into<String>,
        now_ms: u64,
    ) -> Result<HistoryEntry, HistoryError> {
        let mut entries = self.entries(now_ms)?;
        let content = content.into();

        let entry = HistoryEntry {
            id: unique_entry_id(now_ms, &content, &entries),
            name: name.into(),
            content,
            timestamp: now_ms,
        };
        entries.push(entry.clone());
        self.save(&entries)?;

        debug!(id = %entry.id, name = %entry.name, "recorded history entry");
        Ok(entry)
    }

    /// Looks up one live entry.
    ///
    /// # Errors
    /// Returns [`HistoryError::NotFound`] when the id is unknown or expired.
    pub fn find(&self, id: &str, now_ms: u64) -> Result<HistoryEntry, HistoryError> {
        self.entries(now_ms)?
            .into_iter()
            .find(|entry| entry.id == id)
            .ok_or_else(|| HistoryError::NotFound(id.to_string()))
    }

    /// Removes one entry.
    ///
    /// # Errors
    /// Returns [`HistoryError::NotFound`] when the id is unknown or expired.
    pub fn delete(&self, id: &str, now_ms: u64) -> Result<(), HistoryError> {
        let mut entries = self.entries(now_ms)?;
        let before = entries.len();
        entries.retain(|entry| entry.id != id);
        if entries.len() == before {
            return Err(HistoryError::NotFound(id.to_string()));
        }
        self.save(&entries)
    }

    /// Ends the session and discards all entries.
    ///
    /// # Errors
    /// Propagates backend removal failures.
    pub fn close(self) -> Result<(), HistoryError> {
        self.backend.remove(HISTORY_KEY)
    }

    fn save(&self, entries: &[HistoryEntry]) -> Result<(), HistoryError> {
        let encoded = serde_json::to_string(entries)?;
        self.backend.store(HISTORY_KEY, &encoded)
    }
}

/// Builds `"<millis>-<8 hex of sha256(content)>"`, advancing the millis part
/// until no existing entry uses the id.
pub fn unique_entry_id(now_ms: u64, content: &str, existing: &[HistoryEntry]) -> String {
    let digest = hex::encode(Sha256::digest(content.as_bytes()));
    let fingerprint = &digest[..8];

    let mut millis = now_ms;
    loop {
        let candidate = format!("{millis}-{fingerprint}");
        if existing.iter().all(|entry| entry.id != candidate) {
            return candidate;
        }
        millis = millis.wrapping_add(1);
    }
}

/// History store errors.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// Id is unknown or its entry expired.
    #[error("history entry not found: {0}")]
    NotFound(String),
    /// Stored list is not valid JSON for the entry shape.
    #[error("history list is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
    /// Backend I/O failed.
    #[error("history storage failure: {0}")]
    Io(#[from] io::Error),
    /// Backend failed for a non-I/O reason.
    #[error("history backend failure: {0}")]
    Backend(String),
}
