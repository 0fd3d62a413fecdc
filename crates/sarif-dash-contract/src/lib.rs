#![warn(missing_docs)]
//! # sarif-dash-contract
//!
//! ## Purpose
//! Admission gate and parse boundary for SARIF text supplied by upload or
//! paste.
//!
//! ## Responsibilities
//! - Check that text is JSON matching the frozen minimal shape
//!   (`contracts/sarif-minimal.schema.json`).
//! - Decode admitted text into [`AnalysisLog`].
//! - Report rejections as human-readable errors and log a diagnostic.
//!
//! ## Data flow
//! Raw text -> [`check_shape`] -> [`parse_analysis_log`] -> normalizer and
//! aggregation crates.
//!
//! ## Ownership and lifetimes
//! The compiled schema is built once per process and shared read-only.
//! Decoded logs are owned values, independent of the input buffer.
//!
//! ## Error model
//! Every failure is a [`ContractError`]. [`validate_shape`] folds them into a
//! boolean and never panics.

use std::sync::OnceLock;

use jsonschema::JSONSchema;
use sarif_dash_core::AnalysisLog;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

/// Frozen minimal SARIF shape accepted by the gate.
pub const MINIMAL_SCHEMA: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../../contracts/sarif-minimal.schema.json"
));

static VALIDATOR: OnceLock<Result<JSONSchema, String>> = OnceLock::new();

/// Returns `true` when `text` is admitted.
///
/// Fails closed on JSON syntax errors, a `version` other than `"2.1.0"`, a
/// missing `runs` array, or any run without a non-empty `tool.driver.name`.
/// Rejections are logged at `warn` level.
pub fn validate_shape(text: &str) -> bool {
    match check_shape(text) {
        Ok(_) => true,
        Err(error) => {
            warn!(error = %error, "SARIF validation failed");
            false
        }
    }
}

/// Checks the minimal shape and returns the parsed JSON value.
///
/// # Errors
/// Returns [`ContractError::Syntax`] for invalid JSON and
/// [`ContractError::Shape`] listing every schema violation.
pub fn check_shape(text: &str) -> Result<Value, ContractError> {
    let value: Value = serde_json::from_str(text).map_err(ContractError::Syntax)?;
    let validator = compiled_validator()?;

    if let Err(errors) = validator.validate(&value) {
        let violations: Vec<String> = errors
            .map(|error| format!("{}: {}", error.instance_path, error))
            .collect();
        return Err(ContractError::Shape(violations.join("; ")));
    }

    Ok(value)
}

/// Admits and decodes SARIF text.
///
/// Optional fields with the wrong JSON type decode as absent, so any text the
/// gate admits decodes.
///
/// # Errors
/// Returns the gate's rejection. [`ContractError::Decode`] is kept for a gate
/// and model that drift apart.
pub fn parse_analysis_log(text: &str) -> Result<AnalysisLog, ContractError> {
    let value = check_shape(text)?;
    serde_json::from_value(value).map_err(ContractError::Decode)
}

fn compiled_validator() -> Result<&'static JSONSchema, ContractError> {
    VALIDATOR
        .get_or_init(|| {
            let schema: Value =
                serde_json::from_str(MINIMAL_SCHEMA).map_err(|error| error.to_string())?;
            JSONSchema::compile(&schema).map_err(|error| error.to_string())
        })
        .as_ref()
        .map_err(|reason| ContractError::Schema(reason.clone()))
}

/// Admission and decode errors.
#[derive(Debug, Error)]
pub enum ContractError {
    /// Text is not JSON.
    #[error("invalid SARIF JSON: {0}")]
    Syntax(serde_json::Error),
    /// JSON does not match the minimal SARIF shape.
    #[error("invalid SARIF format: {0}")]
    Shape(String),
    /// Admitted JSON could not be decoded into the document model.
    #[error("failed to parse SARIF content: {0}")]
    Decode(serde_json::Error),
    /// Embedded schema failed to compile.
    #[error("minimal SARIF schema is unusable: {0}")]
    Schema(String),
}
