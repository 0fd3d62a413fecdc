#![warn(missing_docs)]
//! # sarif-dash-normalize
//!
//! ## Purpose
//! Flattens every finding of a SARIF log into uniform [`NormalizedRow`]s for
//! tabular display, filtering, and sorting.
//!
//! ## Responsibilities
//! - Build a per-run rule lookup keyed by rule id.
//! - Resolve severity, tags, help URI, help text, descriptions, and message
//!   text through "result, else rule, else literal" fallback chains.
//! - Derive display fields (file name, line) from the first location.
//!
//! ## Data flow
//! [`AnalysisLog`] -> [`normalize`] -> rows consumed by the table adapter and
//! the CLI projection.
//!
//! ## Ownership and lifetimes
//! Rule lookups borrow the log for the duration of one run. Emitted rows own
//! a clone of their source finding, so they outlive the document.
//!
//! ## Error model
//! Normalization is total: every combination of present and absent optional
//! fields yields a row, never an error.
//!
//! ## Invariants
//! - One row per finding; row count equals [`AnalysisLog::finding_count`].
//! - Rule ids resolve only against the rule table of their own run.

use std::collections::HashMap;

use sarif_dash_core::{
    AnalysisLog, RawFinding, RuleDescriptor, Run, SeverityLevel, plain_text,
};
use serde::{Deserialize, Serialize};
use url::Url;

/// Help URI placeholder when neither result nor rule carries one.
pub const NO_URI: &str = "No URI";
/// Help text placeholder.
pub const NO_HELP: &str = "No Help Available";
/// Short description placeholder.
pub const NO_SHORT_DESCRIPTION: &str = "No description available.";
/// Full description placeholder.
pub const NO_FULL_DESCRIPTION: &str = "No additional details.";
/// File name shown when the first location has no artifact URI.
pub const UNKNOWN_FILE: &str = "Unknown";
/// Display text for absent rule ids and lines.
pub const NOT_AVAILABLE: &str = "N/A";
/// Resolved level when neither result nor rule defines one.
pub const UNKNOWN_LEVEL: &str = "unknown";

/// One finding with resolved display fields.
///
/// The original finding is kept in [`NormalizedRow::raw`]; resolved fields
/// never overwrite it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedRow {
    /// Index of the originating run.
    pub run_index: usize,
    /// Unmodified source finding.
    pub raw: RawFinding,
    /// Title-cased severity (`Error`, `Warning`, ..., or a passthrough such
    /// as `Critical`).
    pub severity: String,
    /// Result tags, else rule tags.
    pub tags: Vec<String>,
    /// Result help URI, else rule help URI, else [`NO_URI`].
    pub help_uri: String,
    /// Help text.
    pub help: String,
    /// Short description.
    pub short_description: String,
    /// Full description.
    pub full_description: String,
    /// Message text (no rule fallback).
    pub message_text: String,
    /// First-location URI, else [`UNKNOWN_FILE`].
    pub file_name: String,
    /// First-location start line.
    pub line: Option<u64>,
}

impl NormalizedRow {
    /// Returns the raw rule id.
    pub fn rule_id(&self) -> Option<&str> {
        self.raw.rule_id.as_deref()
    }

    /// Returns the rule id for display, [`NOT_AVAILABLE`] when absent.
    pub fn rule_id_display(&self) -> &str {
        self.rule_id()
            .filter(|id| !id.is_empty())
            .unwrap_or(NOT_AVAILABLE)
    }

    /// Returns the line for display, [`NOT_AVAILABLE`] when absent.
    pub fn line_display(&self) -> String {
        self.line
            .map(|line| line.to_string())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string())
    }

    /// Returns the fixed category of the resolved severity.
    pub fn severity_level(&self) -> SeverityLevel {
        SeverityLevel::classify(&self.severity)
    }

    /// Returns a documentation link when the help URI is an absolute URL.
    pub fn help_link(&self) -> Option<Url> {
        if self.help_uri == NO_URI {
            return None;
        }
        Url::parse(&self.help_uri).ok()
    }
}

/// Per-run lookup from rule id to descriptor.
#[derive(Debug, Default)]
pub struct RuleIndex<'a> {
    rules: HashMap<&'a str, &'a RuleDescriptor>,
}

impl<'a> RuleIndex<'a> {
    /// Indexes the run's driver rules. A duplicated id keeps its last
    /// definition; rules without an id are skipped.
    pub fn for_run(run: &'a Run) -> Self {
        let rules = run
            .rules()
            .iter()
            .filter_map(|rule| rule.id.as_deref().map(|id| (id, rule)))
            .collect();
        Self { rules }
    }

    /// Resolves a finding's rule by id. Rule indices are not consulted.
    pub fn lookup(&self, rule_id: Option<&str>) -> Option<&'a RuleDescriptor> {
        rule_id.and_then(|id| self.rules.get(id).copied())
    }

    /// Number of indexed rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns `true` when the run defines no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Returns the first non-empty candidate, else `fallback`.
pub fn first_non_empty<'a, I>(candidates: I, fallback: &'a str) -> &'a str
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    candidates
        .into_iter()
        .flatten()
        .find(|candidate| !candidate.is_empty())
        .unwrap_or(fallback)
}

/// Upper-cases the first character and leaves the rest unchanged.
pub fn title_case(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Resolves the lowercase level: result `level`, else the rule's default
/// level, else [`UNKNOWN_LEVEL`].
pub fn resolve_level(finding: &RawFinding, rule: Option<&RuleDescriptor>) -> String {
    first_non_empty(
        [
            finding.level.as_deref(),
            rule.and_then(RuleDescriptor::default_level),
        ],
        UNKNOWN_LEVEL,
    )
    .to_lowercase()
}

/// Resolves tags: result tags when non-empty, else rule tags. Never merged.
pub fn resolve_tags(finding: &RawFinding, rule: Option<&RuleDescriptor>) -> Vec<String> {
    let result_tags = finding.tags();
    if !result_tags.is_empty() {
        return result_tags;
    }
    rule.map(RuleDescriptor::tags).unwrap_or_default()
}

/// Builds one row from a finding and its matched rule.
pub fn normalize_finding(
    run_index: usize,
    finding: &RawFinding,
    rule: Option<&RuleDescriptor>,
) -> NormalizedRow {
    let severity = title_case(&resolve_level(finding, rule));

    let help_uri = first_non_empty(
        [
            finding.help_uri.as_deref(),
            rule.and_then(|rule| rule.help_uri.as_deref()),
        ],
        NO_URI,
    );
    let help = first_non_empty(
        [
            Some(plain_text(finding.help.as_ref())),
            rule.map(|rule| plain_text(rule.help.as_ref())),
        ],
        NO_HELP,
    );
    let short_description = first_non_empty(
        [
            Some(plain_text(finding.short_description.as_ref())),
            rule.map(|rule| plain_text(rule.short_description.as_ref())),
        ],
        NO_SHORT_DESCRIPTION,
    );
    let full_description = first_non_empty(
        [
            Some(plain_text(finding.full_description.as_ref())),
            rule.map(|rule| plain_text(rule.full_description.as_ref())),
        ],
        NO_FULL_DESCRIPTION,
    );

    NormalizedRow {
        run_index,
        raw: finding.clone(),
        severity,
        tags: resolve_tags(finding, rule),
        help_uri: help_uri.to_string(),
        help: help.to_string(),
        short_description: short_description.to_string(),
        full_description: full_description.to_string(),
        message_text: finding.message_text().to_string(),
        file_name: finding.artifact_uri().unwrap_or(UNKNOWN_FILE).to_string(),
        line: finding.start_line(),
    }
}

/// Flattens all findings across runs, run order then result order.
pub fn normalize(log: &AnalysisLog) -> Vec<NormalizedRow> {
    let mut rows = Vec::with_capacity(log.finding_count());

    for (run_index, run) in log.runs.iter().enumerate() {
        let index = RuleIndex::for_run(run);
        for finding in run.results() {
            let rule = index.lookup(finding.rule_id.as_deref());
            rows.push(normalize_finding(run_index, finding, rule));
        }
    }

    rows
}
