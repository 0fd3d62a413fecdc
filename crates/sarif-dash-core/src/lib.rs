#![warn(missing_docs)]
//! # sarif-dash-core
//!
//! ## Purpose
//! Defines the typed SARIF 2.1.0 document model used across the `sarif-dash`
//! workspace.
//!
//! ## Responsibilities
//! - Represent analysis logs, runs, rules, and findings with every optional
//!   field modeled as `Option`.
//! - Coerce string-or-structured message fields into plain text.
//! - Expose first-location attribution and property-bag well-known keys
//!   through safe accessors.
//! - Define the fixed severity categories used by rollups and badges.
//!
//! ## Data flow
//! Raw text is admitted by the contract crate and decoded into
//! [`AnalysisLog`]. Normalization and aggregation read the log through
//! [`AnalysisLog::findings`] and the accessors on [`RawFinding`].
//!
//! ## Ownership and lifetimes
//! The log owns all strings. Downstream crates borrow it immutably; nothing in
//! the pipeline mutates a parsed document.
//!
//! ## Error model
//! This crate has no fallible operations. Absent optional fields resolve to
//! `None`, empty slices, or `false`. Optional fields holding the wrong JSON
//! type decode as absent, so every document that passes the shape gate also
//! decodes.
//!
//! ## Attribution limits
//! Only the first entry of `locations` is used for file and line attribution.
//! Additional locations are carried in the model but never counted.
//!
//! ## Example
//! ```rust
//! use sarif_dash_core::AnalysisLog;
//!
//! let raw = r#"{"version":"2.1.0","runs":[{"tool":{"driver":{"name":"lint"}},
//!     "results":[{"ruleId":"a.b","message":{"text":"hi"},
//!     "locations":[{"physicalLocation":{"artifactLocation":{"uri":"src/x.rs"}}}]}]}]}"#;
//! let log: AnalysisLog = serde_json::from_str(raw).unwrap();
//! let finding = log.findings().next().unwrap();
//! assert_eq!(finding.artifact_uri(), Some("src/x.rs"));
//! assert_eq!(log.finding_count(), 1);
//! ```

use std::collections::BTreeMap;

use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The only SARIF version admitted by the shape gate.
pub const SARIF_VERSION: &str = "2.1.0";

/// Property-bag key carrying a string array of tags.
pub const TAGS_KEY: &str = "tags";

/// Property-bag key flagging that an automated fix exists.
pub const FIX_AVAILABLE_KEY: &str = "fixAvailable";

/// Root SARIF document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisLog {
    /// SARIF format version.
    pub version: String,
    /// Optional JSON schema URI.
    #[serde(
        rename = "$schema",
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub schema: Option<String>,
    /// Runs in analysis order.
    pub runs: Vec<Run>,
}

impl AnalysisLog {
    /// Iterates all findings across runs, run order first, then result order.
    pub fn findings(&self) -> impl Iterator<Item = &RawFinding> {
        self.runs.iter().flat_map(|run| run.results().iter())
    }

    /// Returns the flattened finding count (absent `results` count as zero).
    pub fn finding_count(&self) -> usize {
        self.runs.iter().map(|run| run.results().len()).sum()
    }
}

/// One analysis execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Run {
    /// Tool that produced the results.
    pub tool: Tool,
    /// Findings; `None` is treated as empty.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<RawFinding>>,
    /// Free-form run properties.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub properties: Option<PropertyBag>,
}

impl Run {
    /// Returns the run's findings, empty when absent.
    pub fn results(&self) -> &[RawFinding] {
        self.results.as_deref().unwrap_or(&[])
    }

    /// Returns the driver's rule definitions, empty when absent.
    pub fn rules(&self) -> &[RuleDescriptor] {
        self.tool.driver.rules.as_deref().unwrap_or(&[])
    }
}

/// Tool wrapper around the driver component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    /// Primary tool component.
    pub driver: ToolComponent,
}

/// Tool component (driver) metadata and rule table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolComponent {
    /// Tool name; the shape gate requires it to be non-empty.
    pub name: String,
    /// Tool version, kept as raw JSON since producers disagree on its type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<Value>,
    /// Tool homepage, kept as raw JSON.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub information_uri: Option<Value>,
    /// Rule definitions referenced by `ruleId`.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub rules: Option<Vec<RuleDescriptor>>,
}

/// A class of findings with default severity and documentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleDescriptor {
    /// Rule identifier, unique within its run. Rules without a string id are
    /// kept but can never be matched.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Human-readable rule name.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// One-line description.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub short_description: Option<MessageText>,
    /// Long-form description.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub full_description: Option<MessageText>,
    /// Help text.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub help: Option<MessageText>,
    /// Documentation link.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub help_uri: Option<String>,
    /// Default reporting configuration.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub default_configuration: Option<RuleConfiguration>,
    /// Free-form rule properties (`tags` lives here).
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub properties: Option<PropertyBag>,
}

impl RuleDescriptor {
    /// Returns the default configuration level, if any.
    pub fn default_level(&self) -> Option<&str> {
        self.default_configuration
            .as_ref()
            .and_then(|config| config.level.as_deref())
    }

    /// Returns rule-level tags (empty when absent).
    pub fn tags(&self) -> Vec<String> {
        self.properties
            .as_ref()
            .map(PropertyBag::tags)
            .unwrap_or_default()
    }
}

/// Rule default configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleConfiguration {
    /// Default level (`error`, `warning`, `note`, `none`).
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
}

/// One reported issue as found in a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawFinding {
    /// Referenced rule id.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<String>,
    /// Referenced rule index. Carried only; matching is by id.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub rule_index: Option<i64>,
    /// Explicit result level.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    /// Result message. Missing or malformed messages decode as empty; a bare
    /// string is taken as the text.
    #[serde(default, deserialize_with = "lenient_message")]
    pub message: Message,
    /// Result-level short description override.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub short_description: Option<MessageText>,
    /// Result-level full description override.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub full_description: Option<MessageText>,
    /// Result-level help override.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub help: Option<MessageText>,
    /// Result-level documentation link.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub help_uri: Option<String>,
    /// Locations in reporting order.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub locations: Option<Vec<Location>>,
    /// Free-form result properties.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub properties: Option<PropertyBag>,
}

impl RawFinding {
    /// Returns the first location, the only one used for attribution.
    pub fn primary_location(&self) -> Option<&Location> {
        self.locations.as_ref().and_then(|locations| locations.first())
    }

    /// Returns the first location's artifact URI when present and non-empty.
    pub fn artifact_uri(&self) -> Option<&str> {
        self.primary_location()
            .and_then(|location| location.physical_location.as_ref())
            .and_then(|physical| physical.artifact_location.as_ref())
            .and_then(|artifact| artifact.uri.as_deref())
            .filter(|uri| !uri.is_empty())
    }

    /// Returns the first location's start line when present and non-zero.
    pub fn start_line(&self) -> Option<u64> {
        self.primary_location()
            .and_then(|location| location.physical_location.as_ref())
            .and_then(|physical| physical.region.as_ref())
            .and_then(|region| region.start_line)
            .filter(|line| *line > 0)
    }

    /// Returns the message as plain text.
    pub fn message_text(&self) -> &str {
        self.message.text.as_deref().unwrap_or("")
    }

    /// Returns result-level tags (empty when absent).
    pub fn tags(&self) -> Vec<String> {
        self.properties
            .as_ref()
            .map(PropertyBag::tags)
            .unwrap_or_default()
    }

    /// Returns `true` when `properties.fixAvailable` is truthy.
    pub fn fix_available(&self) -> bool {
        self.properties
            .as_ref()
            .is_some_and(PropertyBag::fix_available)
    }
}

/// SARIF message object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Plain-text message.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Markdown variant, kept as raw JSON.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markdown: Option<Value>,
}

/// A text field that producers emit either as a bare string or as a
/// multiformat message object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageText {
    /// Bare string.
    Plain(String),
    /// Structured message object.
    Structured(MultiformatMessageString),
}

impl MessageText {
    /// Coerces to plain text; structured values without `text` yield `""`.
    pub fn plain_text(&self) -> &str {
        match self {
            Self::Plain(text) => text,
            Self::Structured(message) => message.text.as_deref().unwrap_or(""),
        }
    }
}

/// Coerces an optional text field into plain text, `""` when absent.
pub fn plain_text(text: Option<&MessageText>) -> &str {
    text.map(MessageText::plain_text).unwrap_or("")
}

/// Structured message string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiformatMessageString {
    /// Plain-text form.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Markdown form, kept as raw JSON.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markdown: Option<Value>,
}

/// One reported location.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    /// Physical file location.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub physical_location: Option<PhysicalLocation>,
}

/// File plus region.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhysicalLocation {
    /// Artifact (file) reference.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub artifact_location: Option<ArtifactLocation>,
    /// Region inside the artifact.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub region: Option<Region>,
}

/// Artifact reference.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactLocation {
    /// Artifact URI, usually a repository-relative path.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
}

/// Text region inside an artifact.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    /// One-based start line; non-integer values decode as absent.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub start_line: Option<u64>,
}

/// Free-form SARIF property bag.
///
/// Arbitrary keys are preserved. Well-known keys ([`TAGS_KEY`],
/// [`FIX_AVAILABLE_KEY`]) are read through typed accessors that never assume
/// the producer used the expected JSON type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyBag(BTreeMap<String, Value>);

impl PropertyBag {
    /// Creates an empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces one key.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    /// Returns the raw value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns string tags; non-array values yield none and non-string
    /// elements are skipped.
    pub fn tags(&self) -> Vec<String> {
        match self.get(TAGS_KEY) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Returns the JSON truthiness of `fixAvailable`.
    pub fn fix_available(&self) -> bool {
        self.get(FIX_AVAILABLE_KEY).is_some_and(is_truthy)
    }
}

/// Decodes an optional field, mapping a value of the wrong JSON type to `None`.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

fn lenient_message<'de, D>(deserializer: D) -> Result<Message, D::Error>
where
    D: Deserializer<'de>,
{
    let message = match Value::deserialize(deserializer)? {
        Value::String(text) => Message {
            text: Some(text),
            markdown: None,
        },
        value => serde_json::from_value(value).unwrap_or_default(),
    };
    Ok(message)
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Fixed severity categories used by the severity histogram and badges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SeverityLevel {
    /// `error`.
    Error,
    /// `warning`.
    Warning,
    /// `note`.
    Note,
    /// `none`.
    None,
    /// Absent or unrecognized level.
    Unknown,
}

impl SeverityLevel {
    /// Histogram order.
    pub const ALL: [SeverityLevel; 5] = [
        SeverityLevel::Error,
        SeverityLevel::Warning,
        SeverityLevel::Note,
        SeverityLevel::None,
        SeverityLevel::Unknown,
    ];

    /// Classifies a resolved severity, case-insensitively. Anything outside
    /// the four SARIF levels folds into [`SeverityLevel::Unknown`].
    pub fn classify(resolved: &str) -> Self {
        match resolved.to_lowercase().as_str() {
            "error" => Self::Error,
            "warning" => Self::Warning,
            "note" => Self::Note,
            "none" => Self::None,
            _ => Self::Unknown,
        }
    }

    /// Lowercase SARIF key.
    pub fn key(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Note => "note",
            Self::None => "none",
            Self::Unknown => "unknown",
        }
    }

    /// Title-cased display label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Error => "Error",
            Self::Warning => "Warning",
            Self::Note => "Note",
            Self::None => "None",
            Self::Unknown => "Unknown",
        }
    }

    /// Chart color.
    pub fn color(self) -> &'static str {
        match self {
            Self::Error => "#ef4444",
            Self::Warning => "#facc15",
            Self::Note => "#3b82f6",
            Self::None => "#10b981",
            Self::Unknown => "#9ca3af",
        }
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for accessors and property-bag lookups.

    use serde_json::json;

    use super::*;

    fn finding(value: Value) -> RawFinding {
        serde_json::from_value(value).expect("finding should decode")
    }

    #[test]
    fn message_text_accepts_string_or_object() {
        let plain: MessageText = serde_json::from_value(json!("plain")).unwrap();
        let structured: MessageText = serde_json::from_value(json!({"text": "rich"})).unwrap();
        let empty: MessageText = serde_json::from_value(json!({"markdown": "*x*"})).unwrap();

        assert_eq!(plain.plain_text(), "plain");
        assert_eq!(structured.plain_text(), "rich");
        assert_eq!(empty.plain_text(), "");
        assert_eq!(plain_text(None), "");
    }

    #[test]
    fn only_first_location_is_used() {
        let finding = finding(json!({
            "message": {"text": "m"},
            "locations": [
                {"physicalLocation": {"artifactLocation": {"uri": "a.rs"}, "region": {"startLine": 4}}},
                {"physicalLocation": {"artifactLocation": {"uri": "b.rs"}, "region": {"startLine": 9}}}
            ]
        }));

        assert_eq!(finding.artifact_uri(), Some("a.rs"));
        assert_eq!(finding.start_line(), Some(4));
    }

    #[test]
    fn missing_location_parts_resolve_to_none() {
        let finding = finding(json!({
            "message": {"text": "m"},
            "locations": [{"physicalLocation": {"artifactLocation": {"uri": ""}}}]
        }));
        assert_eq!(finding.artifact_uri(), None);
        assert_eq!(finding.start_line(), None);

        let bare = RawFinding::default();
        assert_eq!(bare.artifact_uri(), None);
        assert_eq!(bare.message_text(), "");
    }

    #[test]
    fn property_bag_lookups_tolerate_wrong_types() {
        let mut bag = PropertyBag::new();
        bag.insert(TAGS_KEY, json!(["security", 7, "cwe-79"]));
        bag.insert(FIX_AVAILABLE_KEY, json!("yes"));
        assert_eq!(bag.tags(), vec!["security".to_string(), "cwe-79".to_string()]);
        assert!(bag.fix_available());

        bag.insert(TAGS_KEY, json!("not-an-array"));
        bag.insert(FIX_AVAILABLE_KEY, json!(0));
        assert!(bag.tags().is_empty());
        assert!(!bag.fix_available());
        assert_eq!(bag.get(FIX_AVAILABLE_KEY), Some(&json!(0)));
        assert_eq!(bag.get("absent"), None);
    }

    #[test]
    fn wrong_typed_fields_decode_as_absent() {
        let finding = finding(json!({
            "ruleId": 17,
            "ruleIndex": "zero",
            "level": ["error"],
            "message": "plain string message",
            "shortDescription": 3,
            "helpUri": false,
            "locations": [{"physicalLocation": {
                "artifactLocation": {"uri": 9},
                "region": {"startLine": "12", "startColumn": "x", "endLine": -1}
            }}],
            "properties": "not-a-bag"
        }));

        assert_eq!(finding.rule_id, None);
        assert_eq!(finding.rule_index, None);
        assert_eq!(finding.level, None);
        assert_eq!(finding.message_text(), "plain string message");
        assert_eq!(finding.short_description, None);
        assert_eq!(finding.help_uri, None);
        assert_eq!(finding.artifact_uri(), None);
        assert_eq!(finding.start_line(), None);
        assert!(finding.properties.is_none());
    }

    #[test]
    fn unread_driver_fields_accept_any_type() {
        let log: AnalysisLog = serde_json::from_value(json!({
            "version": "2.1.0",
            "$schema": 5,
            "runs": [{
                "tool": {"driver": {
                    "name": "t",
                    "version": 1,
                    "informationUri": {"href": "x"},
                    "rules": [{"shortDescription": "no id"}, {"id": "r", "name": 3}]
                }},
                "results": [{"message": {"text": 4, "markdown": 5}}]
            }]
        }))
        .expect("log should decode");

        assert_eq!(log.schema, None);
        assert_eq!(log.runs[0].tool.driver.version, Some(json!(1)));
        let rules = log.runs[0].rules();
        assert_eq!(rules[0].id, None);
        assert_eq!(rules[1].id.as_deref(), Some("r"));
        assert_eq!(rules[1].name, None);
        assert_eq!(log.findings().next().map(RawFinding::message_text), Some(""));
    }

    #[test]
    fn absent_results_count_as_zero() {
        let log: AnalysisLog = serde_json::from_value(json!({
            "version": "2.1.0",
            "runs": [
                {"tool": {"driver": {"name": "a"}}},
                {"tool": {"driver": {"name": "b"}}, "results": [{"message": {"text": "x"}}]}
            ]
        }))
        .unwrap();

        assert_eq!(log.finding_count(), 1);
        assert_eq!(log.findings().count(), 1);
        assert!(log.runs[0].rules().is_empty());
    }

    #[test]
    fn severity_classification_folds_unknown_levels() {
        assert_eq!(SeverityLevel::classify("Warning"), SeverityLevel::Warning);
        assert_eq!(SeverityLevel::classify("critical"), SeverityLevel::Unknown);
        assert_eq!(SeverityLevel::ALL.len(), 5);
        assert_eq!(SeverityLevel::Note.label(), "Note");
    }
}
