#![warn(missing_docs)]
//! # sarif-dash-aggregate
//!
//! ## Purpose
//! Computes the chart series and summary metrics shown above the findings
//! table.
//!
//! ## Responsibilities
//! - Severity histogram over five fixed categories, zero-filled.
//! - Rule, file, and extension frequency rankings with a top-10 plus
//!   `"Other"` policy ([`rank_with_overflow`]).
//! - Summary metrics: totals, unique files, fixable share, most common rule.
//!
//! ## Data flow
//! [`AnalysisLog`] -> [`chart_series`] / [`summary_metrics`] -> CLI
//! projection or JSON output.
//!
//! ## Ownership and lifetimes
//! All functions borrow the log and return owned buckets.
//!
//! ## Error model
//! Every rollup is total over any decoded log.
//!
//! ## Ordering
//! Buckets are sorted by descending count. Equal counts keep first-seen order
//! (run order, then result order), so output is deterministic per document.
//! The overflow bucket is always last regardless of its count.

use std::collections::HashMap;

use sarif_dash_core::{AnalysisLog, RawFinding, SeverityLevel};
use sarif_dash_normalize::{RuleIndex, resolve_level};
use serde::{Deserialize, Serialize};

/// Number of ranked buckets kept before folding into the overflow bucket.
pub const TOP_N: usize = 10;
/// Label of the overflow bucket.
pub const OVERFLOW_LABEL: &str = "Other";
/// Rule-chart key for findings without a rule id.
pub const UNKNOWN_RULE: &str = "Unknown";
/// Most-common-rule key for findings without a rule id.
pub const UNKNOWN_RULE_ID: &str = "Unknown.Rule";
/// Extension key for URIs without a usable extension.
pub const NO_EXTENSION: &str = "NoExt";

/// One chart category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateBucket {
    /// Category label.
    pub name: String,
    /// Number of findings in the category.
    pub count: usize,
    /// Display color, set only for severity buckets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl AggregateBucket {
    /// Creates an uncolored bucket.
    pub fn new(name: impl Into<String>, count: usize) -> Self {
        Self {
            name: name.into(),
            count,
            color: None,
        }
    }
}

/// All four chart series for one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartSeries {
    /// Severity breakdown, five buckets in fixed order.
    pub severity: Vec<AggregateBucket>,
    /// Findings by short rule id.
    pub rules: Vec<AggregateBucket>,
    /// Findings by file name.
    pub files: Vec<AggregateBucket>,
    /// Findings by file extension.
    pub extensions: Vec<AggregateBucket>,
}

/// Computes every chart series.
pub fn chart_series(log: &AnalysisLog) -> ChartSeries {
    ChartSeries {
        severity: severity_histogram(log),
        rules: rule_frequency(log),
        files: file_frequency(log),
        extensions: extension_distribution(log),
    }
}

/// Tallies keyed items, sorts by descending count, and folds everything past
/// `limit` into one `overflow_label` bucket appended last.
///
/// Items whose key function returns `None` are excluded entirely.
pub fn rank_with_overflow<T, I, F>(
    items: I,
    mut key_fn: F,
    limit: usize,
    overflow_label: &str,
) -> Vec<AggregateBucket>
where
    I: IntoIterator<Item = T>,
    F: FnMut(T) -> Option<String>,
{
    let mut buckets: Vec<AggregateBucket> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for item in items {
        let Some(key) = key_fn(item) else {
            continue;
        };
        match positions.get(&key) {
            Some(&position) => buckets[position].count += 1,
            None => {
                positions.insert(key.clone(), buckets.len());
                buckets.push(AggregateBucket::new(key, 1));
            }
        }
    }

    // Stable: ties keep first-seen order.
    buckets.sort_by(|left, right| right.count.cmp(&left.count));

    if buckets.len() > limit {
        let remainder = buckets[limit..].iter().map(|bucket| bucket.count).sum();
        buckets.truncate(limit);
        buckets.push(AggregateBucket::new(overflow_label, remainder));
    }

    buckets
}

/// Counts findings per resolved severity. Always five buckets in the order
/// error, warning, note, none, unknown; levels outside the four SARIF values
/// count as unknown.
pub fn severity_histogram(log: &AnalysisLog) -> Vec<AggregateBucket> {
    let mut counts = [0_usize; 5];

    for run in &log.runs {
        let index = RuleIndex::for_run(run);
        for finding in run.results() {
            let rule = index.lookup(finding.rule_id.as_deref());
            let level = SeverityLevel::classify(&resolve_level(finding, rule));
            counts[severity_slot(level)] += 1;
        }
    }

    SeverityLevel::ALL
        .iter()
        .map(|level| AggregateBucket {
            name: level.label().to_string(),
            count: counts[severity_slot(*level)],
            color: Some(level.color().to_string()),
        })
        .collect()
}

fn severity_slot(level: SeverityLevel) -> usize {
    match level {
        SeverityLevel::Error => 0,
        SeverityLevel::Warning => 1,
        SeverityLevel::Note => 2,
        SeverityLevel::None => 3,
        SeverityLevel::Unknown => 4,
    }
}

/// Ranks findings by [`short_rule_id`]; absent ids count as
/// [`UNKNOWN_RULE`].
pub fn rule_frequency(log: &AnalysisLog) -> Vec<AggregateBucket> {
    rank_with_overflow(
        log.findings(),
        |finding: &RawFinding| {
            Some(match finding.rule_id.as_deref() {
                Some(rule_id) if !rule_id.is_empty() => short_rule_id(rule_id).to_string(),
                _ => UNKNOWN_RULE.to_string(),
            })
        },
        TOP_N,
        OVERFLOW_LABEL,
    )
}

/// Ranks findings by [`file_name_after_slash`] of the first-location URI.
/// Findings without a URI are not counted.
pub fn file_frequency(log: &AnalysisLog) -> Vec<AggregateBucket> {
    rank_with_overflow(
        log.findings(),
        |finding: &RawFinding| {
            finding
                .artifact_uri()
                .map(|uri| file_name_after_slash(uri).to_string())
        },
        TOP_N,
        OVERFLOW_LABEL,
    )
}

/// Ranks findings by [`extension_of`] the first-location URI. Findings
/// without a URI are not counted.
pub fn extension_distribution(log: &AnalysisLog) -> Vec<AggregateBucket> {
    rank_with_overflow(
        log.findings(),
        |finding: &RawFinding| finding.artifact_uri().map(extension_of),
        TOP_N,
        OVERFLOW_LABEL,
    )
}

/// Segment after the last `.`, or the whole id when it has no dot.
pub fn short_rule_id(rule_id: &str) -> &str {
    rule_id
        .rsplit_once('.')
        .map_or(rule_id, |(_, tail)| tail)
}

/// Segment after the last `/`, or the whole URI when it has no slash.
pub fn file_name_after_slash(uri: &str) -> &str {
    uri.rsplit_once('/').map_or(uri, |(_, tail)| tail)
}

/// Lowercased substring from the last `.` of the URI onward. A URI without a
/// dot, or ending in one, maps to [`NO_EXTENSION`].
pub fn extension_of(uri: &str) -> String {
    match uri.rfind('.') {
        Some(position) if position + 1 < uri.len() => uri[position..].to_lowercase(),
        _ => NO_EXTENSION.to_string(),
    }
}

/// Headline numbers shown as dashboard cards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryMetrics {
    /// Flattened finding count.
    pub total_findings: usize,
    /// Distinct first-location URIs.
    pub unique_files: usize,
    /// Findings whose `fixAvailable` property is truthy.
    pub fixable_findings: usize,
    /// Rounded share of fixable findings, 0 for empty documents.
    pub fixable_percent: u32,
    /// Findings per unique file, 0 when no file is referenced.
    pub avg_findings_per_file: f64,
    /// Most frequent full rule id.
    pub most_common_rule: MostCommonRule,
}

impl SummaryMetrics {
    /// Returns `true` when at least one finding is fixable.
    pub fn has_fixable(&self) -> bool {
        self.fixable_findings > 0
    }

    /// Average per file with one decimal.
    pub fn avg_findings_per_file_display(&self) -> String {
        format!("{:.1}", self.avg_findings_per_file)
    }
}

/// Most frequent rule id and its count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MostCommonRule {
    /// Full rule id, [`UNKNOWN_RULE_ID`] for findings without one, `"N/A"`
    /// for empty documents.
    pub rule_id: String,
    /// Occurrences.
    pub count: usize,
}

impl MostCommonRule {
    /// Last dot segment for card display, falling back to the full id when
    /// that segment is empty.
    pub fn display_label(&self) -> &str {
        match self.rule_id.rsplit('.').next() {
            Some(segment) if !segment.is_empty() => segment,
            _ => &self.rule_id,
        }
    }
}

/// Computes the dashboard card metrics.
pub fn summary_metrics(log: &AnalysisLog) -> SummaryMetrics {
    let total_findings = log.finding_count();

    let mut files: Vec<&str> = log.findings().filter_map(RawFinding::artifact_uri).collect();
    files.sort_unstable();
    files.dedup();
    let unique_files = files.len();

    let fixable_findings = log.findings().filter(|finding| finding.fix_available()).count();
    let fixable_percent = if total_findings == 0 {
        0
    } else {
        ((fixable_findings as f64 / total_findings as f64) * 100.0).round() as u32
    };

    let avg_findings_per_file = if unique_files == 0 {
        0.0
    } else {
        total_findings as f64 / unique_files as f64
    };

    SummaryMetrics {
        total_findings,
        unique_files,
        fixable_findings,
        fixable_percent,
        avg_findings_per_file,
        most_common_rule: most_common_rule(log),
    }
}

fn most_common_rule(log: &AnalysisLog) -> MostCommonRule {
    if log.finding_count() == 0 {
        return MostCommonRule {
            rule_id: "N/A".to_string(),
            count: 0,
        };
    }

    let tally = rank_with_overflow(
        log.findings(),
        |finding: &RawFinding| {
            Some(
                finding
                    .rule_id
                    .as_deref()
                    .filter(|id| !id.is_empty())
                    .unwrap_or(UNKNOWN_RULE_ID)
                    .to_string(),
            )
        },
        usize::MAX,
        OVERFLOW_LABEL,
    );

    // Sorted descending with stable ties, so the head is the first key to
    // reach the maximum count.
    tally
        .into_iter()
        .next()
        .map(|bucket| MostCommonRule {
            rule_id: bucket.name,
            count: bucket.count,
        })
        .unwrap_or(MostCommonRule {
            rule_id: "N/A".to_string(),
            count: 0,
        })
}
