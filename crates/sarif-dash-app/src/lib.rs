#![warn(missing_docs)]
//! # sarif-dash-app
//!
//! ## Purpose
//! Wires intake, normalization, aggregation, table state, and history into
//! the `sarif-dash` command-line dashboard.
//!
//! ## Responsibilities
//! - Load runtime configuration from the environment.
//! - Derive the dashboard (metrics, charts, rows) from an admitted document,
//!   memoized by document identity.
//! - Keep the last good document when a newer read fails.
//! - Record documents in session history and reopen them by id.
//! - Render dashboards and table pages as plain text.
//!
//! ## Data flow
//! Blob or history entry -> intake gate -> [`DashboardSession`] ->
//! [`DashboardCache`] -> [`Dashboard`] -> table state -> rendered text.
//!
//! ## Ownership and lifetimes
//! Documents and dashboards are shared through `Arc`; derived data is never
//! mutated after construction, so sharing needs no locking.
//!
//! ## Error model
//! Subsystem failures are wrapped in [`AppError`]. Missing history entries
//! keep their own variant so the CLI can point users back to intake.

use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use sarif_dash_aggregate::{ChartSeries, SummaryMetrics, chart_series, summary_metrics};
use sarif_dash_core::{AnalysisLog, SeverityLevel};
use sarif_dash_history::{HistoryEntry, HistoryError, HistoryStore};
use sarif_dash_intake::{
    AdmittedDocument, BlobSource, IntakeController, IntakeError, IntakeOutcome, admit_text,
};
use sarif_dash_normalize::{NormalizedRow, normalize};
use sarif_dash_table::{
    Column, DEFAULT_PAGE_SIZE, SortDirection, SortKey, TableError, TablePage, TableState,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

/// Build-time application version loaded from root `VERSION` file.
pub const APP_VERSION: &str = env!("SARIF_DASH_VERSION");

/// Env var naming the history directory.
pub const HISTORY_DIR_ENV: &str = "SARIF_DASH_HISTORY_DIR";
/// Env var overriding the table page size.
pub const PAGE_SIZE_ENV: &str = "SARIF_DASH_PAGE_SIZE";
/// Env var holding the tracing filter.
pub const LOG_ENV: &str = "SARIF_DASH_LOG";

const MAX_CELL_CHARS: usize = 48;
const BAR_WIDTH: usize = 30;

/// Returns the app version sourced from root `VERSION`.
pub fn app_version() -> &'static str {
    APP_VERSION
}

/// Current Unix time in milliseconds.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_millis() as u64)
}

/// Runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Directory backing session history.
    pub history_dir: PathBuf,
    /// Default rows per table page.
    pub page_size: usize,
}

impl AppConfig {
    /// Reads configuration from process env vars.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`.
    ///
    /// Semantics:
    /// - Unset or blank history dir => `$TMPDIR/sarif-dash`.
    /// - Unset, unparsable, or zero page size => [`DEFAULT_PAGE_SIZE`].
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let history_dir = lookup(HISTORY_DIR_ENV)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join("sarif-dash"));

        let page_size = lookup(PAGE_SIZE_ENV)
            .and_then(|value| value.trim().parse::<usize>().ok())
            .filter(|size| *size > 0)
            .unwrap_or(DEFAULT_PAGE_SIZE);

        Self {
            history_dir,
            page_size,
        }
    }
}

/// Everything the dashboard shows for one document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    /// Headline cards.
    pub metrics: SummaryMetrics,
    /// Chart series.
    pub charts: ChartSeries,
    /// Normalized table rows.
    pub rows: Vec<NormalizedRow>,
}

/// Derives metrics, charts, and rows.
pub fn build_dashboard(log: &AnalysisLog) -> Dashboard {
    Dashboard {
        metrics: summary_metrics(log),
        charts: chart_series(log),
        rows: normalize(log),
    }
}

/// Memoizes [`build_dashboard`] by document identity.
#[derive(Debug, Default)]
pub struct DashboardCache {
    source: Option<Arc<AnalysisLog>>,
    dashboard: Option<Arc<Dashboard>>,
    builds: usize,
}

impl DashboardCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the dashboard for `log`, rebuilding only when a different
    /// document is supplied.
    pub fn get(&mut self, log: &Arc<AnalysisLog>) -> Arc<Dashboard> {
        if let (Some(source), Some(dashboard)) = (&self.source, &self.dashboard)
            && Arc::ptr_eq(source, log)
        {
            return Arc::clone(dashboard);
        }

        let dashboard = Arc::new(build_dashboard(log));
        self.source = Some(Arc::clone(log));
        self.dashboard = Some(Arc::clone(&dashboard));
        self.builds += 1;
        dashboard
    }

    /// Number of rebuilds so far.
    pub fn builds(&self) -> usize {
        self.builds
    }
}

/// Current document plus its derived dashboard.
#[derive(Debug, Default)]
pub struct DashboardSession {
    controller: IntakeController,
    current: Option<AdmittedDocument>,
    cache: DashboardCache,
}

impl DashboardSession {
    /// Creates a session with no document loaded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads `source` and makes it current when admitted.
    ///
    /// Returns `false` when a newer read superseded this one.
    ///
    /// # Errors
    /// Returns the intake failure; the previously loaded document stays
    /// current.
    pub fn load(&mut self, source: &dyn BlobSource) -> Result<bool, AppError> {
        match self.controller.read(source) {
            Ok(IntakeOutcome::Admitted(document)) => {
                self.current = Some(document);
                Ok(true)
            }
            Ok(IntakeOutcome::Superseded) => Ok(false),
            Err(error) => {
                warn!(name = source.name(), error = %error, "keeping previous document after failed load");
                Err(error.into())
            }
        }
    }

    /// Makes an already admitted document current.
    pub fn replace(&mut self, document: AdmittedDocument) {
        self.current = Some(document);
    }

    /// Current document.
    pub fn current(&self) -> Option<&AdmittedDocument> {
        self.current.as_ref()
    }

    /// Dashboard for the current document.
    pub fn dashboard(&mut self) -> Option<Arc<Dashboard>> {
        let log = Arc::clone(&self.current.as_ref()?.log);
        Some(self.cache.get(&log))
    }

    /// Number of dashboard rebuilds so far.
    pub fn dashboard_builds(&self) -> usize {
        self.cache.builds()
    }
}

/// Records an admitted document in history.
///
/// # Errors
/// Returns [`AppError::History`] when the history list cannot be updated.
pub fn record_document(
    history: &HistoryStore,
    document: &AdmittedDocument,
    now_ms: u64,
) -> Result<HistoryEntry, AppError> {
    let entry = history.record(document.name.clone(), document.text.clone(), now_ms)?;
    debug!(id = %entry.id, "document added to history");
    Ok(entry)
}

/// Reopens a history entry, re-running the shape gate on its content.
///
/// # Errors
/// Returns [`AppError::History`] with [`HistoryError::NotFound`] for unknown
/// or expired ids, or the gate's rejection of stored content.
pub fn load_entry(
    history: &HistoryStore,
    id: &str,
    now_ms: u64,
) -> Result<AdmittedDocument, AppError> {
    let entry = history.find(id, now_ms)?;
    Ok(admit_text(entry.name, entry.content)?)
}

/// Table options supplied per invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewOptions {
    /// Global filter text.
    pub filter: Option<String>,
    /// Sort column name.
    pub sort: Option<String>,
    /// Sort descending instead of ascending.
    pub descending: bool,
    /// One-based page number.
    pub page: Option<usize>,
    /// Page size override.
    pub page_size: Option<usize>,
    /// Columns to show in addition to the defaults.
    pub show: Vec<String>,
    /// Columns to hide.
    pub hide: Vec<String>,
}

/// Builds table state from options, falling back to `default_page_size`.
///
/// # Errors
/// Returns [`AppError::Table`] for unknown column names or a zero page size.
pub fn table_state(options: &ViewOptions, default_page_size: usize) -> Result<TableState, AppError> {
    let mut state = TableState::new();
    state.set_page_size(options.page_size.unwrap_or(default_page_size))?;

    for name in &options.show {
        state.set_column_visible(name.parse::<Column>()?, true);
    }
    for name in &options.hide {
        state.set_column_visible(name.parse::<Column>()?, false);
    }

    if let Some(column) = &options.sort {
        state.set_sort(Some(SortKey {
            column: column.parse()?,
            direction: if options.descending {
                SortDirection::Desc
            } else {
                SortDirection::Asc
            },
        }));
    }

    if let Some(filter) = &options.filter {
        state.set_global_filter(filter.clone());
    }
    if let Some(page) = options.page {
        state.go_to_page(page.saturating_sub(1));
    }

    Ok(state)
}

/// Renders the headline cards. The fourth card shows fixable findings when
/// any exist, otherwise the average findings per file.
pub fn render_summary(metrics: &SummaryMetrics) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Total findings:        {}", metrics.total_findings);
    let _ = writeln!(out, "Unique files:          {}", metrics.unique_files);
    let _ = writeln!(
        out,
        "Most common rule:      {} ({})",
        metrics.most_common_rule.display_label(),
        metrics.most_common_rule.count
    );
    if metrics.has_fixable() {
        let _ = writeln!(
            out,
            "Fixable findings:      {} ({}%)",
            metrics.fixable_findings, metrics.fixable_percent
        );
    } else {
        let _ = writeln!(
            out,
            "Avg findings per file: {}",
            metrics.avg_findings_per_file_display()
        );
    }
    out
}

/// Renders all chart series as horizontal text bars.
pub fn render_charts(charts: &ChartSeries) -> String {
    let mut out = String::new();
    for (title, buckets) in [
        ("Severity", &charts.severity),
        ("Top rules", &charts.rules),
        ("Top files", &charts.files),
        ("File extensions", &charts.extensions),
    ] {
        let _ = writeln!(out, "{title}");
        if buckets.iter().all(|bucket| bucket.count == 0) {
            let _ = writeln!(out, "  (none)");
            continue;
        }

        let max = buckets.iter().map(|bucket| bucket.count).max().unwrap_or(0).max(1);
        let label_width = buckets
            .iter()
            .map(|bucket| bucket.name.chars().count())
            .max()
            .unwrap_or(0);
        for bucket in buckets {
            let bar = "#".repeat(bucket.count * BAR_WIDTH / max);
            let _ = writeln!(
                out,
                "  {:<label_width$}  {:>5}  {bar}",
                bucket.name, bucket.count
            );
        }
    }
    out
}

/// Renders one table page with aligned columns and a page footer.
pub fn render_table(page: &TablePage<'_>) -> String {
    let mut out = String::new();
    if page.rows.is_empty() {
        let _ = writeln!(out, "No findings match.");
        return out;
    }

    let cells: Vec<Vec<String>> = page
        .rows
        .iter()
        .map(|row| {
            page.columns
                .iter()
                .map(|column| match column {
                    Column::Severity => severity_badge(row),
                    _ => truncate_cell(&column.cell_text(row)),
                })
                .collect()
        })
        .collect();

    let widths: Vec<usize> = page
        .columns
        .iter()
        .enumerate()
        .map(|(index, column)| {
            cells
                .iter()
                .map(|row| row[index].chars().count())
                .chain([column.header().len()])
                .max()
                .unwrap_or(0)
        })
        .collect();

    let header: Vec<String> = page
        .columns
        .iter()
        .zip(widths.iter().copied())
        .map(|(column, width)| format!("{:<width$}", column.header()))
        .collect();
    let _ = writeln!(out, "{}", header.join(" | ").trim_end());

    let rule: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
    let _ = writeln!(out, "{}", rule.join("-+-"));

    for row in &cells {
        let line: Vec<String> = row
            .iter()
            .zip(widths.iter().copied())
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect();
        let _ = writeln!(out, "{}", line.join(" | ").trim_end());
    }

    let _ = writeln!(
        out,
        "Page {} of {} ({} findings)",
        page.page_index + 1,
        page.page_count,
        page.filtered_total
    );
    out
}

/// Prefixes the resolved severity with a one-letter marker of its category.
/// Pass-through labels such as `Critical` are marked as unknown.
pub fn severity_badge(row: &NormalizedRow) -> String {
    let marker = match row.severity_level() {
        SeverityLevel::Error => 'E',
        SeverityLevel::Warning => 'W',
        SeverityLevel::Note => 'N',
        SeverityLevel::None => '-',
        SeverityLevel::Unknown => '?',
    };
    truncate_cell(&format!("[{marker}] {}", row.severity))
}

/// Renders one row's expanded detail view.
pub fn render_row_detail(row: &NormalizedRow) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Rule:        {}", row.rule_id_display());
    let _ = writeln!(out, "Severity:    {}", severity_badge(row));
    let _ = writeln!(out, "Location:    {}:{}", row.file_name, row.line_display());
    let _ = writeln!(out, "Message:     {}", row.message_text);
    let _ = writeln!(out, "Description: {}", row.full_description);
    if !row.tags.is_empty() {
        let _ = writeln!(out, "Tags:        {}", row.tags.join(", "));
    }
    let _ = writeln!(out, "Help:        {}", row.help);
    match row.help_link() {
        Some(link) => {
            let _ = writeln!(out, "More info:   {link}");
        }
        None => {
            let _ = writeln!(out, "More info:   {}", row.help_uri);
        }
    }
    out
}

fn truncate_cell(text: &str) -> String {
    let single_line = text.replace(['\n', '\r'], " ");
    if single_line.chars().count() <= MAX_CELL_CHARS {
        return single_line;
    }
    let mut truncated: String = single_line.chars().take(MAX_CELL_CHARS - 3).collect();
    truncated.push_str("...");
    truncated
}

/// App integration error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Intake read or gate failure.
    #[error(transparent)]
    Intake(#[from] IntakeError),
    /// History store failure.
    #[error(transparent)]
    History(#[from] HistoryError),
    /// Invalid table options.
    #[error("table error: {0}")]
    Table(#[from] TableError),
}

impl AppError {
    /// Returns `true` when a history id no longer resolves.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::History(HistoryError::NotFound(_)))
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for configuration parsing and text helpers.

    use super::*;

    #[test]
    fn config_falls_back_on_invalid_page_size() {
        let config = AppConfig::from_lookup(|key| match key {
            PAGE_SIZE_ENV => Some("0".to_string()),
            _ => None,
        });
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
        assert!(config.history_dir.ends_with("sarif-dash"));

        let config = AppConfig::from_lookup(|key| match key {
            PAGE_SIZE_ENV => Some(" 25 ".to_string()),
            HISTORY_DIR_ENV => Some("/var/tmp/dash".to_string()),
            _ => None,
        });
        assert_eq!(config.page_size, 25);
        assert_eq!(config.history_dir, PathBuf::from("/var/tmp/dash"));
    }

    #[test]
    fn long_cells_are_truncated_to_one_line() {
        let text = format!("line one\n{}", "x".repeat(80));
        let cell = truncate_cell(&text);
        assert_eq!(cell.chars().count(), MAX_CELL_CHARS);
        assert!(cell.starts_with("line one x"));
        assert!(cell.ends_with("..."));
    }

    #[test]
    fn not_found_is_detectable() {
        let error = AppError::from(HistoryError::NotFound("x".to_string()));
        assert!(error.is_not_found());
        assert!(!AppError::from(TableError::InvalidPageSize).is_not_found());
    }
}
