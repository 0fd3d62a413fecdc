#![warn(missing_docs)]
//! # sarif-dash-table
//!
//! ## Purpose
//! Holds the findings-table view state: global filter, single-column sort,
//! column visibility, and pagination.
//!
//! ## Responsibilities
//! - Define the table columns and how each projects a [`NormalizedRow`] into
//!   display text.
//! - Apply filter, then sort, then pagination to produce one [`TablePage`].
//! - Keep Tags, Description, and Help hidden until toggled on.
//!
//! ## Data flow
//! Normalized rows + [`TableState`] -> [`TableState::view`] -> page rendered
//! by the CLI.
//!
//! ## Ownership and lifetimes
//! State is owned and small; pages borrow the caller's rows instead of
//! cloning them.
//!
//! ## Error model
//! Only user-supplied column names and page sizes can fail
//! ([`TableError`]). Out-of-range page indices are clamped, not rejected.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use sarif_dash_normalize::NormalizedRow;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rows per page unless configured otherwise.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Findings-table columns in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Column {
    /// First-location URI.
    FileName,
    /// First-location start line.
    Line,
    /// Rule id.
    RuleId,
    /// Resolved severity.
    Severity,
    /// Message text.
    Message,
    /// Short description (full description on expansion).
    Description,
    /// Resolved tags.
    Tags,
    /// Help text and link.
    Help,
}

impl Column {
    /// All columns in display order.
    pub const ALL: [Column; 8] = [
        Column::FileName,
        Column::Line,
        Column::RuleId,
        Column::Severity,
        Column::Message,
        Column::Description,
        Column::Tags,
        Column::Help,
    ];

    /// Stable column id.
    pub fn id(self) -> &'static str {
        match self {
            Self::FileName => "fileName",
            Self::Line => "line",
            Self::RuleId => "ruleId",
            Self::Severity => "severity",
            Self::Message => "messageText",
            Self::Description => "description",
            Self::Tags => "tags",
            Self::Help => "help",
        }
    }

    /// Header label.
    pub fn header(self) -> &'static str {
        match self {
            Self::FileName => "File Name",
            Self::Line => "Line",
            Self::RuleId => "Rule ID",
            Self::Severity => "Severity",
            Self::Message => "Message",
            Self::Description => "Description",
            Self::Tags => "Tags",
            Self::Help => "Help",
        }
    }

    /// Columns hidden until the user enables them.
    pub fn hidden_by_default(self) -> bool {
        matches!(self, Self::Description | Self::Tags | Self::Help)
    }

    /// Projects a row into this column's display text.
    pub fn cell_text(self, row: &NormalizedRow) -> String {
        match self {
            Self::FileName => row.file_name.clone(),
            Self::Line => row.line_display(),
            Self::RuleId => row.rule_id_display().to_string(),
            Self::Severity => row.severity.clone(),
            Self::Message => row.message_text.clone(),
            Self::Description => row.short_description.clone(),
            Self::Tags => row.tags.join(", "),
            Self::Help => row.help.clone(),
        }
    }

    fn compare(self, left: &NormalizedRow, right: &NormalizedRow) -> Ordering {
        match self {
            // Missing lines sort after present ones.
            Self::Line => match (left.line, right.line) {
                (Some(a), Some(b)) => a.cmp(&b),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
            _ => self.cell_text(left).cmp(&self.cell_text(right)),
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Column {
    type Err = TableError;

    /// Accepts the column id or header, case-insensitively, plus `message`
    /// and `file` shorthands.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = value.trim().to_ascii_lowercase();
        Column::ALL
            .into_iter()
            .find(|column| {
                column.id().to_ascii_lowercase() == wanted
                    || column.header().to_ascii_lowercase() == wanted
            })
            .or(match wanted.as_str() {
                "message" => Some(Column::Message),
                "file" => Some(Column::FileName),
                "rule" => Some(Column::RuleId),
                _ => None,
            })
            .ok_or_else(|| TableError::UnknownColumn(value.to_string()))
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    /// Ascending.
    Asc,
    /// Descending.
    Desc,
}

/// Active sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    /// Sorted column.
    pub column: Column,
    /// Direction.
    pub direction: SortDirection,
}

/// Table view state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableState {
    global_filter: String,
    sort: Option<SortKey>,
    hidden: BTreeSet<Column>,
    page_index: usize,
    page_size: usize,
}

impl TableState {
    /// Creates default state: no filter, no sort, default hidden columns,
    /// first page of [`DEFAULT_PAGE_SIZE`] rows.
    pub fn new() -> Self {
        Self {
            global_filter: String::new(),
            sort: None,
            hidden: Column::ALL
                .into_iter()
                .filter(|column| column.hidden_by_default())
                .collect(),
            page_index: 0,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Current global filter.
    pub fn global_filter(&self) -> &str {
        &self.global_filter
    }

    /// Sets the global filter and returns to the first page.
    pub fn set_global_filter(&mut self, filter: impl Into<String>) {
        self.global_filter = filter.into();
        self.page_index = 0;
    }

    /// Current sort key.
    pub fn sort(&self) -> Option<SortKey> {
        self.sort
    }

    /// Replaces the sort key.
    pub fn set_sort(&mut self, sort: Option<SortKey>) {
        self.sort = sort;
    }

    /// Cycles a column through ascending, descending, and unsorted. Sorting a
    /// different column replaces the previous key.
    pub fn toggle_sort(&mut self, column: Column) {
        self.sort = match self.sort {
            Some(SortKey {
                column: active,
                direction: SortDirection::Asc,
            }) if active == column => Some(SortKey {
                column,
                direction: SortDirection::Desc,
            }),
            Some(SortKey {
                column: active,
                direction: SortDirection::Desc,
            }) if active == column => None,
            _ => Some(SortKey {
                column,
                direction: SortDirection::Asc,
            }),
        };
    }

    /// Returns `true` when the column is shown.
    pub fn is_visible(&self, column: Column) -> bool {
        !self.hidden.contains(&column)
    }

    /// Shows or hides one column.
    pub fn set_column_visible(&mut self, column: Column, visible: bool) {
        if visible {
            self.hidden.remove(&column);
        } else {
            self.hidden.insert(column);
        }
    }

    /// Flips one column's visibility.
    pub fn toggle_column(&mut self, column: Column) {
        let visible = self.is_visible(column);
        self.set_column_visible(column, !visible);
    }

    /// Visible columns in display order.
    pub fn visible_columns(&self) -> Vec<Column> {
        Column::ALL
            .into_iter()
            .filter(|column| self.is_visible(*column))
            .collect()
    }

    /// Rows per page.
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Changes the page size and returns to the first page.
    ///
    /// # Errors
    /// Returns [`TableError::InvalidPageSize`] when `page_size == 0`.
    pub fn set_page_size(&mut self, page_size: usize) -> Result<(), TableError> {
        if page_size == 0 {
            return Err(TableError::InvalidPageSize);
        }
        self.page_size = page_size;
        self.page_index = 0;
        Ok(())
    }

    /// Requested zero-based page index.
    pub fn page_index(&self) -> usize {
        self.page_index
    }

    /// Jumps to a zero-based page. [`TableState::view`] clamps it.
    pub fn go_to_page(&mut self, page_index: usize) {
        self.page_index = page_index;
    }

    /// Advances one page.
    pub fn next_page(&mut self) {
        self.page_index = self.page_index.saturating_add(1);
    }

    /// Goes back one page, stopping at the first.
    pub fn previous_page(&mut self) {
        self.page_index = self.page_index.saturating_sub(1);
    }

    /// Keeps rows where any visible column contains the filter,
    /// case-insensitively. An empty filter keeps everything.
    pub fn filter_rows<'a>(&self, rows: &'a [NormalizedRow]) -> Vec<&'a NormalizedRow> {
        let needle = self.global_filter.trim().to_lowercase();
        if needle.is_empty() {
            return rows.iter().collect();
        }

        let columns = self.visible_columns();
        rows.iter()
            .filter(|row| {
                columns
                    .iter()
                    .any(|column| column.cell_text(row).to_lowercase().contains(&needle))
            })
            .collect()
    }

    /// Applies filter, sort, and pagination.
    pub fn view<'a>(&self, rows: &'a [NormalizedRow]) -> TablePage<'a> {
        let mut filtered = self.filter_rows(rows);

        if let Some(sort) = self.sort {
            filtered.sort_by(|left, right| {
                let ordering = sort.column.compare(left, right);
                match sort.direction {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                }
            });
        }

        let filtered_total = filtered.len();
        let page_count = filtered_total.div_ceil(self.page_size);
        let page_index = self.page_index.min(page_count.saturating_sub(1));
        let rows = filtered
            .into_iter()
            .skip(page_index * self.page_size)
            .take(self.page_size)
            .collect();

        TablePage {
            rows,
            columns: self.visible_columns(),
            page_index,
            page_count,
            filtered_total,
        }
    }
}

impl Default for TableState {
    fn default() -> Self {
        Self::new()
    }
}

/// One rendered page of the findings table.
#[derive(Debug, Clone, PartialEq)]
pub struct TablePage<'a> {
    /// Rows on this page.
    pub rows: Vec<&'a NormalizedRow>,
    /// Visible columns in display order.
    pub columns: Vec<Column>,
    /// Effective zero-based page index after clamping.
    pub page_index: usize,
    /// Number of pages (0 when nothing matches).
    pub page_count: usize,
    /// Rows matching the filter across all pages.
    pub filtered_total: usize,
}

impl TablePage<'_> {
    /// Returns `true` when an earlier page exists.
    pub fn can_previous_page(&self) -> bool {
        self.page_index > 0
    }

    /// Returns `true` when a later page exists.
    pub fn can_next_page(&self) -> bool {
        self.page_index + 1 < self.page_count
    }
}

/// Table state errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TableError {
    /// Column name matched no column.
    #[error("unknown column: {0}")]
    UnknownColumn(String),
    /// Page size must be positive.
    #[error("page size must be greater than zero")]
    InvalidPageSize,
}
