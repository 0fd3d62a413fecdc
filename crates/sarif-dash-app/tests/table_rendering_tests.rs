//! Integration tests for table options and text rendering.

mod common;

use common::{LOOSE_TYPES_LOG, fixture_document};
use sarif_dash_app::{
    AppError, ViewOptions, build_dashboard, render_charts, render_row_detail, render_summary,
    render_table, severity_badge, table_state,
};
use sarif_dash_intake::admit_text;
use sarif_dash_table::{Column, SortDirection, TableError};

#[test]
fn default_options_show_five_columns() {
    let dashboard = build_dashboard(&fixture_document().log);
    let state = table_state(&ViewOptions::default(), 10).expect("default state");
    let page = state.view(&dashboard.rows);

    let rendered = render_table(&page);
    let header = rendered.lines().next().expect("header line");
    assert!(header.starts_with("File Name"));
    assert!(header.contains("Message"));
    assert!(!header.contains("Tags"));
    assert!(rendered.contains("src/db/users.js"));
    assert!(rendered.trim_end().ends_with("Page 1 of 1 (3 findings)"));
}

#[test]
fn options_toggle_columns_sort_and_page() {
    let options = ViewOptions {
        filter: Some("PY".to_string()),
        sort: Some("line".to_string()),
        descending: true,
        page: Some(3),
        page_size: Some(1),
        show: vec!["tags".to_string()],
        hide: vec!["message".to_string()],
    };
    let state = table_state(&options, 10).expect("state");
    assert!(state.is_visible(Column::Tags));
    assert!(!state.is_visible(Column::Message));
    assert_eq!(state.sort().map(|sort| sort.direction), Some(SortDirection::Desc));
    assert_eq!(state.page_size(), 1);

    let dashboard = build_dashboard(&fixture_document().log);
    let page = state.view(&dashboard.rows);
    assert_eq!(page.filtered_total, 1);
    assert_eq!(page.page_index, 0);
    assert_eq!(page.rows[0].file_name, "tools/build.PY");
}

#[test]
fn bad_options_are_reported() {
    let unknown = ViewOptions {
        sort: Some("owner".to_string()),
        ..ViewOptions::default()
    };
    assert!(matches!(
        table_state(&unknown, 10),
        Err(AppError::Table(TableError::UnknownColumn(name))) if name == "owner"
    ));

    let zero = ViewOptions {
        page_size: Some(0),
        ..ViewOptions::default()
    };
    assert!(matches!(
        table_state(&zero, 10),
        Err(AppError::Table(TableError::InvalidPageSize))
    ));
}

#[test]
fn no_match_renders_placeholder() {
    let dashboard = build_dashboard(&fixture_document().log);
    let options = ViewOptions {
        filter: Some("nothing-matches-this".to_string()),
        ..ViewOptions::default()
    };
    let page = table_state(&options, 10).expect("state").view(&dashboard.rows);
    assert_eq!(render_table(&page), "No findings match.\n");
}

#[test]
fn summary_and_charts_render_cards_and_bars() {
    let dashboard = build_dashboard(&fixture_document().log);

    let summary = render_summary(&dashboard.metrics);
    assert!(summary.contains("Total findings:        3"));
    assert!(summary.contains("Most common rule:      sequelize-raw-query (1)"));
    assert!(summary.contains("Fixable findings:      1 (33%)"));
    assert!(!summary.contains("Avg findings per file"));

    let charts = render_charts(&dashboard.charts);
    assert!(charts.starts_with("Severity\n"));
    assert!(charts.contains("Top rules"));
    assert!(charts.contains(".py"));
}

#[test]
fn row_detail_includes_help_link() {
    let dashboard = build_dashboard(&fixture_document().log);
    let detail = render_row_detail(&dashboard.rows[0]);
    assert!(detail.contains("Severity:    [E] Error"));
    assert!(detail.contains("Location:    src/db/users.js:42"));
    assert!(detail.contains("Tags:        security, cwe-89"));
    assert!(detail.contains("More info:   https://semgrep.dev/r/sequelize-raw-query"));

    let bare = render_row_detail(&dashboard.rows[2]);
    assert!(bare.contains("Rule:        N/A"));
    assert!(bare.contains("More info:   No URI"));
}

#[test]
fn summary_without_fixable_findings_shows_average_card() {
    let document = admit_text(
        "plain.sarif",
        r#"{"version":"2.1.0","runs":[{"tool":{"driver":{"name":"t"}},"results":[
            {"ruleId":"a","message":{"text":"one"},"locations":[{"physicalLocation":{"artifactLocation":{"uri":"x.rs"}}}]},
            {"ruleId":"a","message":{"text":"two"},"locations":[{"physicalLocation":{"artifactLocation":{"uri":"x.rs"}}}]},
            {"ruleId":"b","message":{"text":"three"},"locations":[{"physicalLocation":{"artifactLocation":{"uri":"y.rs"}}}]}
        ]}]}"#
            .to_string(),
    )
    .expect("document should be admitted");
    let dashboard = build_dashboard(&document.log);

    let summary = render_summary(&dashboard.metrics);
    assert!(summary.contains("Avg findings per file: 1.5"));
    assert!(!summary.contains("Fixable findings"));
}

#[test]
fn severity_cells_carry_category_badge() {
    let dashboard = build_dashboard(&fixture_document().log);
    let badges: Vec<String> = dashboard.rows.iter().map(severity_badge).collect();
    assert_eq!(badges, vec!["[E] Error", "[W] Warning", "[?] Unknown"]);

    let page = table_state(&ViewOptions::default(), 10)
        .expect("default state")
        .view(&dashboard.rows);
    let rendered = render_table(&page);
    assert!(rendered.contains("[W] Warning"));

    let mut passthrough = dashboard.rows[0].clone();
    passthrough.severity = "Critical".to_string();
    assert_eq!(severity_badge(&passthrough), "[?] Critical");
}

#[test]
fn loose_types_document_renders_end_to_end() {
    let document =
        admit_text("loose.sarif", LOOSE_TYPES_LOG.trim().to_string()).expect("fixture should be admitted");
    let dashboard = build_dashboard(&document.log);
    assert_eq!(dashboard.rows.len(), 2);
    assert_eq!(dashboard.metrics.total_findings, 2);

    let page = table_state(&ViewOptions::default(), 10)
        .expect("default state")
        .view(&dashboard.rows);
    let rendered = render_table(&page);
    assert!(rendered.contains("plain string message"));
    assert!(rendered.contains("[W] Warning"));

    let detail = render_row_detail(&dashboard.rows[0]);
    assert!(detail.contains("Location:    src/app.py:N/A"));
    assert!(detail.contains("Rule:        loose.rule"));
}
