//! Terminal rendition of the dashboard overview.

use std::fmt::Write as _;

use anyhow::{Context, Result};

use crate::{
    config::PipelineConfig,
    filter::ALL_SENTINEL,
    report, table,
    view::DashboardView,
};

pub const QUICK_BREAKDOWN_ROWS: usize = 10;

/// KPIs followed by the quick breakdown tables and the status by age group
/// pivot, each under its own heading.
pub fn render_overview(view: &DashboardView, config: &PipelineConfig) -> String {
    let mut output = String::new();
    let active = view
        .filters
        .iter()
        .filter(|f| !f.is_unconstrained())
        .map(|f| format!("{}={}", f.field, f.value))
        .collect::<Vec<_>>();
    let _ = writeln!(
        output,
        "Filters: {}",
        if active.is_empty() {
            ALL_SENTINEL.to_string()
        } else {
            active.join(", ")
        }
    );
    let _ = writeln!(output, "Total records: {}", view.kpis.total_records);
    let _ = writeln!(output, "Most common status: {}", view.kpis.most_common_status);
    let _ = writeln!(output, "Median age: {}", view.kpis.median_age);

    let aggregates = &view.aggregates;
    section(
        &mut output,
        "Top provinces/cities by cases",
        &table::render_counts(&aggregates.by_province.head(QUICK_BREAKDOWN_ROWS)),
    );
    section(
        &mut output,
        "Cases by age group",
        &table::render_counts(&report::age_groups_in_bin_order(
            &aggregates.by_age_group,
            &view.records,
            &config.age_bins,
        )),
    );
    section(
        &mut output,
        "Cases by status",
        &table::render_counts(&aggregates.by_status),
    );
    section(
        &mut output,
        "Status by age group",
        &table::render_pivot(
            &aggregates
                .status_by_age_group
                .with_row_order(config.age_bins.labels()),
        ),
    );
    output
}

fn section(output: &mut String, title: &str, rendered: &str) {
    let _ = writeln!(output);
    let _ = writeln!(output, "{title}");
    output.push_str(rendered);
}

pub fn render_json(view: &DashboardView) -> Result<String> {
    serde_json::to_string_pretty(view).context("Serializing dashboard view")
}

pub fn render_choices(field: &str, choices: &[String]) -> String {
    let rows = choices.iter().map(|c| vec![c.clone()]).collect::<Vec<_>>();
    table::render_table(&[field.to_string()], &rows)
}
