//! Batch reporting: aggregate tables to CSV, charts to PNG.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{info, warn};

use crate::{
    aggregate::{CountTable, PivotTable},
    bins::AgeBins,
    chart::{self, ChartLabels},
    config::PipelineConfig,
    io_utils,
    record::CaseTable,
    schema::CanonicalField,
    view::AggregateSet,
};

pub const TOP_PROVINCES: &str = "top_provinces";
pub const CASES_BY_AGE_GROUP: &str = "cases_by_age_group";
pub const STATUS_OVERALL: &str = "status_overall";
pub const STATUS_BY_AGE_GROUP: &str = "status_by_age_group";
pub const TOP_NATIONALITY: &str = "top_nationality";

/// Tables as they are published: truncated and ordered for readers.
#[derive(Debug, Clone)]
pub struct ReportTables {
    pub top_provinces: CountTable,
    pub cases_by_age_group: CountTable,
    pub status_overall: CountTable,
    pub status_by_age_group: PivotTable,
    pub top_nationality: CountTable,
}

impl ReportTables {
    pub fn from_aggregates(
        aggregates: &AggregateSet,
        cases: &CaseTable,
        config: &PipelineConfig,
    ) -> Self {
        let labels = config.age_bins.labels();
        Self {
            top_provinces: aggregates.by_province.head(config.top_n),
            cases_by_age_group: age_groups_in_bin_order(
                &aggregates.by_age_group,
                cases,
                &config.age_bins,
            ),
            status_overall: aggregates.by_status.clone(),
            status_by_age_group: aggregates.status_by_age_group.with_row_order(labels),
            top_nationality: aggregates.by_nationality.head(config.top_n),
        }
    }
}

/// Age-group counts in bin order. Bins are zero-filled only when the records
/// carry ages; without an age column the counts are kept as tallied.
pub fn age_groups_in_bin_order(
    counts: &CountTable,
    cases: &CaseTable,
    bins: &AgeBins,
) -> CountTable {
    if cases.has_field(CanonicalField::Age) {
        counts.in_label_order(bins.labels())
    } else {
        counts.clone()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ReportOptions {
    pub figures: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self { figures: true }
    }
}

#[derive(Debug, Default)]
pub struct ReportOutcome {
    pub tables: Vec<PathBuf>,
    pub figures: Vec<PathBuf>,
    pub skipped_figures: Vec<String>,
}

pub fn write_report(
    cases: &CaseTable,
    config: &PipelineConfig,
    options: ReportOptions,
) -> Result<ReportOutcome> {
    let tables_dir = &config.output.tables_dir;
    let figures_dir = &config.output.figures_dir;
    io_utils::ensure_dir(tables_dir)?;
    if options.figures {
        io_utils::ensure_dir(figures_dir)?;
    }

    let aggregates = AggregateSet::compute(cases);
    let tables = ReportTables::from_aggregates(&aggregates, cases, config);
    let mut outcome = ReportOutcome::default();

    for (name, table) in [
        (TOP_PROVINCES, &tables.top_provinces),
        (CASES_BY_AGE_GROUP, &tables.cases_by_age_group),
        (STATUS_OVERALL, &tables.status_overall),
        (TOP_NATIONALITY, &tables.top_nationality),
    ] {
        let path = table_path(tables_dir, name);
        write_rows(&path, &table.headers(), &table.to_string_rows())?;
        outcome.tables.push(path);
    }
    let pivot_path = table_path(tables_dir, STATUS_BY_AGE_GROUP);
    write_rows(
        &pivot_path,
        &tables.status_by_age_group.headers(),
        &tables.status_by_age_group.to_string_rows(),
    )?;
    outcome.tables.push(pivot_path);
    outcome.tables.sort();

    if options.figures {
        draw_figures(&tables, figures_dir, &mut outcome);
    }

    info!("Tables written to {:?}", tables_dir);
    if options.figures {
        info!("Figures written to {:?}", figures_dir);
    }
    Ok(outcome)
}

fn table_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{name}.csv"))
}

fn figure_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{name}.png"))
}

pub fn write_rows(path: &Path, headers: &[String], rows: &[Vec<String>]) -> Result<()> {
    let mut writer = io_utils::open_csv_writer(Some(path))?;
    writer
        .write_record(headers)
        .with_context(|| format!("Writing header to {path:?}"))?;
    for row in rows {
        writer
            .write_record(row)
            .with_context(|| format!("Writing row to {path:?}"))?;
    }
    writer
        .flush()
        .with_context(|| format!("Flushing {path:?}"))?;
    Ok(())
}

enum Figure<'a> {
    Bars(&'a CountTable),
    HorizontalBars(&'a CountTable),
    StackedBars(&'a PivotTable),
}

fn draw_figures(tables: &ReportTables, dir: &Path, outcome: &mut ReportOutcome) {
    let figures = [
        (
            TOP_PROVINCES,
            Figure::HorizontalBars(&tables.top_provinces),
            ChartLabels {
                title: "Top provinces/cities by cases",
                x_desc: "Cases",
                y_desc: "Province/City",
            },
        ),
        (
            CASES_BY_AGE_GROUP,
            Figure::Bars(&tables.cases_by_age_group),
            ChartLabels {
                title: "Cases by age group",
                x_desc: "Age group",
                y_desc: "Cases",
            },
        ),
        (
            STATUS_OVERALL,
            Figure::Bars(&tables.status_overall),
            ChartLabels {
                title: "Case status (overall)",
                x_desc: "Status",
                y_desc: "Cases",
            },
        ),
        (
            STATUS_BY_AGE_GROUP,
            Figure::StackedBars(&tables.status_by_age_group),
            ChartLabels {
                title: "Status by age group",
                x_desc: "Age group",
                y_desc: "Cases",
            },
        ),
        (
            TOP_NATIONALITY,
            Figure::HorizontalBars(&tables.top_nationality),
            ChartLabels {
                title: "Top nationalities",
                x_desc: "Cases",
                y_desc: "Nationality",
            },
        ),
    ];

    for (name, figure, labels) in figures {
        let path = figure_path(dir, name);
        let drawn = match figure {
            Figure::Bars(table) => chart::bar_chart(table, &path, &labels),
            Figure::HorizontalBars(table) => chart::horizontal_bar_chart(table, &path, &labels),
            Figure::StackedBars(table) => chart::stacked_bar_chart(table, &path, &labels),
        };
        match drawn {
            Ok(true) => outcome.figures.push(path),
            Ok(false) => {
                info!("No data to plot for {name}; skipping figure");
                outcome.skipped_figures.push(name.to_string());
            }
            Err(err) => {
                warn!("Could not render {name} chart: {err:#}");
                outcome.skipped_figures.push(name.to_string());
            }
        }
    }
}
