//! PNG charts for aggregate tables.
//!
//! Each renderer returns `Ok(false)` without touching the filesystem when the
//! table has nothing to plot.

use std::path::Path;

use anyhow::Result;
use plotters::prelude::*;

use crate::aggregate::{CountTable, PivotTable};

const FONT_FAMILY: &str = "sans-serif";
const BAR_COLOR: RGBColor = RGBColor(54, 110, 168);

pub struct ChartLabels<'a> {
    pub title: &'a str,
    pub x_desc: &'a str,
    pub y_desc: &'a str,
}

fn axis_max(max: u64) -> u64 {
    // headroom so the tallest bar does not touch the frame
    (max + max / 10).max(max + 1)
}

/// Vertical bars, one per row, in table order.
pub fn bar_chart(table: &CountTable, path: &Path, labels: &ChartLabels<'_>) -> Result<bool> {
    if table.is_empty() {
        return Ok(false);
    }
    let names = table.rows.iter().map(|(name, _)| name.clone()).collect::<Vec<_>>();
    let max = table.rows.iter().map(|(_, count)| *count).max().unwrap_or(0);

    let root = BitMapBackend::new(path, (1000, 500)).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .margin(12)
        .caption(labels.title, (FONT_FAMILY, 26))
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d((0..names.len()).into_segmented(), 0u64..axis_max(max))?;
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(names.len())
        .x_label_formatter(&|value| segment_label(&names, value))
        .x_desc(labels.x_desc)
        .y_desc(labels.y_desc)
        .draw()?;
    chart.draw_series(table.rows.iter().enumerate().map(|(idx, (_, count))| {
        let mut bar = Rectangle::new(
            [
                (SegmentValue::Exact(idx), 0),
                (SegmentValue::Exact(idx + 1), *count),
            ],
            BAR_COLOR.filled(),
        );
        bar.set_margin(0, 0, 6, 6);
        bar
    }))?;
    root.present()?;
    Ok(true)
}

/// Horizontal bars with the first row at the top.
pub fn horizontal_bar_chart(
    table: &CountTable,
    path: &Path,
    labels: &ChartLabels<'_>,
) -> Result<bool> {
    if table.is_empty() {
        return Ok(false);
    }
    let count = table.rows.len();
    // plotters grows the y axis upward, so reverse to keep rank 1 on top
    let names = table
        .rows
        .iter()
        .rev()
        .map(|(name, _)| name.clone())
        .collect::<Vec<_>>();
    let max = table.rows.iter().map(|(_, c)| *c).max().unwrap_or(0);

    let root = BitMapBackend::new(path, (800, 600)).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .margin(12)
        .caption(labels.title, (FONT_FAMILY, 26))
        .x_label_area_size(40)
        .y_label_area_size(140)
        .build_cartesian_2d(0u64..axis_max(max), (0..count).into_segmented())?;
    chart
        .configure_mesh()
        .disable_y_mesh()
        .y_labels(count)
        .y_label_formatter(&|value| segment_label(&names, value))
        .x_desc(labels.x_desc)
        .y_desc(labels.y_desc)
        .draw()?;
    chart.draw_series(table.rows.iter().enumerate().map(|(rank, (_, cases))| {
        let slot = count - 1 - rank;
        let mut bar = Rectangle::new(
            [
                (0, SegmentValue::Exact(slot)),
                (*cases, SegmentValue::Exact(slot + 1)),
            ],
            BAR_COLOR.filled(),
        );
        bar.set_margin(4, 4, 0, 0);
        bar
    }))?;
    root.present()?;
    Ok(true)
}

/// One bar per pivot row, stacked by column, with a legend of column values.
pub fn stacked_bar_chart(table: &PivotTable, path: &Path, labels: &ChartLabels<'_>) -> Result<bool> {
    if table.is_empty() || table.total() == 0 {
        return Ok(false);
    }
    let names = table.rows.iter().map(|(name, _)| name.clone()).collect::<Vec<_>>();
    let max = table
        .rows
        .iter()
        .map(|(_, cells)| cells.iter().sum::<u64>())
        .max()
        .unwrap_or(0);

    let root = BitMapBackend::new(path, (1000, 600)).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .margin(12)
        .caption(labels.title, (FONT_FAMILY, 26))
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d((0..names.len()).into_segmented(), 0u64..axis_max(max))?;
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(names.len())
        .x_label_formatter(&|value| segment_label(&names, value))
        .x_desc(labels.x_desc)
        .y_desc(labels.y_desc)
        .draw()?;

    let mut base = vec![0u64; table.rows.len()];
    for (col_idx, column) in table.columns.iter().enumerate() {
        let color = Palette99::pick(col_idx).to_rgba();
        let bars = table
            .rows
            .iter()
            .enumerate()
            .map(|(row_idx, (_, cells))| {
                let value = cells.get(col_idx).copied().unwrap_or(0);
                let bottom = base[row_idx];
                base[row_idx] += value;
                let mut bar = Rectangle::new(
                    [
                        (SegmentValue::Exact(row_idx), bottom),
                        (SegmentValue::Exact(row_idx + 1), bottom + value),
                    ],
                    color.filled(),
                );
                bar.set_margin(0, 0, 6, 6);
                bar
            })
            .collect::<Vec<_>>();
        chart
            .draw_series(bars)?
            .label(column.as_str())
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 12, y + 5)], color.filled()));
    }
    chart
        .configure_series_labels()
        .border_style(&BLACK)
        .background_style(&WHITE.mix(0.8))
        .position(SeriesLabelPosition::UpperRight)
        .draw()?;
    root.present()?;
    Ok(true)
}

fn segment_label(names: &[String], value: &SegmentValue<usize>) -> String {
    match value {
        SegmentValue::CenterOf(idx) | SegmentValue::Exact(idx) => {
            names.get(*idx).cloned().unwrap_or_default()
        }
        SegmentValue::Last => String::new(),
    }
}
