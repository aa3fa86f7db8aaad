use std::borrow::Cow;
use std::fmt::Write as _;

use crate::aggregate::{CountTable, PivotTable};

/// Renders `headers` and `rows` as a left-aligned text table with a dashed
/// separator under the header.
pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let column_count = headers.len();
    let mut widths = headers.iter().map(|h| display_width(h)).collect::<Vec<_>>();

    for row in rows {
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            widths[idx] = widths[idx].max(display_width(cell));
        }
    }

    let mut output = String::new();
    let _ = writeln!(output, "{}", format_row(headers, &widths));

    let separator_widths = widths.iter().map(|w| (*w).max(3)).collect::<Vec<usize>>();
    let separator_cells = separator_widths
        .iter()
        .map(|w| "-".repeat(*w))
        .collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_row(&separator_cells, &separator_widths));

    for row in rows {
        let _ = writeln!(output, "{}", format_row(row, &widths));
    }

    output
}

pub fn render_counts(table: &CountTable) -> String {
    render_table(&table.headers(), &table.to_string_rows())
}

pub fn render_pivot(table: &PivotTable) -> String {
    render_table(&table.headers(), &table.to_string_rows())
}

fn format_row(values: &[String], widths: &[usize]) -> String {
    let cells = values
        .iter()
        .zip(widths)
        .map(|(value, width)| {
            let sanitized = sanitize_cell(value);
            let padding = width.saturating_sub(display_width(&sanitized));
            let mut cell = sanitized.into_owned();
            cell.push_str(&" ".repeat(padding));
            cell
        })
        .collect::<Vec<_>>();
    cells.join("  ").trim_end().to_string()
}

fn display_width(value: &str) -> usize {
    value.chars().count()
}

fn sanitize_cell(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_counts_aligns_columns() {
        let table = CountTable {
            key: "province".into(),
            rows: vec![("Hanoi".into(), 12), ("Ho Chi Minh".into(), 3)],
        };
        let rendered = render_counts(&table);
        let lines = rendered.lines().collect::<Vec<_>>();
        assert_eq!(
            lines,
            vec![
                "province     cases",
                "-----------  -----",
                "Hanoi        12",
                "Ho Chi Minh  3"
            ]
        );
    }

    #[test]
    fn empty_table_still_renders_headers() {
        let rendered = render_counts(&CountTable {
            key: "status".into(),
            rows: Vec::new(),
        });
        assert_eq!(rendered.lines().count(), 2);
        assert!(rendered.starts_with("status  cases"));
    }

    #[test]
    fn control_characters_become_spaces() {
        let headers = vec!["note".to_string()];
        let rows = vec![vec!["line1\nline2\tvalue".to_string()]];
        let rendered = render_table(&headers, &rows);
        assert_eq!(rendered.lines().nth(2), Some("line1 line2 value"));
    }
}
