use std::path::Path;

use anyhow::{Context, Result};
use log::info;

use crate::{io_utils, record::CaseTable};

/// Writes `cases` as CSV to `output`, or stdout when `output` is `None`.
/// Columns are the fields present in the set, in canonical order; nulls are
/// written as empty cells.
pub fn write_cases(cases: &CaseTable, output: Option<&Path>) -> Result<usize> {
    let mut writer = io_utils::open_csv_writer(output)?;
    let headers = cases.fields().iter().map(|f| f.as_str()).collect::<Vec<_>>();
    writer
        .write_record(&headers)
        .context("Writing export header")?;
    for (idx, record) in cases.records().iter().enumerate() {
        let row = cases
            .fields()
            .iter()
            .map(|field| record.value(*field).unwrap_or_default())
            .collect::<Vec<_>>();
        writer
            .write_record(row.iter().map(|cell| cell.as_bytes()))
            .with_context(|| format!("Writing exported record {}", idx + 1))?;
    }
    writer.flush().context("Flushing export output")?;
    info!(
        "Exported {} record(s) to {}",
        cases.len(),
        output
            .filter(|p| !io_utils::is_dash(p))
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "stdout".into())
    );
    Ok(cases.len())
}
