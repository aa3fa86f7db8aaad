use anyhow::{Result, anyhow};
use itertools::Itertools;
use log::debug;
use serde::Serialize;

use crate::{record::CaseTable, schema::CanonicalField};

/// Filter value meaning "no constraint on this field".
pub const ALL_SENTINEL: &str = "(All)";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldFilter {
    pub field: CanonicalField,
    pub value: String,
}

impl FieldFilter {
    pub fn new(field: CanonicalField, value: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
        }
    }

    pub fn is_unconstrained(&self) -> bool {
        self.value == ALL_SENTINEL
    }
}

pub fn parse_filters(filters: &[String]) -> Result<Vec<FieldFilter>> {
    filters.iter().map(|f| parse_filter(f)).collect()
}

/// Parses `field=value`; the value may be quoted.
fn parse_filter(filter: &str) -> Result<FieldFilter> {
    let trimmed = filter.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("Empty filter expression"));
    }
    let (left, right) = trimmed
        .split_once('=')
        .ok_or_else(|| anyhow!("Filter '{trimmed}' must use the form field=value"))?;
    let field = left.trim().parse::<CanonicalField>()?;
    Ok(FieldFilter {
        field,
        value: unquote(right.trim()).to_string(),
    })
}

fn unquote(value: &str) -> &str {
    if value.len() >= 2 {
        let bytes = value.as_bytes();
        if (bytes[0] == b'"' && bytes[value.len() - 1] == b'"')
            || (bytes[0] == b'\'' && bytes[value.len() - 1] == b'\'')
        {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Records matching every constrained filter. Filters set to [`ALL_SENTINEL`]
/// and filters on fields the table does not carry are ignored.
pub fn apply_filters(table: &CaseTable, filters: &[FieldFilter]) -> CaseTable {
    let active = filters
        .iter()
        .filter(|f| !f.is_unconstrained())
        .filter(|f| {
            let present = table.has_field(f.field);
            if !present {
                debug!("Ignoring filter on absent field '{}'", f.field);
            }
            present
        })
        .collect::<Vec<_>>();
    if active.is_empty() {
        return table.clone();
    }
    table.retain(|record| {
        active
            .iter()
            .all(|f| record.value(f.field).is_some_and(|v| v == f.value.as_str()))
    })
}

/// Selectable values for `field`: the sentinel followed by the sorted
/// distinct non-null values.
pub fn choices(table: &CaseTable, field: CanonicalField) -> Vec<String> {
    let values = if table.has_field(field) {
        table
            .records()
            .iter()
            .filter_map(|r| r.value(field))
            .map(|v| v.into_owned())
            .unique()
            .sorted()
            .collect::<Vec<_>>()
    } else {
        Vec::new()
    };
    std::iter::once(ALL_SENTINEL.to_string())
        .chain(values)
        .collect()
}
