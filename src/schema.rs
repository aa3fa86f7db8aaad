//! Canonical schema and source column mapping.
//!
//! Source files name their columns however they like (`Location`, `Age`,
//! `Patient`, ...). The rest of the pipeline only ever sees the fixed set of
//! [`CanonicalField`]s. [`ColumnMapping`] records which source header feeds
//! each canonical field and [`map_columns`] applies it, dropping everything
//! else.

use std::{fmt, str::FromStr};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{error::PipelineError, source::RawTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    Province,
    Age,
    Status,
    Nationality,
    PatientCode,
    AgeGroup,
}

impl CanonicalField {
    /// Fields that can be sourced from an input column. `AgeGroup` is always derived.
    pub const MAPPABLE: [CanonicalField; 5] = [
        CanonicalField::Province,
        CanonicalField::Age,
        CanonicalField::Status,
        CanonicalField::Nationality,
        CanonicalField::PatientCode,
    ];

    pub const ALL: [CanonicalField; 6] = [
        CanonicalField::Province,
        CanonicalField::Age,
        CanonicalField::Status,
        CanonicalField::Nationality,
        CanonicalField::PatientCode,
        CanonicalField::AgeGroup,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CanonicalField::Province => "province",
            CanonicalField::Age => "age",
            CanonicalField::Status => "status",
            CanonicalField::Nationality => "nationality",
            CanonicalField::PatientCode => "patient_code",
            CanonicalField::AgeGroup => "age_group",
        }
    }

    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(|field| field.as_str()).collect()
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CanonicalField {
    type Err = PipelineError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        CanonicalField::ALL
            .into_iter()
            .find(|field| field.as_str() == normalized)
            .ok_or_else(|| PipelineError::UnknownField(value.trim().to_string()))
    }
}

/// Canonical field → source header. `None` means the source has no such column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnMapping {
    pub province: Option<String>,
    pub age: Option<String>,
    pub status: Option<String>,
    pub nationality: Option<String>,
    pub patient_code: Option<String>,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            province: Some("Location".to_string()),
            age: Some("Age".to_string()),
            status: Some("Status".to_string()),
            nationality: Some("Nationality".to_string()),
            patient_code: Some("Patient".to_string()),
        }
    }
}

impl ColumnMapping {
    pub fn source_for(&self, field: CanonicalField) -> Option<&str> {
        let source = match field {
            CanonicalField::Province => &self.province,
            CanonicalField::Age => &self.age,
            CanonicalField::Status => &self.status,
            CanonicalField::Nationality => &self.nationality,
            CanonicalField::PatientCode => &self.patient_code,
            CanonicalField::AgeGroup => return None,
        };
        source.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    /// Finds the column feeding `field`: the configured source header first,
    /// then a header already carrying the canonical name.
    pub fn resolve(&self, field: CanonicalField, headers: &[String]) -> Option<usize> {
        self.source_for(field)
            .and_then(|source| headers.iter().position(|h| h == source))
            .or_else(|| headers.iter().position(|h| h == field.as_str()))
    }
}

/// Projects `raw` onto the canonical schema. Headers of the result are
/// canonical names in canonical order; cell contents are copied unchanged.
pub fn map_columns(raw: &RawTable, mapping: &ColumnMapping) -> RawTable {
    let resolved = CanonicalField::MAPPABLE
        .into_iter()
        .filter_map(|field| mapping.resolve(field, &raw.headers).map(|idx| (field, idx)))
        .collect::<Vec<_>>();

    for field in CanonicalField::MAPPABLE {
        if !resolved.iter().any(|(f, _)| *f == field) {
            debug!(
                "No source column for '{field}' (expected {:?}); field will be absent",
                mapping.source_for(field).unwrap_or("<unset>")
            );
        }
    }

    let headers = resolved
        .iter()
        .map(|(field, _)| field.as_str().to_string())
        .collect();
    let rows = raw
        .rows
        .iter()
        .map(|row| {
            resolved
                .iter()
                .map(|(_, idx)| row.get(*idx).cloned().unwrap_or_default())
                .collect()
        })
        .collect();
    RawTable { headers, rows }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(headers: &[&str], rows: &[&[&str]]) -> RawTable {
        RawTable {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .iter()
                .map(|row| row.iter().map(|c| c.to_string()).collect())
                .collect(),
        }
    }

    #[test]
    fn map_columns_renames_and_drops_unmapped() {
        let table = raw(
            &["Patient", "Extra", "Location", "Age"],
            &[&["BN1", "x", "Hanoi", "30"], &["BN2", "y", "Hue", ""]],
        );
        let mapped = map_columns(&table, &ColumnMapping::default());
        assert_eq!(mapped.headers, vec!["province", "age", "patient_code"]);
        assert_eq!(mapped.rows[0], vec!["Hanoi", "30", "BN1"]);
        assert_eq!(mapped.rows[1], vec!["Hue", "", "BN2"]);
    }

    #[test]
    fn map_columns_is_idempotent() {
        let table = raw(
            &["Location", "Status", "Nationality"],
            &[&["Hanoi", "Active", "Vietnam"]],
        );
        let mapping = ColumnMapping::default();
        let once = map_columns(&table, &mapping);
        let twice = map_columns(&once, &mapping);
        assert_eq!(once, twice);
    }

    #[test]
    fn unset_mapping_entries_are_skipped() {
        let table = raw(&["Location", "Age"], &[&["Hanoi", "30"]]);
        let mapping = ColumnMapping {
            age: None,
            ..ColumnMapping::default()
        };
        let mapped = map_columns(&table, &mapping);
        assert_eq!(mapped.headers, vec!["province"]);
    }

    #[test]
    fn canonical_field_parses_loose_spellings() {
        assert_eq!(
            "Patient-Code".parse::<CanonicalField>().unwrap(),
            CanonicalField::PatientCode
        );
        assert_eq!(
            " age group ".parse::<CanonicalField>().unwrap(),
            CanonicalField::AgeGroup
        );
        assert!("gender".parse::<CanonicalField>().is_err());
    }
}
