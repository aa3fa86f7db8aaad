use std::borrow::Cow;

use serde::Serialize;

use crate::schema::CanonicalField;

/// One standardized case. Every field is optional; which ones the source
/// could supply is tracked on the owning [`CaseTable`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CaseRecord {
    pub province: Option<String>,
    pub age: Option<f64>,
    pub status: Option<String>,
    pub nationality: Option<String>,
    pub patient_code: Option<String>,
    pub age_group: Option<String>,
}

impl CaseRecord {
    /// Value of `field` as grouping/filter text. `None` for null values.
    pub fn value(&self, field: CanonicalField) -> Option<Cow<'_, str>> {
        let text = match field {
            CanonicalField::Province => &self.province,
            CanonicalField::Status => &self.status,
            CanonicalField::Nationality => &self.nationality,
            CanonicalField::PatientCode => &self.patient_code,
            CanonicalField::AgeGroup => &self.age_group,
            CanonicalField::Age => return self.age.map(|age| Cow::Owned(format_number(age))),
        };
        text.as_deref().map(Cow::Borrowed)
    }
}

/// The canonical record set produced by one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CaseTable {
    fields: Vec<CanonicalField>,
    records: Vec<CaseRecord>,
}

impl CaseTable {
    /// `fields` is reordered into canonical order and deduplicated.
    pub fn new(mut fields: Vec<CanonicalField>, records: Vec<CaseRecord>) -> Self {
        fields.sort();
        fields.dedup();
        Self { fields, records }
    }

    pub fn fields(&self) -> &[CanonicalField] {
        &self.fields
    }

    pub fn has_field(&self, field: CanonicalField) -> bool {
        self.fields.contains(&field)
    }

    pub fn records(&self) -> &[CaseRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Same fields, subset of records.
    pub fn retain<F>(&self, mut keep: F) -> CaseTable
    where
        F: FnMut(&CaseRecord) -> bool,
    {
        CaseTable {
            fields: self.fields.clone(),
            records: self.records.iter().filter(|r| keep(r)).cloned().collect(),
        }
    }

    /// Median of the non-null ages, truncated to a whole number.
    pub fn median_age(&self) -> Option<i64> {
        if !self.has_field(CanonicalField::Age) {
            return None;
        }
        let mut ages = self
            .records
            .iter()
            .filter_map(|r| r.age)
            .collect::<Vec<_>>();
        if ages.is_empty() {
            return None;
        }
        ages.sort_by(f64::total_cmp);
        let mid = ages.len() / 2;
        let median = if ages.len() % 2 == 0 {
            (ages[mid - 1] + ages[mid]) / 2.0
        } else {
            ages[mid]
        };
        Some(median.trunc() as i64)
    }
}

pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}
