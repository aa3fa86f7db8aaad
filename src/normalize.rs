//! Per-field cleaning of a canonically mapped table.
//!
//! Each rule runs only when its field survived mapping; an absent field stays
//! absent. Empty cells are nulls for every field.

use std::borrow::Cow;

use log::debug;

use crate::{
    bins::{AgeBins, UNKNOWN_AGE_GROUP},
    record::{CaseRecord, CaseTable},
    schema::CanonicalField,
    source::RawTable,
};

/// Builds the canonical record set from the output of [`crate::schema::map_columns`].
pub fn normalize(mapped: &RawTable, bins: &AgeBins) -> CaseTable {
    let column = |field: CanonicalField| mapped.headers.iter().position(|h| h == field.as_str());
    let province = column(CanonicalField::Province);
    let age = column(CanonicalField::Age);
    let status = column(CanonicalField::Status);
    let nationality = column(CanonicalField::Nationality);
    let patient_code = column(CanonicalField::PatientCode);

    let mut fields = [
        (CanonicalField::Province, province),
        (CanonicalField::Age, age),
        (CanonicalField::Status, status),
        (CanonicalField::Nationality, nationality),
        (CanonicalField::PatientCode, patient_code),
    ]
    .into_iter()
    .filter_map(|(field, idx)| idx.map(|_| field))
    .collect::<Vec<_>>();
    fields.push(CanonicalField::AgeGroup);

    if age.is_none() {
        debug!("Age column absent; every record is labeled '{UNKNOWN_AGE_GROUP}'");
    }

    let cell = |row: &[String], idx: Option<usize>| -> Option<String> {
        let raw = row.get(idx?)?.trim();
        (!raw.is_empty()).then(|| raw.to_string())
    };

    let mut unparsed_ages = 0usize;
    let records = mapped
        .rows
        .iter()
        .map(|row| {
            let age_value = cell(row, age).and_then(|raw| {
                let parsed = parse_age(&raw);
                if parsed.is_none() {
                    unparsed_ages += 1;
                }
                parsed
            });
            let age_group = match age {
                Some(_) => age_value
                    .and_then(|value| bins.label_for(value))
                    .map(str::to_string),
                None => Some(UNKNOWN_AGE_GROUP.to_string()),
            };
            CaseRecord {
                province: cell(row, province).map(|v| title_case(&v).into_owned()),
                age: age_value,
                status: cell(row, status).map(|v| v.to_lowercase()),
                nationality: cell(row, nationality).map(|v| title_case(&v).into_owned()),
                patient_code: patient_code
                    .and_then(|idx| row.get(idx))
                    .filter(|v| !v.trim().is_empty())
                    .cloned(),
                age_group,
            }
        })
        .collect::<Vec<_>>();

    if unparsed_ages > 0 {
        debug!("{unparsed_ages} age value(s) could not be parsed and were set to null");
    }
    CaseTable::new(fields, records)
}

/// Numeric age, or `None` for anything that does not parse to a finite number.
pub fn parse_age(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

/// Uppercases the first cased character of every word and lowercases the
/// rest. A word starts after any character that has no case, so digits,
/// spaces, hyphens, and apostrophes all begin a new word.
pub fn title_case(input: &str) -> Cow<'_, str> {
    let mut output = String::with_capacity(input.len());
    let mut previous_cased = false;
    for ch in input.chars() {
        let cased = ch.is_lowercase() || ch.is_uppercase();
        if cased {
            if previous_cased {
                output.extend(ch.to_lowercase());
            } else {
                output.extend(ch.to_uppercase());
            }
        } else {
            output.push(ch);
        }
        previous_cased = cased;
    }
    if output == input {
        Cow::Borrowed(input)
    } else {
        Cow::Owned(output)
    }
}
