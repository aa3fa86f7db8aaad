//! Grouped case counts.
//!
//! [`count_by`] and [`count_by_two`] always return the full distribution.
//! Truncation and reordering for display ([`CountTable::head`],
//! [`CountTable::in_label_order`], [`PivotTable::with_row_order`]) produce new
//! tables and are applied by the presentation layer only.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;

use crate::{record::CaseTable, schema::CanonicalField};

pub const CASES_HEADER: &str = "cases";

/// Single-key counts, header `[key, "cases"]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountTable {
    pub key: String,
    pub rows: Vec<(String, u64)>,
}

impl CountTable {
    pub fn empty(key: CanonicalField) -> Self {
        Self {
            key: key.as_str().to_string(),
            rows: Vec::new(),
        }
    }

    pub fn headers(&self) -> Vec<String> {
        vec![self.key.clone(), CASES_HEADER.to_string()]
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn total(&self) -> u64 {
        self.rows.iter().map(|(_, count)| count).sum()
    }

    pub fn get(&self, value: &str) -> Option<u64> {
        self.rows
            .iter()
            .find(|(candidate, _)| candidate == value)
            .map(|(_, count)| *count)
    }

    /// First `n` rows; `n == 0` keeps everything.
    pub fn head(&self, n: usize) -> CountTable {
        let take = if n == 0 { self.rows.len() } else { n };
        CountTable {
            key: self.key.clone(),
            rows: self.rows.iter().take(take).cloned().collect(),
        }
    }

    /// Rows in `labels` order with zero counts for labels never observed,
    /// followed by any observed values not in `labels`.
    pub fn in_label_order(&self, labels: &[String]) -> CountTable {
        if self.is_empty() {
            return self.clone();
        }
        let mut rows = labels
            .iter()
            .map(|label| (label.clone(), self.get(label).unwrap_or(0)))
            .collect::<Vec<_>>();
        rows.extend(
            self.rows
                .iter()
                .filter(|(value, _)| !labels.contains(value))
                .cloned(),
        );
        CountTable {
            key: self.key.clone(),
            rows,
        }
    }

    pub fn to_string_rows(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|(value, count)| vec![value.clone(), count.to_string()])
            .collect()
    }
}

/// Two-key counts pivoted so `secondary` values become columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PivotTable {
    pub key: String,
    pub secondary: String,
    pub columns: Vec<String>,
    pub rows: Vec<(String, Vec<u64>)>,
}

impl PivotTable {
    pub fn empty(key: CanonicalField, secondary: CanonicalField) -> Self {
        Self {
            key: key.as_str().to_string(),
            secondary: secondary.as_str().to_string(),
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    pub fn headers(&self) -> Vec<String> {
        std::iter::once(self.key.clone())
            .chain(self.columns.iter().cloned())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn total(&self) -> u64 {
        self.rows
            .iter()
            .flat_map(|(_, cells)| cells.iter())
            .sum()
    }

    pub fn cell(&self, key: &str, secondary: &str) -> Option<u64> {
        let col = self.columns.iter().position(|c| c == secondary)?;
        self.rows
            .iter()
            .find(|(value, _)| value == key)
            .and_then(|(_, cells)| cells.get(col).copied())
    }

    /// Rows listed in `labels` first, in that order; remaining rows keep
    /// their current order.
    pub fn with_row_order(&self, labels: &[String]) -> PivotTable {
        let mut rows = labels
            .iter()
            .filter_map(|label| self.rows.iter().find(|(value, _)| value == label).cloned())
            .collect::<Vec<_>>();
        rows.extend(
            self.rows
                .iter()
                .filter(|(value, _)| !labels.contains(value))
                .cloned(),
        );
        PivotTable {
            rows,
            ..self.clone()
        }
    }

    pub fn to_string_rows(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|(value, cells)| {
                std::iter::once(value.clone())
                    .chain(cells.iter().map(u64::to_string))
                    .collect()
            })
            .collect()
    }
}

/// Counts records per value of `key`, most frequent first.
///
/// Null values are not counted. Ties keep the order in which values were
/// first seen. An absent field yields an empty table.
pub fn count_by(table: &CaseTable, key: CanonicalField) -> CountTable {
    if !table.has_field(key) {
        return CountTable::empty(key);
    }
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut rows: Vec<(String, u64)> = Vec::new();
    for record in table.records() {
        let Some(value) = record.value(key) else {
            continue;
        };
        match positions.get(&*value).copied() {
            Some(idx) => rows[idx].1 += 1,
            None => {
                positions.insert(value.to_string(), rows.len());
                rows.push((value.into_owned(), 1));
            }
        }
    }
    // stable: equal counts stay in first-seen order
    rows.sort_by(|a, b| b.1.cmp(&a.1));
    CountTable {
        key: key.as_str().to_string(),
        rows,
    }
}

/// Counts records per `(key, secondary)` pair, pivoted into a matrix with
/// rows and columns sorted by value. Pairs never observed are 0.
pub fn count_by_two(
    table: &CaseTable,
    key: CanonicalField,
    secondary: CanonicalField,
) -> PivotTable {
    if !table.has_field(key) || !table.has_field(secondary) {
        return PivotTable::empty(key, secondary);
    }
    let mut counts: BTreeMap<String, BTreeMap<String, u64>> = BTreeMap::new();
    let mut columns: BTreeSet<String> = BTreeSet::new();
    for record in table.records() {
        let (Some(row), Some(col)) = (record.value(key), record.value(secondary)) else {
            continue;
        };
        columns.insert(col.to_string());
        *counts
            .entry(row.into_owned())
            .or_default()
            .entry(col.into_owned())
            .or_insert(0) += 1;
    }
    let columns = columns.into_iter().collect::<Vec<_>>();
    let rows = counts
        .into_iter()
        .map(|(row, cells)| {
            let values = columns
                .iter()
                .map(|col| cells.get(col).copied().unwrap_or(0))
                .collect();
            (row, values)
        })
        .collect();
    PivotTable {
        key: key.as_str().to_string(),
        secondary: secondary.as_str().to_string(),
        columns,
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::CaseRecord;

    fn provinces(values: &[Option<&str>]) -> CaseTable {
        CaseTable::new(
            vec![CanonicalField::Province],
            values
                .iter()
                .map(|v| CaseRecord {
                    province: v.map(str::to_string),
                    ..CaseRecord::default()
                })
                .collect(),
        )
    }

    #[test]
    fn count_by_sorts_descending_with_first_seen_ties() {
        let table = provinces(&[
            Some("Hue"),
            Some("Hanoi"),
            Some("Da Nang"),
            Some("Hanoi"),
            Some("Da Nang"),
            None,
        ]);
        let counts = count_by(&table, CanonicalField::Province);
        assert_eq!(
            counts.rows,
            vec![
                ("Hanoi".to_string(), 2),
                ("Da Nang".to_string(), 2),
                ("Hue".to_string(), 1)
            ]
        );
        assert_eq!(counts.total(), 5);
    }

    #[test]
    fn count_by_absent_field_keeps_headers() {
        let counts = count_by(&provinces(&[Some("Hue")]), CanonicalField::Status);
        assert!(counts.is_empty());
        assert_eq!(counts.headers(), vec!["status", "cases"]);
    }

    #[test]
    fn head_truncates_without_touching_source() {
        let table = provinces(&[Some("A"), Some("B"), Some("B"), Some("C")]);
        let counts = count_by(&table, CanonicalField::Province);
        let top = counts.head(2);
        assert_eq!(top.rows.len(), 2);
        assert_eq!(counts.rows.len(), 3);
        assert_eq!(counts.head(0), counts);
    }

    #[test]
    fn in_label_order_zero_fills_and_appends_extras() {
        let counts = CountTable {
            key: "age_group".into(),
            rows: vec![("10-19".into(), 3), ("unknown".into(), 2), ("0-9".into(), 1)],
        };
        let labels = vec!["0-9".to_string(), "10-19".to_string(), "20-29".to_string()];
        let ordered = counts.in_label_order(&labels);
        assert_eq!(
            ordered.rows,
            vec![
                ("0-9".to_string(), 1),
                ("10-19".to_string(), 3),
                ("20-29".to_string(), 0),
                ("unknown".to_string(), 2)
            ]
        );
        assert_eq!(ordered.total(), counts.total());
    }

    #[test]
    fn pivot_fills_unobserved_pairs_with_zero() {
        let records = [
            ("0-9", "active"),
            ("0-9", "recovered"),
            ("10-19", "active"),
            ("10-19", "active"),
        ]
        .into_iter()
        .map(|(group, status)| CaseRecord {
            age_group: Some(group.into()),
            status: Some(status.into()),
            ..CaseRecord::default()
        })
        .collect();
        let table = CaseTable::new(
            vec![CanonicalField::Status, CanonicalField::AgeGroup],
            records,
        );
        let pivot = count_by_two(&table, CanonicalField::AgeGroup, CanonicalField::Status);
        assert_eq!(pivot.headers(), vec!["age_group", "active", "recovered"]);
        assert_eq!(pivot.cell("10-19", "recovered"), Some(0));
        assert_eq!(pivot.cell("10-19", "active"), Some(2));
        assert_eq!(pivot.total(), 4);
    }

    #[test]
    fn pivot_requires_both_fields() {
        let pivot = count_by_two(
            &provinces(&[Some("Hue")]),
            CanonicalField::AgeGroup,
            CanonicalField::Status,
        );
        assert!(pivot.is_empty());
        assert_eq!(pivot.headers(), vec!["age_group"]);
    }

    #[test]
    fn with_row_order_follows_labels_first() {
        let pivot = PivotTable {
            key: "age_group".into(),
            secondary: "status".into(),
            columns: vec!["active".into()],
            rows: vec![
                ("80+".into(), vec![1]),
                ("unknown".into(), vec![4]),
                ("0-9".into(), vec![2]),
            ],
        };
        let ordered = pivot.with_row_order(&["0-9".to_string(), "80+".to_string()]);
        let keys = ordered.rows.iter().map(|(k, _)| k.as_str()).collect::<Vec<_>>();
        assert_eq!(keys, vec!["0-9", "80+", "unknown"]);
    }
}
