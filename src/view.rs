//! Dashboard core: everything an interactive front end needs after a filter
//! selection changes, computed in one explicit call.

use serde::Serialize;

use crate::{
    aggregate::{CountTable, PivotTable, count_by, count_by_two},
    filter::{FieldFilter, apply_filters},
    record::CaseTable,
    schema::CanonicalField,
};

/// Shown when no status can be reported.
pub const NO_STATUS: &str = "—";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kpis {
    pub total_records: usize,
    pub most_common_status: String,
    /// Whole-number median of the known ages; 0 when there are none.
    pub median_age: i64,
}

impl Kpis {
    pub fn from_tables(records: &CaseTable, by_status: &CountTable) -> Self {
        Self {
            total_records: records.len(),
            most_common_status: by_status
                .rows
                .first()
                .map(|(status, _)| status.clone())
                .unwrap_or_else(|| NO_STATUS.to_string()),
            median_age: records.median_age().unwrap_or(0),
        }
    }
}

/// Full (untruncated) aggregates for a filtered record set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateSet {
    pub by_province: CountTable,
    pub by_age_group: CountTable,
    pub by_status: CountTable,
    pub by_nationality: CountTable,
    pub status_by_age_group: PivotTable,
}

impl AggregateSet {
    pub fn compute(table: &CaseTable) -> Self {
        Self {
            by_province: count_by(table, CanonicalField::Province),
            by_age_group: count_by(table, CanonicalField::AgeGroup),
            by_status: count_by(table, CanonicalField::Status),
            by_nationality: count_by(table, CanonicalField::Nationality),
            status_by_age_group: count_by_two(
                table,
                CanonicalField::AgeGroup,
                CanonicalField::Status,
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub filters: Vec<FieldFilter>,
    pub kpis: Kpis,
    pub aggregates: AggregateSet,
    #[serde(skip)]
    pub records: CaseTable,
}

/// Applies `filters` and recomputes KPIs and aggregates. Call again whenever
/// the selection changes; nothing is cached between calls.
pub fn recompute(table: &CaseTable, filters: &[FieldFilter]) -> DashboardView {
    let records = apply_filters(table, filters);
    let aggregates = AggregateSet::compute(&records);
    let kpis = Kpis::from_tables(&records, &aggregates.by_status);
    DashboardView {
        filters: filters.to_vec(),
        kpis,
        aggregates,
        records,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::CaseRecord;

    fn record(province: &str, status: &str, age: Option<f64>) -> CaseRecord {
        CaseRecord {
            province: Some(province.into()),
            status: Some(status.into()),
            age,
            age_group: age.map(|_| "30-39".into()),
            ..CaseRecord::default()
        }
    }

    #[test]
    fn recompute_reflects_filter_selection() {
        let table = CaseTable::new(
            vec![
                CanonicalField::Province,
                CanonicalField::Age,
                CanonicalField::Status,
                CanonicalField::AgeGroup,
            ],
            vec![
                record("Hanoi", "active", Some(31.0)),
                record("Hanoi", "recovered", Some(35.0)),
                record("Hue", "recovered", None),
            ],
        );
        let all = recompute(&table, &[]);
        assert_eq!(all.kpis.total_records, 3);
        assert_eq!(all.kpis.most_common_status, "recovered");
        assert_eq!(all.kpis.median_age, 33);

        let hanoi = recompute(
            &table,
            &[FieldFilter::new(CanonicalField::Province, "Hanoi")],
        );
        assert_eq!(hanoi.kpis.total_records, 2);
        assert_eq!(hanoi.aggregates.by_province.rows, vec![("Hanoi".to_string(), 2)]);
        assert_eq!(hanoi.aggregates.status_by_age_group.total(), 2);
    }

    #[test]
    fn empty_selection_has_placeholder_kpis() {
        let table = CaseTable::new(vec![CanonicalField::Province], Vec::new());
        let view = recompute(&table, &[]);
        assert_eq!(view.kpis.total_records, 0);
        assert_eq!(view.kpis.most_common_status, NO_STATUS);
        assert_eq!(view.kpis.median_age, 0);
        assert_eq!(view.aggregates.by_status.headers(), vec!["status", "cases"]);
    }
}
