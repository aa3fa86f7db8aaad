mod common;

use case_tally::{
    aggregate::{count_by, count_by_two},
    bins::AgeBins,
    config::PipelineConfig,
    filter::{self, ALL_SENTINEL, FieldFilter},
    normalize::normalize,
    pipeline::{InputOptions, load_cases, standardize},
    schema::{CanonicalField, ColumnMapping, map_columns},
    source::RawTable,
    view::recompute,
};
use common::{TestWorkspace, fixture_path};

fn raw(headers: &[&str], rows: &[&[&str]]) -> RawTable {
    RawTable {
        headers: headers.iter().map(|h| h.to_string()).collect(),
        rows: rows
            .iter()
            .map(|row| row.iter().map(|c| c.to_string()).collect())
            .collect(),
    }
}

fn fixture_cases() -> case_tally::record::CaseTable {
    let config = PipelineConfig::default();
    let options = InputOptions {
        input: Some(fixture_path("patients.csv")),
        use_cache: false,
        ..InputOptions::default()
    };
    load_cases(&config, &options).expect("load fixture").cases
}

#[test]
fn location_column_is_cleaned_and_counted() {
    let table = raw(
        &["Location", "Gender"],
        &[&["Hanoi", "f"], &["hanoi ", "m"], &["HA NOI", "f"]],
    );
    let cases = standardize(&table, &PipelineConfig::default());
    assert_eq!(
        cases.fields(),
        &[CanonicalField::Province, CanonicalField::AgeGroup]
    );
    let counts = count_by(&cases, CanonicalField::Province);
    assert_eq!(
        counts.rows,
        vec![("Hanoi".to_string(), 2), ("Ha Noi".to_string(), 1)]
    );
}

#[test]
fn ages_are_binned_with_nulls_preserved() {
    let table = raw(&["Age"], &[&["5"], &["15"], &[""], &["9.9"]]);
    let cases = standardize(&table, &PipelineConfig::default());
    let groups = cases
        .records()
        .iter()
        .map(|r| r.age_group.as_deref())
        .collect::<Vec<_>>();
    assert_eq!(groups, vec![Some("0-9"), Some("10-19"), None, Some("0-9")]);
    assert_eq!(
        count_by(&cases, CanonicalField::AgeGroup).rows,
        vec![("0-9".to_string(), 2), ("10-19".to_string(), 1)]
    );
}

#[test]
fn mapping_twice_matches_mapping_once() {
    let table = raw(
        &["Patient", "Location", "Age", "Extra"],
        &[&["BN1", "Hanoi", "30", "x"]],
    );
    let mapping = ColumnMapping::default();
    let once = map_columns(&table, &mapping);
    let twice = map_columns(&once, &mapping);
    assert_eq!(once, twice);
    assert_eq!(once.headers, vec!["province", "age", "patient_code"]);
}

#[test]
fn empty_source_yields_empty_tables() {
    let cases = normalize(&raw(&[], &[]), &AgeBins::default());
    assert!(cases.is_empty());
    let view = recompute(&cases, &[]);
    assert_eq!(view.kpis.total_records, 0);
    assert!(view.aggregates.by_province.is_empty());
    assert!(view.aggregates.status_by_age_group.is_empty());
}

#[test]
fn fixture_counts_sum_to_non_null_records() {
    let cases = fixture_cases();
    assert_eq!(cases.len(), 8);

    let provinces = count_by(&cases, CanonicalField::Province);
    assert_eq!(provinces.get("Hanoi"), Some(4));
    assert_eq!(provinces.get("Ho Chi Minh"), Some(2));
    assert_eq!(provinces.total(), 7);

    let status = count_by(&cases, CanonicalField::Status);
    assert_eq!(status.rows[0], ("recovered".to_string(), 4));
    assert_eq!(status.total(), 7);

    let nationality = count_by(&cases, CanonicalField::Nationality);
    assert_eq!(nationality.get("United Kingdom"), Some(1));
    assert_eq!(nationality.get("China"), Some(1));
}

#[test]
fn pivot_cells_sum_to_pairs_with_both_values() {
    let cases = fixture_cases();
    let pivot = count_by_two(&cases, CanonicalField::AgeGroup, CanonicalField::Status);
    let expected = cases
        .records()
        .iter()
        .filter(|r| r.age_group.is_some() && r.status.is_some())
        .count() as u64;
    assert_eq!(pivot.total(), expected);
    assert_eq!(pivot.cell("80+", "deceased"), Some(1));
    assert_eq!(pivot.cell("80+", "recovered"), Some(0));
    assert_eq!(pivot.columns, vec!["active", "deceased", "recovered"]);
}

#[test]
fn dashboard_view_tracks_filters() {
    let cases = fixture_cases();

    let all = recompute(&cases, &[FieldFilter::new(CanonicalField::Province, ALL_SENTINEL)]);
    assert_eq!(all.kpis.total_records, 8);
    assert_eq!(all.kpis.most_common_status, "recovered");
    assert_eq!(all.kpis.median_age, 31);

    let hanoi = recompute(&cases, &[FieldFilter::new(CanonicalField::Province, "Hanoi")]);
    assert_eq!(hanoi.kpis.total_records, 4);
    assert_eq!(hanoi.kpis.median_age, 29);
    assert_eq!(hanoi.aggregates.by_status.rows, vec![("recovered".to_string(), 4)]);

    assert_eq!(
        filter::choices(&cases, CanonicalField::Province),
        vec!["(All)", "Da Nang", "Hanoi", "Ho Chi Minh"]
    );
}

#[test]
fn short_rows_yield_null_fields() {
    let workspace = TestWorkspace::new();
    let source = workspace.write(
        "short.csv",
        "Location,Age,Status\nHanoi,30,active\nHue\n",
    );
    let options = InputOptions {
        input: Some(source),
        use_cache: false,
        ..InputOptions::default()
    };
    let cases = load_cases(&PipelineConfig::default(), &options)
        .expect("short rows load")
        .cases;
    assert_eq!(cases.len(), 2);
    let hue = &cases.records()[1];
    assert_eq!(hue.province.as_deref(), Some("Hue"));
    assert_eq!(hue.age, None);
    assert_eq!(hue.age_group, None);
    assert_eq!(hue.status, None);
    assert_eq!(count_by(&cases, CanonicalField::Status).total(), 1);
}

#[test]
fn missing_source_fails_before_processing() {
    let workspace = TestWorkspace::new();
    let config = workspace.config_for(&workspace.path().join("absent.csv"));
    let err = load_cases(&config, &InputOptions::default()).unwrap_err();
    assert!(format!("{err:#}").contains("Source CSV not found"));
    assert!(!workspace.path().join("out").exists());
}
