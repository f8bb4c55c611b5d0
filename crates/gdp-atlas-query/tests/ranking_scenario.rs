mod support;

use std::sync::Arc;

use gdp_atlas_model::{Metric, Year};
use gdp_atlas_query::{
    BackendPreference, BridgeConfig, Cell, GdpQueries, Normalizer, QueryEvent,
    RecordingEventSink, SortOrder,
};
use support::{store_with, FakeShell, SCENARIO_ROWS};

fn connect(dir: &std::path::Path) -> (GdpQueries, Arc<RecordingEventSink>) {
    let path = store_with(dir, SCENARIO_ROWS);
    let cfg = BridgeConfig {
        backend: BackendPreference::Native,
        ..BridgeConfig::for_store(path)
    };
    let sink = Arc::new(RecordingEventSink::new());
    let queries = GdpQueries::connect(&cfg, Arc::new(FakeShell::missing()), sink.clone())
        .map_err(|e| e.to_string())
        .expect("connect");
    (queries, sink)
}

#[test]
fn top_two_gdp_for_2020_is_us_then_cn() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (queries, _) = connect(dir.path());
    let table = queries
        .top_countries_by_metric(
            Metric::Gdp,
            Year::new(2020).expect("year"),
            2,
            SortOrder::Descending,
        )
        .expect("top two");
    let rows: Vec<(String, f64)> = table
        .records()
        .map(|r| {
            (
                r.text("country_code").expect("code").to_string(),
                r.f64("gdp").expect("gdp"),
            )
        })
        .collect();
    assert_eq!(
        rows,
        vec![("US".to_string(), 21000.0), ("CN".to_string(), 14000.0)]
    );
}

#[test]
fn asking_for_more_rows_than_exist_still_excludes_null_metric() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (queries, _) = connect(dir.path());
    let table = queries
        .top_countries_by_metric(
            Metric::Gdp,
            Year::new(2020).expect("year"),
            10,
            SortOrder::Ascending,
        )
        .expect("top ten");
    assert_eq!(table.row_count(), 2);
    assert_eq!(table.cell(0, "country_code"), Some(&Cell::Text("CN".into())));
}

#[test]
fn year_outside_stored_range_is_empty_not_failure() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (queries, sink) = connect(dir.path());
    sink.clear();
    let table = queries
        .data_by_year(Year::new(1960).expect("year"))
        .expect("zero rows");
    assert!(table.is_empty());
    assert!(sink.errors().is_empty());
}

#[test]
fn malformed_raw_text_is_empty_table_plus_one_error() {
    let sink = Arc::new(RecordingEventSink::new());
    let normalizer = Normalizer::new(sink.clone());
    let table = normalizer.to_table_or_empty("country_code,gdp\nUS,21000.0\nCN\n");
    assert!(table.is_empty());
    assert_eq!(table.column_count(), 0);
    let errors = sink.errors();
    assert_eq!(errors.len(), 1);
    assert!(matches!(errors[0], QueryEvent::NormalizeFailed { .. }));
}
