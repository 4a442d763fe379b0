//! End-to-end summit history against file-backed catalogs.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use summit_locator::window::trim_search_area;
use summit_locator::{
    calculate_summit_history, completion_report, geo_utils, Activity, Classification,
    CoordinateSet, LocalFileSummitReference, MatchStrategy, PersistentLocalFileSummitReference,
    SummitError, SummitRecord, SummitReference, VisitConfig,
};
use tempfile::TempDir;

const CATALOG: &str = r#"[
    {"Number": 1, "Name": "S1", "Metres": 100, "Latitude": 0.0, "Longitude": 0.0, "W": 1},
    {"Number": 2, "Name": "S2", "Metres": 200, "Latitude": 1.0, "Longitude": 1.0, "W": 1, "M": 1},
    {"Number": 3, "Name": "S3", "Metres": 300, "Latitude": 5.0, "Longitude": 5.0, "M": 1}
]"#;

fn write_catalog(dir: &TempDir, contents: &str) -> PathBuf {
    let path = dir.path().join("summits.json");
    std::fs::write(&path, contents).unwrap();
    path
}

fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 10, 0, 0).unwrap()
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn activity(id: u64, date: DateTime<Utc>, points: &[(f64, f64)]) -> Activity {
    let (lat, lng): (Vec<f64>, Vec<f64>) = points.iter().copied().unzip();
    let track = CoordinateSet::new(lat, lng).unwrap();
    let distance = geo_utils::polyline_length(&track.points().collect::<Vec<_>>());
    Activity::new(id, date, track, distance)
}

fn config() -> VisitConfig {
    VisitConfig {
        proximity_meters: 50.0,
        ..VisitConfig::default()
    }
}

fn numbers(records: &[SummitRecord]) -> Vec<u32> {
    records.iter().map(|r| r.number).collect()
}

fn history_for(path: &Path, activities: &[Activity]) -> summit_locator::VisitedSummitDataset {
    let store = PersistentLocalFileSummitReference::new(path);
    calculate_summit_history(activities, &store, &config()).unwrap()
}

#[test]
fn straight_track_visits_two_of_three() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_catalog(&dir, CATALOG);

    let dataset = history_for(&path, &[activity(1, at(2021, 6, 5), &[(0.0, 0.0), (1.0, 1.0)])]);

    assert_eq!(dataset.len(), 3);
    assert_eq!(dataset.get(1).unwrap().latest_visit, Some(day(2021, 6, 5)));
    assert_eq!(dataset.get(2).unwrap().latest_visit, Some(day(2021, 6, 5)));
    assert_eq!(dataset.get(3).unwrap().latest_visit, None);
}

#[test]
fn later_activity_sets_latest_visit() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_catalog(&dir, CATALOG);

    let activities = [
        activity(1, at(2018, 3, 3), &[(0.0, 0.0), (0.0, 0.01)]),
        activity(2, at(2022, 9, 9), &[(0.0, -0.01), (0.0, 0.0)]),
        activity(3, at(2020, 1, 1), &[(0.01, 0.0), (0.0, 0.0)]),
    ];
    let dataset = history_for(&path, &activities);

    assert_eq!(dataset.get(1).unwrap().latest_visit, Some(day(2022, 9, 9)));
    assert_eq!(dataset.visited_count(), 1);
}

#[test]
fn stateless_and_cached_stores_agree() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_catalog(&dir, CATALOG);
    let activities = [activity(1, at(2021, 6, 5), &[(0.0, 0.0), (1.0, 1.0)])];

    let stateless = LocalFileSummitReference::new(&path);
    let cached = PersistentLocalFileSummitReference::new(&path);
    for strategy in [MatchStrategy::BruteForce, MatchStrategy::SpatialIndex] {
        let config = VisitConfig {
            strategy,
            ..config()
        };
        assert_eq!(
            calculate_summit_history(&activities, &stateless, &config).unwrap(),
            calculate_summit_history(&activities, &cached, &config).unwrap()
        );
    }
}

#[test]
fn cached_store_ignores_later_file_changes() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_catalog(&dir, CATALOG);

    let stateless = LocalFileSummitReference::new(&path);
    let cached = PersistentLocalFileSummitReference::new(&path);
    assert!(!cached.is_loaded());
    assert_eq!(cached.load(None, None).unwrap().len(), 3);
    assert!(cached.is_loaded());

    write_catalog(&dir, r#"[{"Number": 9, "Name": "New", "Metres": 1, "Latitude": 0, "Longitude": 0}]"#);

    assert_eq!(numbers(&cached.load(None, None).unwrap()), vec![1, 2, 3]);
    assert_eq!(numbers(&stateless.load(None, None).unwrap()), vec![9]);

    // A fresh instance sees the new data.
    let fresh = PersistentLocalFileSummitReference::new(&path);
    assert_eq!(numbers(&fresh.load(None, None).unwrap()), vec![9]);
}

#[test]
fn cached_store_serves_windowed_queries() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_catalog(&dir, CATALOG);
    let cached = PersistentLocalFileSummitReference::new(&path);

    let near_origin = cached.load(Some((-0.5, 1.0)), Some((-0.5, 1.0))).unwrap();
    assert_eq!(numbers(&near_origin), vec![1, 2]);
    let east = cached.load(None, Some((4.0, 6.0))).unwrap();
    assert_eq!(numbers(&east), vec![3]);
}

#[test]
fn cached_store_can_be_shared_between_threads() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_catalog(&dir, CATALOG);
    let cached = PersistentLocalFileSummitReference::new(&path);

    let counts: Vec<usize> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| cached.load(None, None).unwrap().len()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert_eq!(counts, vec![3; 4]);
}

#[test]
fn window_without_margin_matches_full_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_catalog(&dir, CATALOG);
    let store = LocalFileSummitReference::new(&path);
    let track = CoordinateSet::new(vec![0.0, 0.2], vec![0.0, 0.2]).unwrap();

    assert_eq!(
        trim_search_area(&store, &track, None).unwrap(),
        store.load(None, None).unwrap()
    );
    assert_eq!(numbers(&trim_search_area(&store, &track, Some(0.1)).unwrap()), vec![1]);
}

#[test]
fn unreadable_catalog_fails_the_report() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.json");
    let store = PersistentLocalFileSummitReference::new(&missing);
    let activities = [activity(1, at(2021, 6, 5), &[(0.0, 0.0), (1.0, 1.0)])];

    let err = calculate_summit_history(&activities, &store, &config()).unwrap_err();
    assert!(matches!(err, SummitError::CatalogIo { .. }));

    let garbled = write_catalog(&dir, "{not json");
    let store = LocalFileSummitReference::new(&garbled);
    let err = calculate_summit_history(&[], &store, &config()).unwrap_err();
    assert!(matches!(err, SummitError::CatalogFormat { .. }));
}

#[test]
fn report_counts_classifications() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_catalog(&dir, CATALOG);

    let dataset = history_for(&path, &[activity(1, at(2021, 6, 5), &[(0.0, 0.0), (1.0, 1.0)])]);
    let report = completion_report(&dataset);

    let wainwrights = report
        .iter()
        .find(|p| p.classification == Classification::Wainwright)
        .unwrap();
    assert_eq!((wainwrights.visited, wainwrights.total), (2, 2));

    let munros = report
        .iter()
        .find(|p| p.classification == Classification::Munro)
        .unwrap();
    assert_eq!((munros.visited, munros.total), (1, 2));
}

#[test]
fn activity_from_summary_json_runs_through_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_catalog(
        &dir,
        r#"[{"Number": 1, "Name": "Start", "Metres": 10, "Latitude": 38.5, "Longitude": -120.2}]"#,
    );

    let activity = Activity::from_summary_json(serde_json::json!({
        "id": 77,
        "start_date": "2019-08-20T06:00:00Z",
        "distance": 500000.0,
        "moving_time": 1,
        "elapsed_time": 1,
        "map": {"summary_polyline": "_p~iF~ps|U_ulLnnqC_mqNvxq`@"}
    }))
    .unwrap();

    let dataset = history_for(&path, &[activity]);
    assert_eq!(dataset.get(1).unwrap().latest_visit, Some(day(2019, 8, 20)));
}
