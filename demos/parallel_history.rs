//! Summit history over many synthetic activities, sequential vs parallel.
//!
//! Run with: cargo run --example parallel_history --features parallel

use std::time::Instant;

use chrono::{Duration, TimeZone, Utc};
use summit_locator::visits::calculate_summit_history_parallel;
use summit_locator::{
    calculate_summit_history, geo_utils, Activity, CoordinateSet, MatchStrategy,
    PersistentLocalFileSummitReference, SummitRecord, VisitConfig,
};

fn main() {
    env_logger::init();

    // 40 x 40 grid of summits, 0.01 degrees apart
    let catalog: Vec<SummitRecord> = (0..1600u32)
        .map(|n| SummitRecord {
            number: n,
            name: format!("Top {}", n),
            altitude: 600.0 + (n % 300) as f64,
            latitude: 56.0 + (n / 40) as f64 * 0.01,
            longitude: -5.0 + (n % 40) as f64 * 0.01,
            classifications: Default::default(),
        })
        .collect();

    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("grid.json");
    std::fs::write(&path, serde_json::to_vec(&catalog).expect("serialize")).expect("write");

    // Diagonal walks across the grid
    let base = Utc.with_ymd_and_hms(2020, 1, 1, 9, 0, 0).unwrap();
    let activities: Vec<Activity> = (0..200u64)
        .map(|i| {
            let offset = (i % 30) as f64 * 0.01;
            let lat = vec![56.0 + offset, 56.1 + offset];
            let lng = vec![-5.0, -4.9];
            let track = CoordinateSet::new(lat, lng).expect("coordinates");
            let distance = geo_utils::polyline_length(&track.points().collect::<Vec<_>>());
            Activity::new(i, base + Duration::days(i as i64), track, distance)
        })
        .collect();

    let store = PersistentLocalFileSummitReference::new(&path);

    for strategy in [MatchStrategy::BruteForce, MatchStrategy::SpatialIndex] {
        let config = VisitConfig {
            strategy,
            ..VisitConfig::default()
        };

        let start = Instant::now();
        let sequential = calculate_summit_history(&activities, &store, &config).expect("history");
        let sequential_time = start.elapsed();

        let start = Instant::now();
        let parallel = calculate_summit_history_parallel(&activities, &store, &config).expect("history");
        let parallel_time = start.elapsed();

        assert_eq!(sequential, parallel);
        println!(
            "{:?}: {} of {} summits visited (sequential {:?}, parallel {:?})",
            strategy,
            parallel.visited_count(),
            parallel.len(),
            sequential_time,
            parallel_time
        );
    }
}
