//! Compute a summit history for a couple of Lake District walks.
//!
//! Run with: cargo run --example summit_history

use chrono::{TimeZone, Utc};
use summit_locator::{
    calculate_summit_history, completion_report, geo_utils, Activity, CoordinateSet,
    PersistentLocalFileSummitReference, VisitConfig,
};

const CATALOG: &str = r#"[
    {"Number": 1, "Name": "Scafell Pike", "Metres": 978, "Latitude": 54.4542, "Longitude": -3.2115, "W": 1, "F": 1},
    {"Number": 2, "Name": "Scafell", "Metres": 964, "Latitude": 54.4481, "Longitude": -3.2252, "W": 1, "F": 1},
    {"Number": 3, "Name": "Great End", "Metres": 910, "Latitude": 54.4638, "Longitude": -3.1941, "W": 1},
    {"Number": 4, "Name": "Helvellyn", "Metres": 950, "Latitude": 54.5271, "Longitude": -3.0164, "W": 1, "F": 1},
    {"Number": 5, "Name": "Ben Nevis", "Metres": 1345, "Latitude": 56.7969, "Longitude": -5.0036, "F": 1, "M": 1}
]"#;

fn walk(id: u64, day: u32, points: &[(f64, f64)]) -> Activity {
    let (lat, lng): (Vec<f64>, Vec<f64>) = points.iter().copied().unzip();
    let track = CoordinateSet::new(lat, lng).expect("equal length coordinates");
    let distance = geo_utils::polyline_length(&track.points().collect::<Vec<_>>());
    let start = Utc.with_ymd_and_hms(2023, 6, day, 8, 0, 0).unwrap();
    Activity::new(id, start, track, distance)
}

fn main() {
    env_logger::init();

    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("summits.json");
    std::fs::write(&path, CATALOG).expect("write catalog");

    let activities = vec![
        // Great End -> Scafell Pike
        walk(1, 3, &[(54.4638, -3.1941), (54.4590, -3.2030), (54.4542, -3.2115)]),
        // Scafell Pike -> Scafell, a week later
        walk(2, 10, &[(54.4542, -3.2115), (54.4510, -3.2190), (54.4481, -3.2252)]),
    ];

    let store = PersistentLocalFileSummitReference::new(&path);
    let config = VisitConfig::default();
    let dataset = calculate_summit_history(&activities, &store, &config).expect("summit history");

    println!("Summit history\n");
    for row in dataset.rows() {
        match row.latest_visit {
            Some(date) => println!("  {:<14} {:>5}m  last visited {}", row.summit.name, row.summit.altitude, date),
            None => println!("  {:<14} {:>5}m  not yet visited", row.summit.name, row.summit.altitude),
        }
    }

    println!("\nCompletion");
    for progress in completion_report(&dataset) {
        if progress.total > 0 {
            println!("  {:<11} {}/{}", progress.name, progress.visited, progress.total);
        }
    }
}
