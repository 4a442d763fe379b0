//! # Summit Locator
//!
//! Determine which summits from a fixed catalog were visited by a set of GPS
//! activity tracks, and when each was most recently visited.
//!
//! This library provides:
//! - Track resampling so proximity checks cannot skip over a summit
//! - Bounding-box windowing of the catalog around each track
//! - Haversine nearest-neighbour matching (dense or R-tree backed)
//! - Aggregation of visits into one row per catalog summit
//!
//! ## Features
//!
//! - **`parallel`** - Collect visits for many activities in parallel with rayon
//! - **`ffi`** - Enable FFI bindings for mobile platforms (iOS/Android)
//! - **`full`** - Enable all features
//!
//! ## Quick Start
//!
//! ```rust
//! use summit_locator::{CoordinateSet, VisitConfig};
//! use summit_locator::nearest::nearest_neighbour_search;
//!
//! let track = CoordinateSet::new(vec![54.45, 54.46], vec![-3.21, -3.20]).unwrap();
//! let summits = CoordinateSet::new(vec![54.454], vec![-3.211]).unwrap();
//!
//! let matches = nearest_neighbour_search(&track, &summits, VisitConfig::default().strategy);
//! assert_eq!(matches.len(), 2);
//! assert_eq!(matches[0].index, 0);
//! ```

use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{Result, SummitError};

// Geographic utilities (haversine, bounds)
pub mod geo_utils;

// Track resampling
pub mod interpolate;
pub use interpolate::{interpolate_polyline, sample_count};

// Catalog windowing around a track
pub mod window;
pub use window::trim_search_area;

// Nearest-neighbour search between track points and summits
pub mod nearest;
pub use nearest::{nearest_neighbour_search, NearestMatch};

// Per-track visit detection
pub mod locator;
pub use locator::find_visited_summits;

// Summit reference catalog
pub mod store;
pub use store::{
    Classification, LocalFileSummitReference, PersistentLocalFileSummitReference,
    SummitRecord, SummitReference,
};

// Activity input values
pub mod activity;
pub use activity::Activity;

// Visit aggregation and the report pipeline
pub mod visits;
#[cfg(feature = "parallel")]
pub use visits::{calculate_summit_history_parallel, collect_visits_parallel};
pub use visits::{
    calculate_summit_history, collect_visits, VisitAggregator, VisitRecord, VisitedSummit,
    VisitedSummitDataset,
};

// Completion progress per classification
pub mod report;
pub use report::{completion_report, ClassificationProgress};

#[cfg(feature = "ffi")]
uniffi::setup_scaffolding!();

/// Initialize logging for Android (only used in FFI)
#[cfg(all(feature = "ffi", target_os = "android"))]
fn init_logging() {
    use android_logger::Config;
    use log::LevelFilter;

    android_logger::init_once(
        Config::default()
            .with_max_level(LevelFilter::Debug)
            .with_tag("SummitLocatorRust"),
    );
}

#[cfg(all(feature = "ffi", not(target_os = "android")))]
fn init_logging() {
    // No-op on non-Android platforms
}

// ============================================================================
// Core Types
// ============================================================================

/// A GPS coordinate with latitude and longitude.
///
/// # Example
/// ```
/// use summit_locator::GpsPoint;
/// let point = GpsPoint::new(54.4542, -3.2115); // Scafell Pike
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct GpsPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GpsPoint {
    /// Create a new GPS point.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Axis-aligned bounding box in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl Bounds {
    /// Grow the box by `margin` degrees on every side.
    pub fn expand(&self, margin: f64) -> Self {
        Self {
            min_lat: self.min_lat - margin,
            max_lat: self.max_lat + margin,
            min_lng: self.min_lng - margin,
            max_lng: self.max_lng + margin,
        }
    }

    /// Inclusive containment test.
    pub fn contains(&self, point: &GpsPoint) -> bool {
        point.latitude >= self.min_lat
            && point.latitude <= self.max_lat
            && point.longitude >= self.min_lng
            && point.longitude <= self.max_lng
    }

    /// Latitude range as an inclusive `(min, max)` window.
    pub fn latitude_window(&self) -> (f64, f64) {
        (self.min_lat, self.max_lat)
    }

    /// Longitude range as an inclusive `(min, max)` window.
    pub fn longitude_window(&self) -> (f64, f64) {
        (self.min_lng, self.max_lng)
    }
}

/// An ordered sequence of coordinates held as parallel latitude and
/// longitude vectors.
///
/// The two vectors always have equal length; construction fails otherwise.
/// There is no way to mutate a set once built.
///
/// # Example
/// ```
/// use summit_locator::CoordinateSet;
///
/// let coords = CoordinateSet::new(vec![54.45, 54.46], vec![-3.21, -3.20]).unwrap();
/// assert_eq!(coords.len(), 2);
/// assert_eq!(coords.index(1), Some((54.46, -3.20)));
///
/// assert!(CoordinateSet::new(vec![54.45], vec![]).is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CoordinateSet {
    latitude: Vec<f64>,
    longitude: Vec<f64>,
}

impl CoordinateSet {
    /// Build a set from parallel coordinate vectors.
    pub fn new(latitude: Vec<f64>, longitude: Vec<f64>) -> Result<Self> {
        if latitude.len() != longitude.len() {
            return Err(SummitError::CoordinateLengthMismatch {
                latitude: latitude.len(),
                longitude: longitude.len(),
            });
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// A set with no coordinates.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a set from GPS points. Cannot fail.
    pub fn from_points(points: &[GpsPoint]) -> Self {
        let (latitude, longitude) = points.iter().map(|p| (p.latitude, p.longitude)).unzip();
        Self {
            latitude,
            longitude,
        }
    }

    /// Number of coordinates.
    pub fn len(&self) -> usize {
        self.latitude.len()
    }

    pub fn is_empty(&self) -> bool {
        self.latitude.is_empty()
    }

    /// The `(latitude, longitude)` pair at `index`.
    pub fn index(&self, index: usize) -> Option<(f64, f64)> {
        Some((*self.latitude.get(index)?, *self.longitude.get(index)?))
    }

    /// The coordinate at `index` as a [`GpsPoint`].
    pub fn point(&self, index: usize) -> Option<GpsPoint> {
        self.index(index).map(|(lat, lng)| GpsPoint::new(lat, lng))
    }

    pub fn latitude(&self) -> &[f64] {
        &self.latitude
    }

    pub fn longitude(&self) -> &[f64] {
        &self.longitude
    }

    /// Iterate over the coordinates in order.
    pub fn points(&self) -> impl Iterator<Item = GpsPoint> + '_ {
        self.latitude
            .iter()
            .zip(&self.longitude)
            .map(|(&lat, &lng)| GpsPoint::new(lat, lng))
    }

    /// Bounding box of the set, or `None` when empty.
    pub fn bounds(&self) -> Option<Bounds> {
        if self.is_empty() {
            return None;
        }
        Some(geo_utils::compute_bounds(self.points()))
    }
}

impl<'de> Deserialize<'de> for CoordinateSet {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            latitude: Vec<f64>,
            longitude: Vec<f64>,
        }

        let raw = Raw::deserialize(deserializer)?;
        CoordinateSet::new(raw.latitude, raw.longitude).map_err(serde::de::Error::custom)
    }
}

/// How nearest summits are located for each track point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Enum))]
pub enum MatchStrategy {
    /// Compare every track point with every candidate.
    #[default]
    BruteForce,
    /// Query an R-tree built over the candidates. Same results as
    /// `BruteForce`, faster for large candidate sets.
    SpatialIndex,
}

/// Configuration for visit detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct VisitConfig {
    /// Maximum approach distance to a summit that counts as a visit.
    /// Default: 100.0 meters
    pub proximity_meters: f64,

    /// Resampled points per proximity radius of travel.
    /// Default: 2.0
    pub samples_per_threshold: f64,

    /// Margin in decimal degrees around a track's bounding box used to
    /// select candidate summits. `None` searches the whole catalog.
    /// Default: 0.1
    pub search_window_degrees: Option<f64>,

    /// Nearest-neighbour search strategy.
    /// Default: BruteForce
    pub strategy: MatchStrategy,
}

impl Default for VisitConfig {
    fn default() -> Self {
        Self {
            proximity_meters: 100.0,
            samples_per_threshold: 2.0,
            search_window_degrees: Some(0.1),
            strategy: MatchStrategy::BruteForce,
        }
    }
}

impl VisitConfig {
    /// Check that every value is usable.
    pub fn validate(&self) -> Result<()> {
        if !self.proximity_meters.is_finite() || self.proximity_meters <= 0.0 {
            return Err(SummitError::InvalidConfig {
                message: format!(
                    "proximity_meters must be positive, got {}",
                    self.proximity_meters
                ),
            });
        }
        if !self.samples_per_threshold.is_finite() || self.samples_per_threshold <= 0.0 {
            return Err(SummitError::InvalidConfig {
                message: format!(
                    "samples_per_threshold must be positive, got {}",
                    self.samples_per_threshold
                ),
            });
        }
        if let Some(margin) = self.search_window_degrees {
            if !margin.is_finite() || margin < 0.0 {
                return Err(SummitError::InvalidConfig {
                    message: format!("search_window_degrees must be non-negative, got {}", margin),
                });
            }
        }
        Ok(())
    }
}

// ============================================================================
// FFI Exports (only when feature enabled)
// ============================================================================

#[cfg(feature = "ffi")]
mod ffi {
    use super::*;
    use chrono::DateTime;
    use log::info;

    /// Activity as handed over by the mobile host.
    #[derive(Debug, Clone, uniffi::Record)]
    pub struct FfiActivity {
        pub id: u64,
        /// Unix timestamp (seconds since epoch)
        pub start_date: i64,
        /// Google encoded polyline (precision 5)
        pub summary_polyline: String,
        /// Distance in meters
        pub distance: f64,
        pub moving_time: u32,
        pub elapsed_time: u32,
    }

    /// One catalog summit with its latest visit.
    #[derive(Debug, Clone, uniffi::Record)]
    pub struct FfiVisitedSummit {
        pub number: u32,
        pub name: String,
        pub altitude: f64,
        pub latitude: f64,
        pub longitude: f64,
        /// Classification codes, e.g. "W", "M"
        pub classifications: Vec<String>,
        /// ISO date (YYYY-MM-DD), None if never visited
        pub latest_visit: Option<String>,
    }

    #[derive(Debug, Clone, uniffi::Record)]
    pub struct FfiClassificationProgress {
        pub code: String,
        pub name: String,
        pub visited: u32,
        pub total: u32,
    }

    #[derive(Debug, Clone, uniffi::Record)]
    pub struct FfiSummitReport {
        pub summits: Vec<FfiVisitedSummit>,
        pub progress: Vec<FfiClassificationProgress>,
    }

    fn to_activity(raw: FfiActivity) -> Result<Activity> {
        let start_date =
            DateTime::from_timestamp(raw.start_date, 0).ok_or_else(|| SummitError::InvalidActivity {
                message: format!("activity {} has out-of-range start date", raw.id),
            })?;
        Ok(Activity {
            id: raw.id,
            start_date,
            track: CoordinateSet::from_polyline(&raw.summary_polyline)?,
            distance: raw.distance,
            moving_time: raw.moving_time,
            elapsed_time: raw.elapsed_time,
        })
    }

    fn saturating_u32(count: usize) -> u32 {
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    /// Compute the full summit report for a set of activities.
    #[uniffi::export]
    pub fn ffi_summit_report(
        catalog_path: String,
        activities: Vec<FfiActivity>,
        config: VisitConfig,
    ) -> std::result::Result<FfiSummitReport, SummitError> {
        init_logging();
        info!(
            "[SummitLocatorRust] summit report requested for {} activities",
            activities.len()
        );

        let activities = activities
            .into_iter()
            .map(to_activity)
            .collect::<Result<Vec<_>>>()?;
        let store = PersistentLocalFileSummitReference::new(catalog_path);
        let dataset = calculate_summit_history_parallel(&activities, &store, &config)?;

        let progress = completion_report(&dataset)
            .into_iter()
            .map(|p| FfiClassificationProgress {
                code: p.classification.code().to_string(),
                name: p.name.to_string(),
                visited: saturating_u32(p.visited),
                total: saturating_u32(p.total),
            })
            .collect();

        let summits = dataset
            .into_rows()
            .into_iter()
            .map(|row| FfiVisitedSummit {
                number: row.summit.number,
                name: row.summit.name,
                altitude: row.summit.altitude,
                latitude: row.summit.latitude,
                longitude: row.summit.longitude,
                classifications: row
                    .summit
                    .classifications
                    .iter()
                    .map(|c| c.code().to_string())
                    .collect(),
                latest_visit: row.latest_visit.map(|d| d.to_string()),
            })
            .collect();

        Ok(FfiSummitReport { summits, progress })
    }

    /// Get default configuration.
    #[uniffi::export]
    pub fn default_visit_config() -> VisitConfig {
        init_logging();
        VisitConfig::default()
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_counts_saturate_at_u32_max() {
            assert_eq!(saturating_u32(42), 42);
            assert_eq!(saturating_u32(u32::MAX as usize), u32::MAX);
            #[cfg(target_pointer_width = "64")]
            assert_eq!(saturating_u32(u32::MAX as usize + 1), u32::MAX);
        }

        #[test]
        fn test_out_of_range_start_date_is_rejected() {
            let raw = FfiActivity {
                id: 3,
                start_date: i64::MAX,
                summary_polyline: String::new(),
                distance: 0.0,
                moving_time: 0,
                elapsed_time: 0,
            };
            assert!(matches!(
                to_activity(raw),
                Err(SummitError::InvalidActivity { .. })
            ));
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
