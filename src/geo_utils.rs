//! # Geographic Utilities
//!
//! Core geographic computations shared by the matching pipeline.
//!
//! | Function | Description |
//! |----------|-------------|
//! | [`haversine_distance`] | Great-circle distance between two GPS points |
//! | [`haversine_radians`] | Same, for coordinates already in radians |
//! | [`planar_distance`] | Straight-line distance in degree space |
//! | [`compute_bounds`] | Bounding box of a set of points |
//! | [`meters_to_degrees`] | Convert meters to approximate degrees at a latitude |
//!
//! ## Haversine Formula
//!
//! Distances assume a spherical Earth with a fixed radius of 6371 km. The
//! fixed radius is part of the matching contract: proximity thresholds are
//! calibrated against it, so do not swap in an ellipsoidal or mean-radius
//! variant.
//!
//! Reference: [Haversine formula (Wikipedia)](https://en.wikipedia.org/wiki/Haversine_formula)

use geo::{Distance, Euclidean, Point};

use crate::{Bounds, GpsPoint};

/// Earth radius used by every distance in this crate.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

// =============================================================================
// Distance Functions
// =============================================================================

/// Great-circle distance in meters between two points given in degrees.
///
/// # Example
///
/// ```rust
/// use summit_locator::{GpsPoint, geo_utils};
///
/// let london = GpsPoint::new(51.5074, -0.1278);
/// let paris = GpsPoint::new(48.8566, 2.3522);
///
/// let distance = geo_utils::haversine_distance(&london, &paris);
/// assert!((distance - 343_500.0).abs() < 1000.0);
/// ```
#[inline]
pub fn haversine_distance(p1: &GpsPoint, p2: &GpsPoint) -> f64 {
    haversine_radians(
        p1.latitude.to_radians(),
        p1.longitude.to_radians(),
        p2.latitude.to_radians(),
        p2.longitude.to_radians(),
    )
}

/// Great-circle distance in meters between two points given in radians.
///
/// The nearest-neighbour search converts each coordinate once and calls this
/// in its inner loop.
#[inline]
pub fn haversine_radians(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let half_dlat = 0.5 * (lat2 - lat1);
    let half_dlon = 0.5 * (lon2 - lon1);
    let a = half_dlat.sin().powi(2) + lat1.cos() * lat2.cos() * half_dlon.sin().powi(2);
    2.0 * a.sqrt().clamp(0.0, 1.0).asin() * EARTH_RADIUS_METERS
}

/// Euclidean distance between two points treated as planar `(lat, lng)`
/// coordinates, in degrees.
///
/// Used to parameterise tracks by arc length during resampling; not a
/// physical distance.
#[inline]
pub fn planar_distance(p1: &GpsPoint, p2: &GpsPoint) -> f64 {
    Euclidean::distance(
        Point::new(p1.longitude, p1.latitude),
        Point::new(p2.longitude, p2.latitude),
    )
}

/// Total great-circle length of a track in meters.
pub fn polyline_length(points: &[GpsPoint]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }

    points
        .windows(2)
        .map(|w| haversine_distance(&w[0], &w[1]))
        .sum()
}

/// Convert meters to approximate degrees at a given latitude.
///
/// Uses the longitude scale at `latitude`, which is the larger of the two
/// degree sizes, so the result is a conservative bounding-box margin.
///
/// - At the equator, 1 degree ≈ 111,320 meters
/// - At the poles, longitude degrees become meaningless (clamped)
#[inline]
pub fn meters_to_degrees(meters: f64, latitude: f64) -> f64 {
    let lat_rad = latitude.to_radians();
    let meters_per_degree = 111_320.0 * lat_rad.cos().max(0.1);
    meters / meters_per_degree
}

// =============================================================================
// Bounding Box Functions
// =============================================================================

/// Compute the bounding box of a sequence of points.
///
/// For empty input, returns a bounds with MIN/MAX values that contain
/// nothing.
///
/// # Example
///
/// ```rust
/// use summit_locator::{GpsPoint, geo_utils};
///
/// let track = vec![
///     GpsPoint::new(51.5000, -0.1300),
///     GpsPoint::new(51.5100, -0.1200),
///     GpsPoint::new(51.5050, -0.1250),
/// ];
///
/// let bounds = geo_utils::compute_bounds(track);
/// assert_eq!(bounds.min_lat, 51.5000);
/// assert_eq!(bounds.max_lng, -0.1200);
/// ```
pub fn compute_bounds(points: impl IntoIterator<Item = GpsPoint>) -> Bounds {
    let mut min_lat = f64::MAX;
    let mut max_lat = f64::MIN;
    let mut min_lng = f64::MAX;
    let mut max_lng = f64::MIN;

    for p in points {
        min_lat = min_lat.min(p.latitude);
        max_lat = max_lat.max(p.latitude);
        min_lng = min_lng.min(p.longitude);
        max_lng = max_lng.max(p.longitude);
    }

    Bounds {
        min_lat,
        max_lat,
        min_lng,
        max_lng,
    }
}

/// Map a point onto the unit sphere.
///
/// Chord length between two such vectors grows monotonically with
/// great-circle distance, which lets a Euclidean R-tree answer haversine
/// nearest-neighbour queries.
#[inline]
pub fn to_unit_vector(lat_rad: f64, lon_rad: f64) -> [f64; 3] {
    let cos_lat = lat_rad.cos();
    [cos_lat * lon_rad.cos(), cos_lat * lon_rad.sin(), lat_rad.sin()]
}

// =============================================================================
// Unit Tests
// =============================================================================
