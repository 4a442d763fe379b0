//! Track resampling.
//!
//! Raw activity polylines are sparse: consecutive vertices can be hundreds of
//! meters apart, so a summit lying between two of them would never be within
//! the proximity threshold of any vertex. Resampling at a density tied to the
//! threshold closes that gap.
//!
//! The interpolation is piecewise-linear in `(lat, lng)` degree space,
//! parameterised by normalised cumulative planar arc length.

use log::{debug, warn};

use crate::geo_utils::planar_distance;
use crate::{CoordinateSet, GpsPoint, Result, SummitError, VisitConfig};

/// Number of resampled points for a track of `distance_meters`.
///
/// `floor(distance × samples_per_threshold / proximity)`. With the default
/// two samples per threshold radius, consecutive samples are at most half a
/// threshold apart on a track whose recorded distance matches its geometry.
/// NaN and non-positive results give 0; overflow saturates at `usize::MAX`.
///
/// # Example
/// ```
/// use summit_locator::sample_count;
///
/// assert_eq!(sample_count(1_000.0, 100.0, 2.0), 20);
/// assert_eq!(sample_count(49.0, 100.0, 2.0), 0);
/// ```
pub fn sample_count(distance_meters: f64, proximity_meters: f64, samples_per_threshold: f64) -> usize {
    let n = (distance_meters * samples_per_threshold / proximity_meters).floor();
    if n > 0.0 {
        n as usize
    } else {
        0
    }
}

/// Upper bound on the samples drawn for one activity.
///
/// A 1000 km activity at a 1 m threshold just fits; larger counts come
/// from corrupt recorded distances.
pub const MAX_RESAMPLED_POINTS: usize = 2_000_000;

/// Resample a track for visit detection using the counts from `config`.
///
/// Returns an empty set when the recorded distance is too short for a single
/// sample, or when the track has fewer than two distinct points. Fails with
/// [`SummitError::InvalidActivity`] when the recorded distance would need
/// more than [`MAX_RESAMPLED_POINTS`] samples.
pub fn resample_for_proximity(
    track: &CoordinateSet,
    distance_meters: f64,
    config: &VisitConfig,
) -> Result<CoordinateSet> {
    let count = sample_count(
        distance_meters,
        config.proximity_meters,
        config.samples_per_threshold,
    );
    if count > MAX_RESAMPLED_POINTS {
        return Err(SummitError::InvalidActivity {
            message: format!(
                "recorded distance {}m needs more than {} samples at {}m proximity",
                distance_meters, MAX_RESAMPLED_POINTS, config.proximity_meters
            ),
        });
    }
    if count == 0 {
        debug!(
            "resample_for_proximity: {:.0}m is too short to sample",
            distance_meters
        );
        return Ok(CoordinateSet::empty());
    }

    let resampled = interpolate_polyline(track, count);
    if resampled.is_empty() {
        warn!(
            "resample_for_proximity: track of {} points has fewer than two distinct points",
            track.len()
        );
    }
    Ok(resampled)
}

/// Resample `track` to exactly `count` points spread evenly by arc length.
///
/// Consecutive duplicate points are dropped first. When fewer than two
/// distinct points remain the result is empty: such a track cannot visit
/// anything and callers treat it as zero visits. Otherwise the first and last
/// samples coincide with the first and last retained points.
///
/// # Example
/// ```
/// use summit_locator::{interpolate_polyline, CoordinateSet};
///
/// let track = CoordinateSet::new(vec![0.0, 0.0, 1.0], vec![0.0, 0.0, 1.0]).unwrap();
/// let resampled = interpolate_polyline(&track, 5);
/// assert_eq!(resampled.len(), 5);
/// assert_eq!(resampled.index(0), Some((0.0, 0.0)));
/// assert_eq!(resampled.index(4), Some((1.0, 1.0)));
/// ```
pub fn interpolate_polyline(track: &CoordinateSet, count: usize) -> CoordinateSet {
    let points = dedup_consecutive(track);
    if points.len() < 2 {
        debug!(
            "interpolate_polyline: {} distinct points, nothing to resample",
            points.len()
        );
        return CoordinateSet::empty();
    }
    if count == 0 {
        return CoordinateSet::empty();
    }

    // Normalised cumulative arc length at each vertex; last entry is 1.0.
    let mut cumulative = Vec::with_capacity(points.len());
    cumulative.push(0.0);
    let mut total = 0.0;
    for w in points.windows(2) {
        total += planar_distance(&w[0], &w[1]);
        cumulative.push(total);
    }
    for c in cumulative.iter_mut() {
        *c /= total;
    }

    let last = points.len() - 1;
    let mut resampled = Vec::with_capacity(count);
    let mut segment = 0;

    for i in 0..count {
        let alpha = if count == 1 {
            0.0
        } else {
            i as f64 / (count - 1) as f64
        };

        if i + 1 == count && count > 1 {
            resampled.push(points[last]);
            continue;
        }

        while segment + 1 < last && cumulative[segment + 1] < alpha {
            segment += 1;
        }

        let start = cumulative[segment];
        let span = cumulative[segment + 1] - start;
        let ratio = if span > 0.0 {
            ((alpha - start) / span).clamp(0.0, 1.0)
        } else {
            0.0
        };

        let p1 = &points[segment];
        let p2 = &points[segment + 1];
        resampled.push(GpsPoint::new(
            p1.latitude + ratio * (p2.latitude - p1.latitude),
            p1.longitude + ratio * (p2.longitude - p1.longitude),
        ));
    }

    CoordinateSet::from_points(&resampled)
}

fn dedup_consecutive(track: &CoordinateSet) -> Vec<GpsPoint> {
    let mut points: Vec<GpsPoint> = track.points().collect();
    points.dedup();
    points
}
