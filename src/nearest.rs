//! Nearest-neighbour search between track points and candidate summits.
//!
//! For every track point the closest candidate is found under the haversine
//! metric. Two strategies share one contract:
//!
//! - [`MatchStrategy::BruteForce`] evaluates the full points × candidates
//!   distance matrix row by row. Windowing keeps the candidate count small,
//!   so this is the default.
//! - [`MatchStrategy::SpatialIndex`] bulk-loads the candidates into an R-tree
//!   of unit-sphere vectors and walks neighbours in chord order, which is the
//!   same order as great-circle distance.
//!
//! Both return the same index and distance for every point. Exact ties go to
//! the lowest candidate index.

use std::collections::HashSet;

use rstar::primitives::GeomWithData;
use rstar::RTree;

use crate::geo_utils::{haversine_radians, to_unit_vector};
use crate::{CoordinateSet, MatchStrategy};

/// Chord slack when collecting near-tied candidates from the R-tree.
/// About 6 µm on the ground, far above rounding error in the unit vectors.
const CHORD_TIE_SLACK: f64 = 1e-12;

/// Nearest candidate for one track point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearestMatch {
    /// Index into the candidate set
    pub index: usize,
    /// Haversine distance in meters
    pub distance: f64,
}

impl NearestMatch {
    const NONE: NearestMatch = NearestMatch {
        index: 0,
        distance: f64::INFINITY,
    };
}

/// Find, for each point of `coordinates`, the closest point of `references`.
///
/// Returns one [`NearestMatch`] per coordinate, in order. An empty reference
/// set yields an empty result. A track point with a non-finite coordinate
/// gets index 0 and an infinite distance, so it never qualifies as a visit;
/// non-finite references are never chosen as anyone's nearest.
pub fn nearest_neighbour_search(
    coordinates: &CoordinateSet,
    references: &CoordinateSet,
    strategy: MatchStrategy,
) -> Vec<NearestMatch> {
    if coordinates.is_empty() || references.is_empty() {
        return Vec::new();
    }

    let queries = RadianSet::from(coordinates);
    let refs = RadianSet::from(references);

    match strategy {
        MatchStrategy::BruteForce => queries
            .iter()
            .map(|(lat, lon)| brute_force_nearest(lat, lon, &refs))
            .collect(),
        MatchStrategy::SpatialIndex => {
            let index = UnitSphereIndex::new(&refs);
            queries
                .iter()
                .map(|(lat, lon)| index.nearest(lat, lon, &refs))
                .collect()
        }
    }
}

/// Candidate indices approached within `proximity_meters`, each listed once
/// in order of first approach.
pub fn visited_indices(matches: &[NearestMatch], proximity_meters: f64) -> Vec<usize> {
    let mut seen = HashSet::new();
    matches
        .iter()
        .filter(|m| m.distance <= proximity_meters)
        .filter_map(|m| seen.insert(m.index).then_some(m.index))
        .collect()
}

/// Coordinates converted to radians once, up front.
struct RadianSet {
    lat: Vec<f64>,
    lon: Vec<f64>,
}

impl From<&CoordinateSet> for RadianSet {
    fn from(coords: &CoordinateSet) -> Self {
        Self {
            lat: coords.latitude().iter().map(|v| v.to_radians()).collect(),
            lon: coords.longitude().iter().map(|v| v.to_radians()).collect(),
        }
    }
}

impl RadianSet {
    fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.lat.iter().copied().zip(self.lon.iter().copied())
    }

    fn distance_to(&self, index: usize, lat: f64, lon: f64) -> f64 {
        haversine_radians(self.lat[index], self.lon[index], lat, lon)
    }
}

fn brute_force_nearest(lat: f64, lon: f64, refs: &RadianSet) -> NearestMatch {
    let mut best = NearestMatch::NONE;
    for index in 0..refs.lat.len() {
        let distance = refs.distance_to(index, lat, lon);
        // Strict comparison keeps the first of equal minima.
        if distance < best.distance {
            best = NearestMatch { index, distance };
        }
    }
    best
}

type IndexedVector = GeomWithData<[f64; 3], usize>;

fn chord(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

/// R-tree over candidate positions on the unit sphere.
struct UnitSphereIndex {
    tree: RTree<IndexedVector>,
}

impl UnitSphereIndex {
    fn new(refs: &RadianSet) -> Self {
        let entries: Vec<IndexedVector> = refs
            .iter()
            .enumerate()
            .filter(|(_, (lat, lon))| lat.is_finite() && lon.is_finite())
            .map(|(i, (lat, lon))| GeomWithData::new(to_unit_vector(lat, lon), i))
            .collect();
        Self {
            tree: RTree::bulk_load(entries),
        }
    }

    fn nearest(&self, lat: f64, lon: f64, refs: &RadianSet) -> NearestMatch {
        if !lat.is_finite() || !lon.is_finite() {
            return NearestMatch::NONE;
        }

        let query = to_unit_vector(lat, lon);
        let mut neighbours = self.tree.nearest_neighbor_iter(&query);
        let Some(first) = neighbours.next() else {
            return NearestMatch::NONE;
        };
        let cutoff = chord(first.geom(), &query) + CHORD_TIE_SLACK;

        // Re-rank every candidate that could tie under haversine.
        let mut best = NearestMatch {
            index: first.data,
            distance: refs.distance_to(first.data, lat, lon),
        };
        for entry in neighbours {
            if chord(entry.geom(), &query) > cutoff {
                break;
            }
            let distance = refs.distance_to(entry.data, lat, lon);
            if distance < best.distance || (distance == best.distance && entry.data < best.index) {
                best = NearestMatch {
                    index: entry.data,
                    distance,
                };
            }
        }
        best
    }
}
