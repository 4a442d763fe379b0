//! Visit detection for a single track.

use log::{debug, warn};

use crate::geo_utils::meters_to_degrees;
use crate::nearest::{nearest_neighbour_search, visited_indices};
use crate::store::{summit_coordinates, SummitRecord, SummitReference};
use crate::window::trim_search_area;
use crate::{CoordinateSet, Result, VisitConfig};

/// Summits approached within `config.proximity_meters` by `track`.
///
/// `track` should already be resampled (see
/// [`interpolate_polyline`](crate::interpolate_polyline)); raw vertices can
/// step over a summit. Each summit appears at most once, in order of first
/// approach along the track. An empty track or an empty candidate window
/// gives an empty result.
pub fn find_visited_summits<S>(
    store: &S,
    track: &CoordinateSet,
    config: &VisitConfig,
) -> Result<Vec<SummitRecord>>
where
    S: SummitReference + ?Sized,
{
    if track.is_empty() {
        return Ok(Vec::new());
    }

    if let (Some(margin), Some(bounds)) = (config.search_window_degrees, track.bounds()) {
        let widest_lat = bounds.min_lat.abs().max(bounds.max_lat.abs());
        let needed = meters_to_degrees(config.proximity_meters, widest_lat);
        if margin < needed {
            warn!(
                "Search window margin {:.5} deg is narrower than the {:.0}m proximity ({:.5} deg); summits near the window edge may be missed",
                margin, config.proximity_meters, needed
            );
        }
    }

    let candidates = trim_search_area(store, track, config.search_window_degrees)?;
    if candidates.is_empty() {
        return Ok(Vec::new());
    }

    let candidate_coords = summit_coordinates(&candidates);
    let matches = nearest_neighbour_search(track, &candidate_coords, config.strategy);
    let visited = visited_indices(&matches, config.proximity_meters);

    debug!(
        "find_visited_summits: {} points vs {} candidates -> {} visited",
        track.len(),
        candidates.len(),
        visited.len()
    );

    Ok(visited.into_iter().map(|i| candidates[i].clone()).collect())
}
