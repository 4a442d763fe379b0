//! Catalog windowing around a track.
//!
//! Matching cost grows with the number of candidate summits, so each track
//! only considers summits inside its bounding box grown by a margin in
//! decimal degrees. The margin is a planar approximation: it has to be wide
//! enough, relative to the proximity threshold, that summits near the edge of
//! the box are never cut off.

use log::debug;

use crate::store::{SummitRecord, SummitReference};
use crate::{Bounds, CoordinateSet, Result};

/// Load the candidate summits for `track` from `store`.
///
/// With `margin = None` the window is skipped and the whole catalog is
/// returned. An empty track has no extent, so with a margin it selects no
/// candidates.
pub fn trim_search_area<S>(
    store: &S,
    track: &CoordinateSet,
    margin: Option<f64>,
) -> Result<Vec<SummitRecord>>
where
    S: SummitReference + ?Sized,
{
    let Some(margin) = margin else {
        return store.load(None, None);
    };

    let Some(window) = search_window(track, margin) else {
        return Ok(Vec::new());
    };

    let candidates = store.load(
        Some(window.latitude_window()),
        Some(window.longitude_window()),
    )?;
    debug!(
        "trim_search_area: lat {:.4}..{:.4}, lng {:.4}..{:.4} -> {} candidates",
        window.min_lat,
        window.max_lat,
        window.min_lng,
        window.max_lng,
        candidates.len()
    );
    Ok(candidates)
}

/// The track's bounding box grown by `margin` degrees on each side.
pub fn search_window(track: &CoordinateSet, margin: f64) -> Option<Bounds> {
    track.bounds().map(|b| b.expand(margin))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::MemoryStore;
    use crate::GpsPoint;

    fn catalog() -> MemoryStore {
        MemoryStore::from_points(&[
            (1, 54.50, -3.10),  // inside the track box
            (2, 54.58, -3.10),  // inside box + margin
            (3, 55.50, -3.10),  // far north
            (4, 54.50, -1.00),  // far east
        ])
    }

    fn track() -> CoordinateSet {
        CoordinateSet::new(vec![54.40, 54.55], vec![-3.20, -3.00]).unwrap()
    }

    fn numbers(records: &[SummitRecord]) -> Vec<u32> {
        records.iter().map(|r| r.number).collect()
    }

    #[test]
    fn test_no_margin_returns_whole_catalog() {
        let store = catalog();
        let trimmed = trim_search_area(&store, &track(), None).unwrap();
        assert_eq!(trimmed, store.load(None, None).unwrap());
    }

    #[test]
    fn test_margin_keeps_inside_and_near() {
        let trimmed = trim_search_area(&catalog(), &track(), Some(0.1)).unwrap();
        assert_eq!(numbers(&trimmed), vec![1, 2]);
    }

    #[test]
    fn test_zero_margin_is_the_bounding_box() {
        let trimmed = trim_search_area(&catalog(), &track(), Some(0.0)).unwrap();
        assert_eq!(numbers(&trimmed), vec![1]);
    }

    #[test]
    fn test_empty_track_selects_nothing() {
        let trimmed = trim_search_area(&catalog(), &CoordinateSet::empty(), Some(0.1)).unwrap();
        assert!(trimmed.is_empty());
    }

    #[test]
    fn test_search_window() {
        let window = search_window(&track(), 0.5).unwrap();
        assert!(window.contains(&GpsPoint::new(54.0, -3.6)));
        assert!(!window.contains(&GpsPoint::new(53.8, -3.1)));
    }
}
