//! Activity input values.
//!
//! An [`Activity`] is one recorded outing: its identifier, start time, GPS
//! track and recorded distance. Activities come from an external fetcher and
//! are read-only here. The recorded distance is trusted as-is and drives the
//! resampling density.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

use crate::{CoordinateSet, Result, SummitError};

/// Google encoded polyline precision used by activity summaries.
const POLYLINE_PRECISION: u32 = 5;

/// A recorded activity with its GPS track.
#[derive(Debug, Clone, PartialEq)]
pub struct Activity {
    pub id: u64,
    pub start_date: DateTime<Utc>,
    pub track: CoordinateSet,
    /// Distance in meters
    pub distance: f64,
    /// Moving time in seconds
    pub moving_time: u32,
    /// Elapsed time in seconds
    pub elapsed_time: u32,
}

impl Activity {
    /// Create an activity with no timing information.
    pub fn new(id: u64, start_date: DateTime<Utc>, track: CoordinateSet, distance: f64) -> Self {
        Self {
            id,
            start_date,
            track,
            distance,
            moving_time: 0,
            elapsed_time: 0,
        }
    }

    /// Calendar day (UTC) the activity started on.
    pub fn date(&self) -> NaiveDate {
        self.start_date.date_naive()
    }

    /// Build an activity from a summary document as returned by activity
    /// listing endpoints:
    ///
    /// ```json
    /// {"id": 1, "start_date": "2021-06-05T08:00:00Z", "distance": 12500.0,
    ///  "moving_time": 14400, "elapsed_time": 16000,
    ///  "map": {"summary_polyline": "_p~iF~ps|U_ulLnnqC"}}
    /// ```
    ///
    /// A missing or empty polyline gives an empty track.
    pub fn from_summary_json(value: serde_json::Value) -> Result<Self> {
        let summary: ActivitySummary =
            serde_json::from_value(value).map_err(|e| SummitError::InvalidActivity {
                message: e.to_string(),
            })?;
        Self::try_from(summary)
    }

    /// Same as [`Activity::from_summary_json`], from a JSON string.
    pub fn from_summary_str(json: &str) -> Result<Self> {
        let summary: ActivitySummary =
            serde_json::from_str(json).map_err(|e| SummitError::InvalidActivity {
                message: e.to_string(),
            })?;
        Self::try_from(summary)
    }
}

#[derive(Debug, Deserialize)]
struct ActivitySummary {
    id: u64,
    start_date: DateTime<Utc>,
    distance: f64,
    #[serde(default)]
    moving_time: u32,
    #[serde(default)]
    elapsed_time: u32,
    #[serde(default)]
    map: Option<MapSummary>,
}

#[derive(Debug, Deserialize)]
struct MapSummary {
    #[serde(default)]
    summary_polyline: Option<String>,
}

impl TryFrom<ActivitySummary> for Activity {
    type Error = SummitError;

    fn try_from(summary: ActivitySummary) -> Result<Self> {
        let encoded = summary
            .map
            .and_then(|m| m.summary_polyline)
            .unwrap_or_default();

        Ok(Self {
            id: summary.id,
            start_date: summary.start_date,
            track: CoordinateSet::from_polyline(&encoded)?,
            distance: summary.distance,
            moving_time: summary.moving_time,
            elapsed_time: summary.elapsed_time,
        })
    }
}

impl CoordinateSet {
    /// Decode a Google encoded polyline (precision 5).
    ///
    /// # Example
    /// ```
    /// use summit_locator::CoordinateSet;
    ///
    /// let coords = CoordinateSet::from_polyline("_p~iF~ps|U_ulLnnqC_mqNvxq`@").unwrap();
    /// assert_eq!(coords.len(), 3);
    /// let (lat, lng) = coords.index(0).unwrap();
    /// assert!((lat - 38.5).abs() < 1e-9 && (lng + 120.2).abs() < 1e-9);
    /// ```
    pub fn from_polyline(encoded: &str) -> Result<Self> {
        if encoded.is_empty() {
            return Ok(CoordinateSet::empty());
        }

        let line = polyline::decode_polyline(encoded, POLYLINE_PRECISION).map_err(|e| {
            SummitError::InvalidPolyline {
                message: e.to_string(),
            }
        })?;

        let (latitude, longitude) = line.coords().map(|c| (c.y, c.x)).unzip();
        CoordinateSet::new(latitude, longitude)
    }
}
