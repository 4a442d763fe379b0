//! # Summit Reference Catalog
//!
//! The catalog of summits is reached through the [`SummitReference`] trait:
//! a single `load` with optional inclusive latitude / longitude windows.
//!
//! Two file-backed implementations are provided:
//!
//! - [`LocalFileSummitReference`] re-reads the catalog file on every call.
//! - [`PersistentLocalFileSummitReference`] reads it once, on first use, and
//!   answers every later query from memory. It never notices later changes to
//!   the file; drop it and build a new one to pick them up.
//!
//! ## File format
//!
//! A JSON array of rows keyed by the catalog's column names:
//!
//! ```json
//! [
//!   {"Number": 1, "Name": "Scafell Pike", "Metres": 978.0,
//!    "Latitude": 54.4542, "Longitude": -3.2115, "W": 1, "F": 1, "M": 0}
//! ]
//! ```
//!
//! Classification columns (`W`, `F`, `D`, `G`, `C`, `M`) accept `0`/`1` or
//! booleans; a missing column means "not a member".

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use log::{info, warn};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::{CoordinateSet, GpsPoint, Result, SummitError};

/// Inclusive `(min, max)` range in decimal degrees.
pub type Window = (f64, f64);

/// Summit classification lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Classification {
    #[serde(rename = "W")]
    Wainwright,
    #[serde(rename = "F")]
    Furth,
    #[serde(rename = "D")]
    Donald,
    #[serde(rename = "G")]
    Graham,
    #[serde(rename = "C")]
    Corbett,
    #[serde(rename = "M")]
    Munro,
}

impl Classification {
    /// Every classification, in reporting order.
    pub const ALL: [Classification; 6] = [
        Classification::Wainwright,
        Classification::Furth,
        Classification::Donald,
        Classification::Graham,
        Classification::Corbett,
        Classification::Munro,
    ];

    /// Single-letter catalog column code.
    pub fn code(self) -> &'static str {
        match self {
            Classification::Wainwright => "W",
            Classification::Furth => "F",
            Classification::Donald => "D",
            Classification::Graham => "G",
            Classification::Corbett => "C",
            Classification::Munro => "M",
        }
    }

    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            Classification::Wainwright => "Wainwright",
            Classification::Furth => "Furth",
            Classification::Donald => "Donald",
            Classification::Graham => "Graham",
            Classification::Corbett => "Corbett",
            Classification::Munro => "Munro",
        }
    }
}

/// One summit from the catalog. `number` is unique within a catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "CatalogRow", into = "CatalogRow")]
pub struct SummitRecord {
    pub number: u32,
    pub name: String,
    /// Altitude in meters
    pub altitude: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub classifications: BTreeSet<Classification>,
}

impl SummitRecord {
    pub fn position(&self) -> GpsPoint {
        GpsPoint::new(self.latitude, self.longitude)
    }

    pub fn is_classified(&self, classification: Classification) -> bool {
        self.classifications.contains(&classification)
    }

    fn in_window(&self, latitude: Option<Window>, longitude: Option<Window>) -> bool {
        let inside = |value: f64, window: Option<Window>| {
            window.map_or(true, |(min, max)| value >= min && value <= max)
        };
        inside(self.latitude, latitude) && inside(self.longitude, longitude)
    }
}

/// Positions of `records` as a coordinate set, in record order.
pub fn summit_coordinates(records: &[SummitRecord]) -> CoordinateSet {
    let points: Vec<GpsPoint> = records.iter().map(SummitRecord::position).collect();
    CoordinateSet::from_points(&points)
}

/// Source of summit records.
///
/// `load` returns catalog rows in catalog order, keeping only rows whose
/// latitude and longitude fall inside the given inclusive windows. `None`
/// leaves that dimension unrestricted.
pub trait SummitReference {
    fn load(
        &self,
        latitude_window: Option<Window>,
        longitude_window: Option<Window>,
    ) -> Result<Vec<SummitRecord>>;
}

impl<T: SummitReference + ?Sized> SummitReference for &T {
    fn load(
        &self,
        latitude_window: Option<Window>,
        longitude_window: Option<Window>,
    ) -> Result<Vec<SummitRecord>> {
        (**self).load(latitude_window, longitude_window)
    }
}

/// Apply inclusive windows to a slice of records.
pub fn filter_window(
    records: &[SummitRecord],
    latitude_window: Option<Window>,
    longitude_window: Option<Window>,
) -> Vec<SummitRecord> {
    records
        .iter()
        .filter(|r| r.in_window(latitude_window, longitude_window))
        .cloned()
        .collect()
}

/// Catalog file read from disk on every `load`.
#[derive(Debug, Clone)]
pub struct LocalFileSummitReference {
    path: PathBuf,
}

impl LocalFileSummitReference {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SummitReference for LocalFileSummitReference {
    fn load(
        &self,
        latitude_window: Option<Window>,
        longitude_window: Option<Window>,
    ) -> Result<Vec<SummitRecord>> {
        let mut records = read_catalog(&self.path)?;
        records.retain(|r| r.in_window(latitude_window, longitude_window));
        Ok(records)
    }
}

/// Catalog file read once, on first `load`, then served from memory.
///
/// The in-memory copy sits behind a once-only initialisation guard, so an
/// instance can be shared between threads and concurrent first loads read
/// the file exactly once. A failed read leaves the cache empty and the next
/// `load` tries again.
#[derive(Debug)]
pub struct PersistentLocalFileSummitReference {
    path: PathBuf,
    cache: OnceCell<Vec<SummitRecord>>,
}

impl PersistentLocalFileSummitReference {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: OnceCell::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the catalog has been read into memory yet.
    pub fn is_loaded(&self) -> bool {
        self.cache.get().is_some()
    }

    fn records(&self) -> Result<&[SummitRecord]> {
        self.cache
            .get_or_try_init(|| read_catalog(&self.path))
            .map(Vec::as_slice)
    }
}

impl SummitReference for PersistentLocalFileSummitReference {
    fn load(
        &self,
        latitude_window: Option<Window>,
        longitude_window: Option<Window>,
    ) -> Result<Vec<SummitRecord>> {
        Ok(filter_window(
            self.records()?,
            latitude_window,
            longitude_window,
        ))
    }
}

/// Read and parse a catalog file.
pub fn read_catalog(path: &Path) -> Result<Vec<SummitRecord>> {
    info!("Loading summit catalog from {}", path.display());

    let bytes = std::fs::read(path).map_err(|source| SummitError::CatalogIo {
        path: path.to_path_buf(),
        source,
    })?;
    let records: Vec<SummitRecord> =
        serde_json::from_slice(&bytes).map_err(|source| SummitError::CatalogFormat {
            path: path.to_path_buf(),
            source,
        })?;

    let mut numbers = HashSet::with_capacity(records.len());
    for record in &records {
        if !numbers.insert(record.number) {
            warn!(
                "Summit catalog {} repeats summit number {}",
                path.display(),
                record.number
            );
        }
    }

    info!("Loaded {} summits", records.len());
    Ok(records)
}

// ============================================================================
// Catalog row layout
// ============================================================================

/// On-disk row: one 0/1 column per classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CatalogRow {
    #[serde(rename = "Number")]
    number: u32,
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Metres")]
    metres: f64,
    #[serde(rename = "Latitude")]
    latitude: f64,
    #[serde(rename = "Longitude")]
    longitude: f64,
    #[serde(rename = "W", default)]
    w: Flag,
    #[serde(rename = "F", default)]
    f: Flag,
    #[serde(rename = "D", default)]
    d: Flag,
    #[serde(rename = "G", default)]
    g: Flag,
    #[serde(rename = "C", default)]
    c: Flag,
    #[serde(rename = "M", default)]
    m: Flag,
}

/// Membership column value; catalogs use either 0/1 or true/false.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Int(i64),
    Float(f64),
}

impl Default for Flag {
    fn default() -> Self {
        Flag::Int(0)
    }
}

impl Flag {
    fn is_set(self) -> bool {
        match self {
            Flag::Bool(b) => b,
            Flag::Int(i) => i != 0,
            Flag::Float(f) => f != 0.0,
        }
    }
}

impl From<bool> for Flag {
    fn from(value: bool) -> Self {
        Flag::Int(value as i64)
    }
}

impl From<CatalogRow> for SummitRecord {
    fn from(row: CatalogRow) -> Self {
        let flags = [row.w, row.f, row.d, row.g, row.c, row.m];
        let classifications = Classification::ALL
            .into_iter()
            .zip(flags)
            .filter(|(_, flag)| flag.is_set())
            .map(|(c, _)| c)
            .collect();

        Self {
            number: row.number,
            name: row.name,
            altitude: row.metres,
            latitude: row.latitude,
            longitude: row.longitude,
            classifications,
        }
    }
}

impl From<SummitRecord> for CatalogRow {
    fn from(record: SummitRecord) -> Self {
        let flag = |c: Classification| Flag::from(record.classifications.contains(&c));
        Self {
            w: flag(Classification::Wainwright),
            f: flag(Classification::Furth),
            d: flag(Classification::Donald),
            g: flag(Classification::Graham),
            c: flag(Classification::Corbett),
            m: flag(Classification::Munro),
            number: record.number,
            name: record.name,
            metres: record.altitude,
            latitude: record.latitude,
            longitude: record.longitude,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-memory catalog that counts how often it is loaded.
    pub(crate) struct MemoryStore {
        records: Vec<SummitRecord>,
        loads: AtomicUsize,
    }

    impl MemoryStore {
        pub(crate) fn new(records: Vec<SummitRecord>) -> Self {
            Self {
                records,
                loads: AtomicUsize::new(0),
            }
        }

        pub(crate) fn from_points(points: &[(u32, f64, f64)]) -> Self {
            Self::new(
                points
                    .iter()
                    .map(|&(number, lat, lng)| summit(number, lat, lng, &[]))
                    .collect(),
            )
        }

        pub(crate) fn load_count(&self) -> usize {
            self.loads.load(Ordering::SeqCst)
        }
    }

    impl SummitReference for MemoryStore {
        fn load(
            &self,
            latitude_window: Option<Window>,
            longitude_window: Option<Window>,
        ) -> Result<Vec<SummitRecord>> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            Ok(filter_window(&self.records, latitude_window, longitude_window))
        }
    }

    pub(crate) fn summit(
        number: u32,
        latitude: f64,
        longitude: f64,
        classes: &[Classification],
    ) -> SummitRecord {
        SummitRecord {
            number,
            name: format!("Summit {}", number),
            altitude: 900.0,
            latitude,
            longitude,
            classifications: classes.iter().copied().collect(),
        }
    }

    #[test]
    fn test_parse_catalog_row() {
        let json = r#"[
            {"Number": 7, "Name": "Helvellyn", "Metres": 950.0,
             "Latitude": 54.527, "Longitude": -3.016, "W": 1, "F": 0, "M": true},
            {"Number": 8, "Name": "Skiddaw", "Metres": 931, "Latitude": 54.651, "Longitude": -3.148}
        ]"#;
        let records: Vec<SummitRecord> = serde_json::from_str(json).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].number, 7);
        assert!(records[0].is_classified(Classification::Wainwright));
        assert!(records[0].is_classified(Classification::Munro));
        assert!(!records[0].is_classified(Classification::Furth));
        assert_eq!(records[1].altitude, 931.0);
        assert!(records[1].classifications.is_empty());
    }

    #[test]
    fn test_catalog_row_serialize_is_readable() {
        let original = vec![summit(3, 54.0, -3.0, &[Classification::Graham])];
        let json = serde_json::to_string(&original).unwrap();
        assert!(json.contains("\"G\":1"));
        let parsed: Vec<SummitRecord> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn test_filter_window_is_inclusive() {
        let records = vec![
            summit(1, 54.0, -3.0, &[]),
            summit(2, 54.5, -3.0, &[]),
            summit(3, 55.0, -2.0, &[]),
        ];
        let kept = filter_window(&records, Some((54.0, 54.5)), None);
        assert_eq!(kept.len(), 2);
        let kept = filter_window(&records, None, Some((-2.0, -2.0)));
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].number, 3);
        assert_eq!(filter_window(&records, None, None), records);
    }

    #[test]
    fn test_classification_codes() {
        for c in Classification::ALL {
            let json = serde_json::to_string(&c).unwrap();
            assert_eq!(json, format!("\"{}\"", c.code()));
        }
        assert_eq!(Classification::Corbett.name(), "Corbett");
    }

    #[test]
    fn test_missing_file_is_catalog_io_error() {
        let store = LocalFileSummitReference::new("/definitely/not/here.json");
        assert!(matches!(
            store.load(None, None),
            Err(SummitError::CatalogIo { .. })
        ));

        let cached = PersistentLocalFileSummitReference::new("/definitely/not/here.json");
        assert!(cached.load(None, None).is_err());
        assert!(!cached.is_loaded());
    }

    #[test]
    fn test_summit_coordinates_keep_order() {
        let records = vec![summit(1, 54.0, -3.0, &[]), summit(2, 55.0, -4.0, &[])];
        let coords = summit_coordinates(&records);
        assert_eq!(coords.index(1), Some((55.0, -4.0)));
    }
}
