//! Unified error handling for the summit locator.
//!
//! Every fallible operation in the crate returns [`Result`]. Degenerate tracks
//! and empty search windows are normal outcomes and never surface here.

use std::path::PathBuf;

use thiserror::Error;

/// Unified error type for summit-locator operations.
#[derive(Debug, Error)]
#[cfg_attr(feature = "ffi", derive(uniffi::Error), uniffi(flat_error))]
pub enum SummitError {
    /// Latitude and longitude vectors differ in length
    #[error("coordinate length mismatch: {latitude} latitudes, {longitude} longitudes")]
    CoordinateLengthMismatch { latitude: usize, longitude: usize },

    /// A configuration value is out of range
    #[error("configuration error: {message}")]
    InvalidConfig { message: String },

    /// The summit catalog could not be read
    #[error("failed to read summit catalog {}: {source}", path.display())]
    CatalogIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The summit catalog was read but could not be parsed
    #[error("failed to parse summit catalog {}: {source}", path.display())]
    CatalogFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// An encoded polyline could not be decoded
    #[error("invalid polyline: {message}")]
    InvalidPolyline { message: String },

    /// An activity summary is missing fields or has malformed values
    #[error("invalid activity: {message}")]
    InvalidActivity { message: String },
}

/// Result type alias for summit-locator operations.
pub type Result<T> = std::result::Result<T, SummitError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SummitError::CoordinateLengthMismatch {
            latitude: 3,
            longitude: 2,
        };
        assert!(err.to_string().contains("3 latitudes"));
        assert!(err.to_string().contains("2 longitudes"));
    }

    #[test]
    fn test_catalog_io_keeps_source() {
        use std::error::Error as _;

        let err = SummitError::CatalogIo {
            path: PathBuf::from("/missing/catalog.json"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert!(err.to_string().contains("/missing/catalog.json"));
        assert!(err.source().is_some());
    }
}
