//! Error types for the zone crate.

use thiserror::Error;

/// Errors that can occur when loading or querying the zone partition.
#[derive(Debug, Error)]
pub enum ZoneError {
    /// The partition dataset could not be read.
    #[error("Zone dataset unavailable: {0}")]
    DataUnavailable(#[from] std::io::Error),

    /// The partition dataset was read, but its content is not usable.
    #[error("Invalid zone dataset: {0}")]
    InvalidDataset(String),

    /// No zone covers the queried coordinate.
    #[error("Point ({x}, {y}) is not covered by any zone")]
    OutOfBounds {
        /// Queried x coordinate (Lambert 72).
        x: f64,
        /// Queried y coordinate (Lambert 72).
        y: f64,
    },
}
