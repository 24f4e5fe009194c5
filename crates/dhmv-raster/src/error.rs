//! Error types for the raster crate.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when identifying, fetching, or reading raster tiles.
#[derive(Debug, Error)]
pub enum RasterError {
    /// I/O error reading or writing a file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TIFF decoding error.
    #[error("TIFF decode error: {0}")]
    TiffDecode(#[from] tiff::TiffError),

    /// The file decoded, but is not a usable single-band elevation raster.
    #[error("Invalid raster: {0}")]
    InvalidRaster(String),

    /// Layer kind string is neither DTM nor DSM.
    #[error("Unknown layer kind: {0} (expected DTM or DSM)")]
    InvalidLayerKind(String),

    /// File name does not follow the standardized DHMV format.
    #[error("File name ‘{0}’ does not comply with the standardized DHMV format")]
    InvalidFileName(String),

    /// The tile is not present locally and fetching was disallowed.
    #[error("Raster {path} is not downloaded (fetch disabled, available at {url})")]
    NotDownloaded {
        /// Expected local path of the raster file.
        path: PathBuf,
        /// Remote archive the caller could fetch instead.
        url: String,
    },

    /// Downloading or extracting the remote archive failed.
    #[error("Failed to fetch {url}: {reason}")]
    FetchFailed {
        /// Remote archive location.
        url: String,
        /// Reason for failure.
        reason: String,
    },

    /// HTTP client could not be constructed.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}
