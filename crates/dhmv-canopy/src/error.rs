//! Error types for masking and height-model computation.

use thiserror::Error;

/// Errors that can occur when masking rasters or combining masked grids.
#[derive(Debug, Error)]
pub enum CanopyError {
    /// The footprint cannot be applied to the raster: it is empty, or its
    /// reference system differs from the raster's.
    #[error("Footprint incompatible with raster: {reason}")]
    ReferenceMismatch {
        /// What made the footprint unusable.
        reason: String,
    },

    /// The footprint does not overlap the raster extent at all.
    #[error("Footprint does not overlap the raster extent")]
    EmptyIntersection,

    /// The two masked grids do not share shape and placement.
    #[error("Masked grids are misaligned: {reason}")]
    ShapeMismatch {
        /// Which part of the alignment check failed.
        reason: String,
    },
}
