//! Canopy height model: surface minus terrain over a shared footprint window.

use crate::{CanopyError, MaskedGrid, Result};
use dhmv_raster::GeoTransform;
use tracing::debug;

/// Height of everything above the bare ground, in meters, over a footprint
/// window.
///
/// Built by subtracting a terrain (DTM) window from the co-registered
/// surface (DSM) window. A pixel is NaN when it was masked in either input.
#[derive(Debug, Clone)]
pub struct CanopyGrid {
    heights: Vec<f32>,
    width: u32,
    height: u32,
    transform: GeoTransform,
    crs: String,
}

impl CanopyGrid {
    /// Subtract `terrain` from `surface` pixel by pixel.
    ///
    /// The two windows must agree exactly on dimensions, transform, and
    /// reference system ([`CanopyError::ShapeMismatch`] otherwise). Both
    /// come from [`extract`](crate::extract) over the same footprint, so any
    /// disagreement means the inputs were not co-registered.
    pub fn combine(surface: &MaskedGrid, terrain: &MaskedGrid) -> Result<Self> {
        if surface.dimensions() != terrain.dimensions() {
            return Err(CanopyError::ShapeMismatch {
                reason: format!(
                    "surface window is {:?} pixels but terrain window is {:?}",
                    surface.dimensions(),
                    terrain.dimensions()
                ),
            });
        }
        if surface.transform() != terrain.transform() {
            return Err(CanopyError::ShapeMismatch {
                reason: "surface and terrain windows are placed differently".to_string(),
            });
        }
        if surface.crs() != terrain.crs() {
            return Err(CanopyError::ShapeMismatch {
                reason: format!(
                    "surface CRS {} does not match terrain CRS {}",
                    surface.crs(),
                    terrain.crs()
                ),
            });
        }

        let heights: Vec<f32> = surface
            .data()
            .iter()
            .zip(terrain.data())
            .map(|(s, t)| s - t)
            .collect();

        let (width, height) = surface.dimensions();
        debug!(
            width,
            height,
            valid = heights.iter().filter(|v| !v.is_nan()).count(),
            "canopy heights combined"
        );

        Ok(Self {
            heights,
            width,
            height,
            transform: surface.transform(),
            crs: surface.crs().to_string(),
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// (width, height) in pixels.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Placement of the window in the source coordinate system.
    pub fn transform(&self) -> GeoTransform {
        self.transform
    }

    /// Reference system tag.
    pub fn crs(&self) -> &str {
        &self.crs
    }

    /// Row-major heights in meters, NaN where no value exists.
    pub fn heights(&self) -> &[f32] {
        &self.heights
    }

    /// Height at (row, col), or `None` when out of range.
    pub fn value(&self, row: u32, col: u32) -> Option<f32> {
        if row < self.height && col < self.width {
            Some(self.heights[row as usize * self.width as usize + col as usize])
        } else {
            None
        }
    }

    /// Number of pixels holding a height.
    pub fn valid_count(&self) -> usize {
        self.heights.iter().filter(|v| !v.is_nan()).count()
    }

    /// Tallest height over the footprint, or `None` when every pixel is NaN.
    pub fn max_height(&self) -> Option<f32> {
        self.heights
            .iter()
            .copied()
            .filter(|v| !v.is_nan())
            .fold(None, |acc, v| Some(acc.map_or(v, |m: f32| m.max(v))))
    }

    /// Mean height over the footprint, or `None` when every pixel is NaN.
    pub fn mean_height(&self) -> Option<f32> {
        let (sum, count) = self
            .heights
            .iter()
            .filter(|v| !v.is_nan())
            .fold((0.0_f64, 0usize), |(s, n), v| (s + f64::from(*v), n + 1));
        if count == 0 {
            None
        } else {
            Some((sum / count as f64) as f32)
        }
    }
}
