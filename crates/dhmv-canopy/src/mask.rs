//! Masked extraction: crop a raster to a footprint and blank out everything
//! outside it.

use crate::{CanopyError, Footprint, Result};
use dhmv_raster::{GeoTransform, RasterGrid};
use tracing::debug;

/// A raster window restricted to a footprint.
///
/// The grid is cropped to the footprint's bounding box intersected with the
/// source raster extent. Pixels whose center falls outside every footprint
/// polygon hold the NaN no-data sentinel, as do pixels that were no-data in
/// the source. The transform places pixel (0, 0) at the cropped window's
/// top-left corner in the source coordinate system.
#[derive(Debug, Clone)]
pub struct MaskedGrid {
    data: Vec<f32>,
    width: u32,
    height: u32,
    transform: GeoTransform,
    crs: String,
}

impl MaskedGrid {
    /// Build a masked grid from raw parts. `data` must hold
    /// `width * height` row-major values with NaN marking no-data.
    pub fn from_parts(
        data: Vec<f32>,
        width: u32,
        height: u32,
        transform: GeoTransform,
        crs: impl Into<String>,
    ) -> Option<Self> {
        if data.len() != (width as usize) * (height as usize) {
            return None;
        }
        Some(Self {
            data,
            width,
            height,
            transform,
            crs: crs.into(),
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

    /// Row-major values, NaN where masked.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Value at (row, col), or `None` when out of range.
    pub fn value(&self, row: u32, col: u32) -> Option<f32> {
        if row < self.height && col < self.width {
            Some(self.data[row as usize * self.width as usize + col as usize])
        } else {
            None
        }
    }

    /// Whether the pixel at (row, col) is masked out.
    pub fn is_masked(&self, row: u32, col: u32) -> bool {
        self.value(row, col).map_or(true, f32::is_nan)
    }

    /// Number of unmasked pixels.
    pub fn valid_count(&self) -> usize {
        self.data.iter().filter(|v| !v.is_nan()).count()
    }
}

/// Extract the footprint-masked window of a raster.
///
/// The footprint must be non-empty and in the raster's reference system
/// ([`CanopyError::ReferenceMismatch`] otherwise). A footprint entirely
/// outside the raster extent fails with [`CanopyError::EmptyIntersection`].
pub fn extract(grid: &RasterGrid, footprint: &Footprint) -> Result<MaskedGrid> {
    if footprint.is_empty() {
        return Err(CanopyError::ReferenceMismatch {
            reason: "footprint contains no polygons".to_string(),
        });
    }
    if footprint.crs() != grid.crs() {
        return Err(CanopyError::ReferenceMismatch {
            reason: format!(
                "footprint CRS {} does not match raster CRS {}",
                footprint.crs(),
                grid.crs()
            ),
        });
    }

    let rect = footprint
        .bounding_rect()
        .ok_or_else(|| CanopyError::ReferenceMismatch {
            reason: "footprint polygons have no extent".to_string(),
        })?;

    // Pixel window covering the footprint's bounding box, clamped to the
    // raster. Rows count from the top, so the window's first row comes from
    // the box's *maximum* y.
    let t = grid.transform();
    let width = grid.width() as i64;
    let height = grid.height() as i64;
    let col0 = (t.col_of(rect.min().x).floor() as i64).max(0);
    let col1 = (t.col_of(rect.max().x).ceil() as i64).min(width);
    let row0 = (t.row_of(rect.max().y).floor() as i64).max(0);
    let row1 = (t.row_of(rect.min().y).ceil() as i64).min(height);

    if col0 >= col1 || row0 >= row1 {
        return Err(CanopyError::EmptyIntersection);
    }

    let (row0, col0) = (row0 as u32, col0 as u32);
    let win_width = (col1 as u32) - col0;
    let win_height = (row1 as u32) - row0;
    let transform = t.window(row0, col0);

    let mut data = Vec::with_capacity(win_width as usize * win_height as usize);
    for row in 0..win_height {
        for col in 0..win_width {
            let value = grid
                .value(row0 + row, col0 + col)
                .unwrap_or(f32::NAN);
            let (x, y) = transform.pixel_center(row, col);
            if value.is_nan() || grid.is_no_data(value) || !footprint.contains_point(x, y) {
                data.push(f32::NAN);
            } else {
                data.push(value);
            }
        }
    }

    debug!(
        width = win_width,
        height = win_height,
        valid = data.iter().filter(|v| !v.is_nan()).count(),
        "masked raster window extracted"
    );

    Ok(MaskedGrid {
        data,
        width: win_width,
        height: win_height,
        transform,
        crs: grid.crs().to_string(),
    })
}
