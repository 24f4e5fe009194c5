//! Single-band raster grids decoded from GeoTIFF files.

use crate::{RasterError, Result, LAMBERT72};
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::tags::Tag;
use tiff::ColorType;

/// Affine transform from pixel indices to planar coordinates.
///
/// North-up rasters only: `pixel_width` is positive, `pixel_height` is
/// negative, and `(origin_x, origin_y)` is the outer corner of pixel (0, 0),
/// i.e. the top-left corner of the raster.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform {
    /// X coordinate of the raster's top-left corner.
    pub origin_x: f64,
    /// Y coordinate of the raster's top-left corner.
    pub origin_y: f64,
    /// Width of one pixel in map units (positive).
    pub pixel_width: f64,
    /// Height of one pixel in map units (negative, rows run southward).
    pub pixel_height: f64,
}

impl GeoTransform {
    /// Planar coordinates of the center of pixel (row, col).
    pub fn pixel_center(&self, row: u32, col: u32) -> (f64, f64) {
        (
            self.origin_x + (col as f64 + 0.5) * self.pixel_width,
            self.origin_y + (row as f64 + 0.5) * self.pixel_height,
        )
    }

    /// Fractional column index of an x coordinate.
    pub fn col_of(&self, x: f64) -> f64 {
        (x - self.origin_x) / self.pixel_width
    }

    /// Fractional row index of a y coordinate.
    pub fn row_of(&self, y: f64) -> f64 {
        (y - self.origin_y) / self.pixel_height
    }

    /// Transform of a window whose pixel (0, 0) is this raster's pixel
    /// (`row0`, `col0`). Same pixel size, shifted origin.
    pub fn window(&self, row0: u32, col0: u32) -> GeoTransform {
        GeoTransform {
            origin_x: self.origin_x + col0 as f64 * self.pixel_width,
            origin_y: self.origin_y + row0 as f64 * self.pixel_height,
            pixel_width: self.pixel_width,
            pixel_height: self.pixel_height,
        }
    }
}

/// A single-band elevation raster held in memory.
///
/// Values are row-major, north to south, west to east, matching the GeoTIFF
/// layout of the DHMV products. The underlying file handle is released as
/// soon as decoding finishes.
#[derive(Debug)]
pub struct RasterGrid {
    /// Elevation data in row-major order.
    data: Vec<f32>,
    /// Width in pixels.
    width: u32,
    /// Height in pixels.
    height: u32,
    /// Pixel-to-coordinate transform.
    transform: GeoTransform,
    /// Reference system tag, e.g. `EPSG:31370`.
    crs: String,
    /// Declared no-data value, if the file carries one.
    no_data: Option<f32>,
}

impl RasterGrid {
    /// Load a raster from a georeferenced GeoTIFF file.
    ///
    /// The file must carry `ModelTiepoint` and `ModelPixelScale` tags; files
    /// without georeferencing are rejected with
    /// [`RasterError::InvalidRaster`]. DHMV rasters are projected in
    /// Lambert 72, so the grid is tagged [`LAMBERT72`].
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut decoder = Self::open_decoder(path.as_ref())?;
        let transform = Self::read_geotransform(&mut decoder)?;
        Self::decode(decoder, transform)
    }

    /// Load a raster from a GeoTIFF file with an explicit transform.
    ///
    /// Use this for files that lack georeferencing tags (e.g. synthetic test
    /// rasters).
    pub fn from_file_with_transform<P: AsRef<Path>>(
        path: P,
        transform: GeoTransform,
    ) -> Result<Self> {
        let decoder = Self::open_decoder(path.as_ref())?;
        Self::decode(decoder, transform)
    }

    /// Build a grid from raw parts. `data` must hold `width * height`
    /// row-major values.
    pub fn from_parts(
        data: Vec<f32>,
        width: u32,
        height: u32,
        transform: GeoTransform,
        crs: impl Into<String>,
        no_data: Option<f32>,
    ) -> Result<Self> {
        if data.len() != (width as usize) * (height as usize) {
            return Err(RasterError::InvalidRaster(format!(
                "data length {} does not match {}x{} grid",
                data.len(),
                width,
                height
            )));
        }
        Ok(Self {
            data,
            width,
            height,
            transform,
            crs: crs.into(),
            no_data,
        })
    }

    fn open_decoder(path: &Path) -> Result<Decoder<std::fs::File>> {
        let file = std::fs::File::open(path)?;
        let mut decoder = Decoder::new(file)?;

        // 1m tiles cover a full map sheet (tens of thousands of pixels per
        // side), well beyond the default decoder limits.
        let mut limits = Limits::default();
        limits.decoding_buffer_size = 4 * 1024 * 1024 * 1024;
        limits.intermediate_buffer_size = 4 * 1024 * 1024 * 1024;
        limits.ifd_value_size = 1024 * 1024 * 1024;
        Ok(decoder.with_limits(limits))
    }

    fn decode(mut decoder: Decoder<std::fs::File>, transform: GeoTransform) -> Result<Self> {
        let (width, height) = decoder.dimensions()?;

        match decoder.colortype()? {
            ColorType::Gray(_) => {}
            other => {
                return Err(RasterError::InvalidRaster(format!(
                    "expected a single-band raster, got {:?}",
                    other
                )))
            }
        }

        let no_data = Self::read_nodata_value(&mut decoder);
        let data = Self::decode_elevation_data(&mut decoder)?;

        if data.len() != (width as usize) * (height as usize) {
            return Err(RasterError::InvalidRaster(format!(
                "decoded {} samples for a {}x{} raster",
                data.len(),
                width,
                height
            )));
        }

        Ok(Self {
            data,
            width,
            height,
            transform,
            crs: LAMBERT72.to_string(),
            no_data,
        })
    }

    /// Read the geotransform from the GeoTIFF tie point and pixel scale.
    fn read_geotransform(decoder: &mut Decoder<std::fs::File>) -> Result<GeoTransform> {
        let tiepoint = decoder.get_tag_f64_vec(Tag::ModelTiepointTag);
        let scale = decoder.get_tag_f64_vec(Tag::ModelPixelScaleTag);

        if let (Ok(tiepoint), Ok(scale)) = (tiepoint, scale) {
            if tiepoint.len() >= 6 && scale.len() >= 2 {
                if !(scale[0] > 0.0 && scale[1] > 0.0) {
                    return Err(RasterError::InvalidRaster(format!(
                        "non-positive ModelPixelScale ({}, {})",
                        scale[0], scale[1]
                    )));
                }
                // Tiepoint format: [i, j, k, x, y, z] where (i, j) are pixel
                // coordinates and (x, y) planar coordinates.
                let origin_x = tiepoint[3] - tiepoint[0] * scale[0];
                let origin_y = tiepoint[4] + tiepoint[1] * scale[1];
                return Ok(GeoTransform {
                    origin_x,
                    origin_y,
                    pixel_width: scale[0],
                    pixel_height: -scale[1],
                });
            }
        }

        Err(RasterError::InvalidRaster(
            "missing ModelTiepoint/ModelPixelScale georeferencing tags".to_string(),
        ))
    }

    /// Decode elevation data to f32 regardless of the stored sample type.
    fn decode_elevation_data(decoder: &mut Decoder<std::fs::File>) -> Result<Vec<f32>> {
        let result = decoder.read_image()?;

        match result {
            DecodingResult::F32(data) => Ok(data),
            DecodingResult::F64(data) => Ok(data.into_iter().map(|v| v as f32).collect()),
            DecodingResult::I16(data) => Ok(data.into_iter().map(|v| v as f32).collect()),
            DecodingResult::I32(data) => Ok(data.into_iter().map(|v| v as f32).collect()),
            DecodingResult::U16(data) => Ok(data.into_iter().map(|v| v as f32).collect()),
            DecodingResult::U32(data) => Ok(data.into_iter().map(|v| v as f32).collect()),
            DecodingResult::U8(data) => Ok(data.into_iter().map(|v| v as f32).collect()),
            DecodingResult::I8(data) => Ok(data.into_iter().map(|v| v as f32).collect()),
            DecodingResult::U64(data) => Ok(data.into_iter().map(|v| v as f32).collect()),
            DecodingResult::I64(data) => Ok(data.into_iter().map(|v| v as f32).collect()),
        }
    }

    /// Read the no-data value from the GDAL_NODATA tag, if present.
    fn read_nodata_value(decoder: &mut Decoder<std::fs::File>) -> Option<f32> {
        decoder
            .get_tag_ascii_string(Tag::GdalNodata)
            .ok()
            .and_then(|s| s.trim().parse().ok())
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

    /// Pixel-to-coordinate transform.
    pub fn transform(&self) -> GeoTransform {
        self.transform
    }

    /// Reference system tag.
    pub fn crs(&self) -> &str {
        &self.crs
    }

    /// Declared no-data value, if any.
    pub fn no_data(&self) -> Option<f32> {
        self.no_data
    }

    /// Value at (row, col), or `None` when out of range.
    pub fn value(&self, row: u32, col: u32) -> Option<f32> {
        if row < self.height && col < self.width {
            Some(self.data[row as usize * self.width as usize + col as usize])
        } else {
            None
        }
    }

    /// Whether a value matches the declared no-data sentinel.
    pub fn is_no_data(&self, value: f32) -> bool {
        match self.no_data {
            Some(nodata) => (value - nodata).abs() < 1e-3,
            None => false,
        }
    }

    /// Planar extent of the raster as (min_x, min_y, max_x, max_y).
    pub fn extent(&self) -> (f64, f64, f64, f64) {
        let t = &self.transform;
        (
            t.origin_x,
            t.origin_y + self.height as f64 * t.pixel_height,
            t.origin_x + self.width as f64 * t.pixel_width,
            t.origin_y,
        )
    }
}
