//! Point-to-zone lookup over the loaded partition.

use crate::{dataset, Result, ZoneError};
use geo::{Intersects, MultiPolygon, Point};
use std::path::Path;
use tracing::info;

/// One map sheet of the partition: its number and boundary polygon(s).
#[derive(Debug, Clone)]
pub struct ZoneTile {
    /// Kaartbladversnijding sheet number.
    pub id: u32,
    /// Sheet boundary in Lambert 72 coordinates.
    pub boundary: MultiPolygon<f64>,
}

/// The zone partition, loaded once and queried read-only afterwards.
///
/// The sheets tile the operating extent without overlap, so queries scan
/// them linearly; the sheet count is in the tens, which keeps lookups well
/// below any throughput concern. The index is immutable after construction
/// and safe to share across threads by reference.
#[derive(Debug)]
pub struct ZoneIndex {
    /// Tiles sorted by ascending id.
    tiles: Vec<ZoneTile>,
}

impl ZoneIndex {
    /// Build an index from tiles. Tiles are kept in ascending-id order so
    /// lookups are deterministic for points on shared boundaries.
    pub fn new(mut tiles: Vec<ZoneTile>) -> Self {
        tiles.sort_by_key(|tile| tile.id);
        Self { tiles }
    }

    /// Load the partition from a GeoJSON file.
    pub fn from_geojson_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let geojson = std::fs::read_to_string(path)?;
        Self::from_geojson_str(&geojson)
    }

    /// Load the partition from GeoJSON text.
    pub fn from_geojson_str(geojson: &str) -> Result<Self> {
        let tiles = dataset::parse(geojson)?;
        if tiles.is_empty() {
            return Err(ZoneError::InvalidDataset(
                "dataset contains no zones".to_string(),
            ));
        }
        let index = Self::new(tiles);
        info!(zones = index.len(), "zone partition loaded");
        Ok(index)
    }

    /// Find the zone containing a Lambert 72 coordinate.
    ///
    /// Containment is boundary-inclusive and tiles are scanned in ascending
    /// id order, so a point exactly on a shared sheet boundary resolves to
    /// the lowest adjacent sheet number.
    pub fn locate(&self, x: f64, y: f64) -> Result<u32> {
        let point = Point::new(x, y);
        self.tiles
            .iter()
            .find(|tile| tile.boundary.intersects(&point))
            .map(|tile| tile.id)
            .ok_or(ZoneError::OutOfBounds { x, y })
    }

    /// Number of zones in the partition.
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// Whether the partition is empty.
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// The loaded tiles, in ascending-id order.
    pub fn tiles(&self) -> &[ZoneTile] {
        &self.tiles
    }
}
