//! # dhmv-zones
//!
//! Zone lookup for the Digitaal Hoogtemodel Vlaanderen.
//!
//! The DHMV rasters are cut along the Kaartbladversnijdingen, the fixed
//! map-sheet partition of Flanders: a few dozen non-overlapping sheets, each
//! identified by a small integer. Resolving which sheet covers a Lambert 72
//! coordinate is the first step of every height lookup, because the sheet
//! number selects the raster tile to fetch.
//!
//! The partition is loaded once from a static GeoJSON dataset and queried
//! read-only afterwards:
//!
//! ```no_run
//! use dhmv_zones::ZoneIndex;
//!
//! let zones = ZoneIndex::from_geojson_path("general_data/kaartbladen.geojson")?;
//! let zone = zones.locate(152183.0, 212063.0)?;
//! println!("covered by map sheet {zone}");
//! # Ok::<(), dhmv_zones::ZoneError>(())
//! ```

mod dataset;
mod error;
mod index;

pub use error::ZoneError;
pub use index::{ZoneIndex, ZoneTile};

/// Result type for zone operations.
pub type Result<T> = std::result::Result<T, ZoneError>;
