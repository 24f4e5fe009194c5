//! # dhmv-raster
//!
//! Raster tile access for the Digitaal Hoogtemodel Vlaanderen (DHMV), the
//! height-raster dataset covering Flanders.
//!
//! The DHMV is published as zipped GeoTIFF tiles, one per map-sheet zone and
//! layer (digital terrain model or digital surface model). This crate covers
//! three concerns:
//!
//! - **Identity** ([`TileRef`], [`LayerKind`]): deterministic file names,
//!   download URLs, and local paths derived purely from the tile fields.
//! - **Retrieval** ([`TileStore`], [`Transport`]): making the GeoTIFF for a
//!   tile available locally, downloading and unpacking the archive on
//!   demand. Concurrent requests for the same tile are coordinated so each
//!   archive is fetched at most once.
//! - **Access** ([`RasterGrid`], [`GeoTransform`]): decoding a single-band
//!   elevation raster with its affine pixel-to-coordinate transform.
//!
//! ## Example
//!
//! ```no_run
//! use dhmv_raster::{LayerKind, TileRef, TileStore};
//!
//! let store = TileStore::with_http_transport()?;
//! let tile = TileRef::with_defaults(15, LayerKind::Surface);
//!
//! // Downloads and extracts the archive on first use, no-op afterwards.
//! let grid = store.open(&tile, true)?;
//! println!("{}x{} pixels", grid.width(), grid.height());
//! # Ok::<(), dhmv_raster::RasterError>(())
//! ```

mod error;
mod grid;
mod layer;
mod store;
mod tileref;

pub use error::RasterError;
pub use grid::{GeoTransform, RasterGrid};
pub use layer::LayerKind;
pub use store::{HttpTransport, TileStore, Transport};
pub use tileref::{TileRef, DEFAULT_BASE_DIR, DEFAULT_RESOLUTION, DEFAULT_VERSION};

/// Reference system of all DHMV products: Belgian Lambert 72.
pub const LAMBERT72: &str = "EPSG:31370";

/// Result type for raster operations.
pub type Result<T> = std::result::Result<T, RasterError>;
