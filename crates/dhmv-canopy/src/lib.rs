//! # dhmv-canopy
//!
//! Canopy height models for individual buildings in Flanders, computed from
//! the Digitaal Hoogtemodel Vlaanderen (DHMV) rasters.
//!
//! The canopy height at a pixel is the digital surface model (everything
//! laser pulses bounced off: roofs, trees) minus the digital terrain model
//! (the bare ground) at the same pixel. This crate restricts that
//! subtraction to a building footprint:
//!
//! - [`Footprint`]: one or more building polygons in Lambert 72.
//! - [`extract`] / [`MaskedGrid`]: crop a raster to a footprint and blank
//!   out everything outside it.
//! - [`CanopyGrid`]: the surface-minus-terrain result with summary
//!   statistics.
//! - [`ResolvedAddress`] / [`FootprintProvider`]: the address contract, a
//!   street address paired with its Lambert 72 position and a lazily
//!   fetched footprint.
//! - [`CanopyPipeline`]: the orchestrator from address to canopy grid.
//!
//! ## Example
//!
//! ```no_run
//! use dhmv_canopy::{CanopyPipeline, FootprintProvider, ResolvedAddress};
//! use dhmv_raster::TileStore;
//! use dhmv_zones::ZoneIndex;
//!
//! # fn registry() -> Box<dyn FootprintProvider> { unimplemented!() }
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let pipeline = CanopyPipeline::new(
//!     ZoneIndex::from_geojson_path("kaartbladen.geojson")?,
//!     TileStore::with_http_transport()?,
//! );
//!
//! let address = ResolvedAddress::new("Bist", "2", 2610, "Antwerpen", 150905.0, 206387.0);
//! let canopy = pipeline.canopy_for_address(&address, registry().as_ref())?;
//! println!("mean height over the roof: {:?} m", canopy.mean_height());
//! # Ok(())
//! # }
//! ```

mod address;
mod error;
mod footprint;
mod mask;
mod model;
mod pipeline;

pub use address::{FootprintProvider, ResolvedAddress};
pub use error::CanopyError;
pub use footprint::Footprint;
pub use mask::{extract, MaskedGrid};
pub use model::CanopyGrid;
pub use pipeline::{CanopyPipeline, PipelineError};

/// Result type for masking and combination operations.
pub type Result<T> = std::result::Result<T, CanopyError>;
