//! The per-address orchestrator: address to canopy height grid.

use std::thread;

use dhmv_raster::{
    LayerKind, RasterError, RasterGrid, TileRef, TileStore, DEFAULT_BASE_DIR, DEFAULT_RESOLUTION,
    DEFAULT_VERSION,
};
use dhmv_zones::{ZoneError, ZoneIndex};
use thiserror::Error;
use tracing::{debug, info};

use crate::{extract, CanopyError, CanopyGrid, FootprintProvider, ResolvedAddress};

/// A pipeline stage failure, carrying the stage and its source error.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The address position falls in no map sheet, or the partition could
    /// not be consulted.
    #[error("zone lookup failed")]
    Zone(#[from] ZoneError),

    /// A raster tile could not be made locally available.
    #[error("the {layer} tile for zone {zone} is not available")]
    Tile {
        zone: u32,
        layer: LayerKind,
        #[source]
        source: RasterError,
    },

    /// The footprint lookup for the address failed.
    #[error("footprint lookup for \"{address}\" failed")]
    Footprint {
        address: String,
        #[source]
        source: CanopyError,
    },

    /// The registry knows the address but holds no building polygons for it.
    #[error("no building footprint registered for \"{address}\"")]
    MissingFootprint { address: String },

    /// Masking a raster against the footprint failed.
    #[error("extracting the {layer} window failed")]
    Extraction {
        layer: LayerKind,
        #[source]
        source: CanopyError,
    },

    /// The surface and terrain windows could not be combined.
    #[error("combining the surface and terrain windows failed")]
    Combine(#[source] CanopyError),
}

/// Address-to-canopy orchestrator.
///
/// Holds the zone partition and the tile store, plus the raster generation
/// to request. The pipeline is read-only after construction and can be
/// shared by reference across threads.
///
/// # Examples
///
/// ```no_run
/// use dhmv_canopy::{CanopyPipeline, FootprintProvider, ResolvedAddress};
/// use dhmv_raster::TileStore;
/// use dhmv_zones::ZoneIndex;
///
/// # fn provider() -> Box<dyn FootprintProvider> { unimplemented!() }
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let zones = ZoneIndex::from_geojson_path("kaartbladen.geojson")?;
/// let store = TileStore::with_http_transport()?;
/// let pipeline = CanopyPipeline::new(zones, store);
///
/// let address = ResolvedAddress::new("Bist", "2", 2610, "Antwerpen", 150905.0, 206387.0);
/// let canopy = pipeline.canopy_for_address(&address, provider().as_ref())?;
/// println!("tallest point: {:?} m", canopy.max_height());
/// # Ok(())
/// # }
/// ```
pub struct CanopyPipeline {
    zones: ZoneIndex,
    store: TileStore,
    resolution: String,
    version: String,
    base_dir: std::path::PathBuf,
    allow_fetch: bool,
}

impl CanopyPipeline {
    /// Create a pipeline over a zone partition and tile store, requesting
    /// the default DHMV generation (version II, 1 m resolution) with
    /// fetching enabled.
    pub fn new(zones: ZoneIndex, store: TileStore) -> Self {
        Self {
            zones,
            store,
            resolution: DEFAULT_RESOLUTION.to_string(),
            version: DEFAULT_VERSION.to_string(),
            base_dir: DEFAULT_BASE_DIR.into(),
            allow_fetch: true,
        }
    }

    /// Request a different pixel resolution, e.g. `5m`.
    pub fn with_resolution(mut self, resolution: impl Into<String>) -> Self {
        self.resolution = resolution.into();
        self
    }

    /// Request a different DHMV release, e.g. `I`.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Store tiles under a different directory.
    pub fn with_base_dir(mut self, base_dir: impl Into<std::path::PathBuf>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    /// Refuse network fetches; tiles must already be on disk.
    pub fn offline(mut self) -> Self {
        self.allow_fetch = false;
        self
    }

    /// The zone partition this pipeline consults.
    pub fn zones(&self) -> &ZoneIndex {
        &self.zones
    }

    /// The tile reference for one layer at a position, without touching the
    /// store.
    pub fn tile_for(&self, x: f64, y: f64, kind: LayerKind) -> Result<TileRef, PipelineError> {
        let zone = self.zones.locate(x, y)?;
        Ok(TileRef::new(
            zone,
            kind,
            self.resolution.clone(),
            self.version.clone(),
            self.base_dir.clone(),
        ))
    }

    /// Compute the canopy height grid over the building at `address`.
    ///
    /// Resolves the map sheet for the address position, makes the terrain
    /// and surface tiles of that sheet locally available (fetched
    /// concurrently when both are missing), masks each against the building
    /// footprint, and subtracts terrain from surface. Every stage failure is
    /// reported as a distinct [`PipelineError`] variant; nothing is retried
    /// and no partial grid is ever returned.
    pub fn canopy_for_address(
        &self,
        address: &ResolvedAddress,
        provider: &dyn FootprintProvider,
    ) -> Result<CanopyGrid, PipelineError> {
        let (x, y) = address.position();
        let terrain_ref = self.tile_for(x, y, LayerKind::Terrain)?;
        let surface_ref = terrain_ref.complement();
        info!(%address, zone = terrain_ref.zone, "resolving canopy heights");

        let (terrain, surface) = self.open_pair(&terrain_ref, &surface_ref)?;

        let footprint = address
            .footprint(provider)
            .map_err(|source| PipelineError::Footprint {
                address: address.to_string(),
                source,
            })?;
        if footprint.is_empty() {
            return Err(PipelineError::MissingFootprint {
                address: address.to_string(),
            });
        }
        debug!(polygons = footprint.len(), "footprint loaded");

        let terrain_window =
            extract(&terrain, footprint).map_err(|source| PipelineError::Extraction {
                layer: LayerKind::Terrain,
                source,
            })?;
        let surface_window =
            extract(&surface, footprint).map_err(|source| PipelineError::Extraction {
                layer: LayerKind::Surface,
                source,
            })?;

        CanopyGrid::combine(&surface_window, &terrain_window).map_err(PipelineError::Combine)
    }

    /// Open both layers of a sheet, fetching concurrently when needed. The
    /// two tiles live at different local paths, so their fetches are fully
    /// independent.
    fn open_pair(
        &self,
        terrain: &TileRef,
        surface: &TileRef,
    ) -> Result<(RasterGrid, RasterGrid), PipelineError> {
        let (terrain_grid, surface_grid) = thread::scope(|scope| {
            let terrain_task = scope.spawn(|| self.store.open(terrain, self.allow_fetch));
            let surface_grid = self.store.open(surface, self.allow_fetch);
            let terrain_grid = match terrain_task.join() {
                Ok(result) => result,
                Err(panic) => std::panic::resume_unwind(panic),
            };
            (terrain_grid, surface_grid)
        });

        let terrain_grid = terrain_grid.map_err(|source| PipelineError::Tile {
            zone: terrain.zone,
            layer: terrain.kind,
            source,
        })?;
        let surface_grid = surface_grid.map_err(|source| PipelineError::Tile {
            zone: surface.zone,
            layer: surface.kind,
            source,
        })?;
        Ok((terrain_grid, surface_grid))
    }
}
