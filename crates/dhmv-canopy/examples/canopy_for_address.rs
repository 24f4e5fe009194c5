//! Compute the canopy height over a building and print summary statistics.
//!
//! ```text
//! cargo run --example canopy_for_address -- kaartbladen.geojson 152800 212000
//! ```
//!
//! Downloads the DTM and DSM tiles for the map sheet containing the given
//! Lambert 72 coordinate into `./tiff_data` on first run (several hundred
//! megabytes each at 1 m resolution).

use dhmv_canopy::{CanopyError, CanopyPipeline, Footprint, FootprintProvider, ResolvedAddress};
use dhmv_raster::TileStore;
use dhmv_zones::ZoneIndex;
use geo::polygon;
use tracing_subscriber::EnvFilter;

/// Stands in for a building-registry lookup: a 10x10 m square centered on
/// the address position.
struct SquareAroundPosition;

impl FootprintProvider for SquareAroundPosition {
    fn footprint_of(&self, address: &ResolvedAddress) -> Result<Footprint, CanopyError> {
        let (x, y) = address.position();
        Ok(Footprint::lambert72(vec![polygon![
            (x: x - 5.0, y: y - 5.0),
            (x: x + 5.0, y: y - 5.0),
            (x: x + 5.0, y: y + 5.0),
            (x: x - 5.0, y: y + 5.0),
        ]]))
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let mut args = std::env::args().skip(1);
    let geojson = args.next().ok_or("usage: canopy_for_address <zones.geojson> <x> <y>")?;
    let x: f64 = args.next().ok_or("missing x coordinate")?.parse()?;
    let y: f64 = args.next().ok_or("missing y coordinate")?.parse()?;

    let pipeline = CanopyPipeline::new(
        ZoneIndex::from_geojson_path(&geojson)?,
        TileStore::with_http_transport()?,
    );

    let address = ResolvedAddress::new("Grote Markt", "5", 2000, "Antwerpen", x, y);
    println!("{address} at Lambert 72 ({x}, {y})");

    let canopy = pipeline.canopy_for_address(&address, &SquareAroundPosition)?;
    let (width, height) = canopy.dimensions();
    println!("window: {width}x{height} pixels, {} with data", canopy.valid_count());
    if let Some(max) = canopy.max_height() {
        println!("tallest point: {max:.2} m");
    }
    if let Some(mean) = canopy.mean_height() {
        println!("mean height:   {mean:.2} m");
    }

    Ok(())
}
