//! The two DHMV raster layers: terrain and surface.

use crate::{RasterError, Result};
use std::fmt;

/// Which height-model layer a raster tile belongs to.
///
/// The DHMV distributes two aligned raster products per map sheet: the
/// digital terrain model (bare ground, `DTM`) and the digital surface model
/// (ground plus vegetation and structures, `DSM`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerKind {
    /// Digital terrain model: ground elevation only.
    Terrain,
    /// Digital surface model: elevation including vegetation and structures.
    Surface,
}

impl LayerKind {
    /// The product code used in file names and download containers.
    pub fn code(self) -> &'static str {
        match self {
            LayerKind::Terrain => "DTM",
            LayerKind::Surface => "DSM",
        }
    }

    /// Parse a product code. Case-insensitive.
    ///
    /// Anything other than `DTM` or `DSM` is rejected; this is the only way
    /// an invalid layer kind can be named, so every constructed [`LayerKind`]
    /// is valid by construction.
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "DTM" => Ok(LayerKind::Terrain),
            "DSM" => Ok(LayerKind::Surface),
            _ => Err(RasterError::InvalidLayerKind(s.to_string())),
        }
    }

    /// The other layer of the pair: terrain for surface, surface for terrain.
    pub fn complement(self) -> Self {
        match self {
            LayerKind::Terrain => LayerKind::Surface,
            LayerKind::Surface => LayerKind::Terrain,
        }
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
