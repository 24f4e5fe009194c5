//! Raster tile identity and deterministic naming.

use crate::{LayerKind, RasterError, Result};
use std::path::{Path, PathBuf};

/// Default pixel resolution token of the DHMV products used here.
pub const DEFAULT_RESOLUTION: &str = "1m";

/// Default DHMV release (roman numerals, `II` is the current release).
pub const DEFAULT_VERSION: &str = "II";

/// Default directory where extracted raster files are kept.
pub const DEFAULT_BASE_DIR: &str = "tiff_data";

/// Base URL of the download service that serves the zipped rasters.
const DOWNLOAD_BASE_URL: &str = "https://downloadagiv.blob.core.windows.net";

/// Identity of one DHMV raster tile: map-sheet zone, layer kind, resolution,
/// release version, and the base directory it is stored under.
///
/// A `TileRef` owns no raster data. Its file name, download location, and
/// local path are pure derivations of its fields, so two equal refs always
/// address the same bytes on disk and on the download service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileRef {
    /// Kaartbladversnijding zone number covered by this tile.
    pub zone: u32,
    /// Terrain or surface layer.
    pub kind: LayerKind,
    resolution: String,
    version: String,
    base_dir: PathBuf,
}

impl TileRef {
    /// Create a tile reference.
    pub fn new(
        zone: u32,
        kind: LayerKind,
        resolution: impl Into<String>,
        version: impl Into<String>,
        base_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            zone,
            kind,
            resolution: resolution.into(),
            version: version.into(),
            base_dir: base_dir.into(),
        }
    }

    /// Create a tile reference with the default resolution, version, and
    /// base directory.
    pub fn with_defaults(zone: u32, kind: LayerKind) -> Self {
        Self::new(zone, kind, DEFAULT_RESOLUTION, DEFAULT_VERSION, DEFAULT_BASE_DIR)
    }

    /// Pixel resolution token, e.g. `1m`.
    pub fn resolution(&self) -> &str {
        &self.resolution
    }

    /// DHMV release version, e.g. `II`.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Directory the extracted raster lives under.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Canonical file name with the given extension.
    ///
    /// Format: `DHMV{version}{DTM|DSM}RAS{resolution}_k{zone:02}{extension}`,
    /// e.g. `DHMVIIDSMRAS1m_k15.tif`. The zone is zero-padded to two digits.
    pub fn file_name(&self, extension: &str) -> String {
        format!(
            "DHMV{}{}RAS{}_k{:02}{}",
            self.version,
            self.kind.code(),
            self.resolution,
            self.zone,
            extension
        )
    }

    /// URL of the zipped raster on the download service.
    pub fn download_url(&self) -> String {
        format!(
            "{}/dhm-vlaanderen-{}-{}-raster-{}/{}",
            DOWNLOAD_BASE_URL,
            self.version.to_lowercase(),
            self.kind.code().to_lowercase(),
            self.resolution,
            self.file_name(".zip")
        )
    }

    /// Local path of the extracted GeoTIFF.
    pub fn local_path(&self) -> PathBuf {
        self.base_dir.join(self.file_name(".tif"))
    }

    /// Check whether the GeoTIFF is already present locally.
    pub fn is_downloaded(&self) -> bool {
        self.local_path().exists()
    }

    /// The complementary tile: same zone, resolution, version, and base
    /// directory, with terrain and surface swapped.
    pub fn complement(&self) -> TileRef {
        TileRef {
            zone: self.zone,
            kind: self.kind.complement(),
            resolution: self.resolution.clone(),
            version: self.version.clone(),
            base_dir: self.base_dir.clone(),
        }
    }

    /// Parse a canonical DHMV file name back into a tile reference.
    ///
    /// Accepts names like `DHMVIIDTMRAS1m_k05.tif`: a roman-numeral release,
    /// a `DTM`/`DSM` code, a resolution token, and a two-digit zone.
    pub fn parse_file_name(name: &str, base_dir: impl Into<PathBuf>) -> Result<TileRef> {
        let invalid = || RasterError::InvalidFileName(name.to_string());

        let rest = name.strip_prefix("DHMV").ok_or_else(invalid)?;
        // Release version: leading roman numerals before the layer code.
        let version_len = rest.chars().take_while(|c| matches!(c, 'I' | 'V' | 'X')).count();
        let (version, rest) = rest.split_at(version_len);
        let kind = LayerKind::parse(rest.get(..3).ok_or_else(invalid)?)
            .map_err(|_| invalid())?;
        let rest = rest[3..].strip_prefix("RAS").ok_or_else(invalid)?;
        let (resolution, rest) = rest.split_once("_k").ok_or_else(invalid)?;
        let zone_digits = rest.strip_suffix(".tif").ok_or_else(invalid)?;
        if zone_digits.len() != 2 || resolution.is_empty() {
            return Err(invalid());
        }
        let zone: u32 = zone_digits.parse().map_err(|_| invalid())?;

        Ok(TileRef::new(zone, kind, resolution, version, base_dir))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_derivation() {
        let tile = TileRef::with_defaults(15, LayerKind::Surface);
        assert_eq!(tile.file_name(".tif"), "DHMVIIDSMRAS1m_k15.tif");

        // Single-digit zones are zero padded.
        let tile = TileRef::with_defaults(5, LayerKind::Terrain);
        assert_eq!(tile.file_name(".tif"), "DHMVIIDTMRAS1m_k05.tif");
    }

    #[test]
    fn changing_zone_changes_only_the_zone_segment() {
        let a = TileRef::with_defaults(15, LayerKind::Surface).file_name(".tif");
        let b = TileRef::with_defaults(23, LayerKind::Surface).file_name(".tif");
        assert_eq!(a.replace("_k15", "_k23"), b);
    }

    #[test]
    fn download_url_matches_the_service_layout() {
        let tile = TileRef::new(15, LayerKind::Surface, "5m", "II", DEFAULT_BASE_DIR);
        assert_eq!(
            tile.download_url(),
            "https://downloadagiv.blob.core.windows.net/dhm-vlaanderen-ii-dsm-raster-5m/DHMVIIDSMRAS5m_k15.zip"
        );
    }

    #[test]
    fn local_path_is_under_the_base_dir() {
        let tile = TileRef::new(15, LayerKind::Terrain, "1m", "II", "/data/dhmv");
        assert_eq!(
            tile.local_path(),
            PathBuf::from("/data/dhmv/DHMVIIDTMRAS1m_k15.tif")
        );
    }

    #[test]
    fn complement_twice_is_identity() {
        let tile = TileRef::new(23, LayerKind::Terrain, "5m", "II", "/data/dhmv");
        let back = tile.complement().complement();
        assert_eq!(back, tile);

        // Complementary tiles agree on everything except the layer kind.
        let other = tile.complement();
        assert_eq!(other.zone, tile.zone);
        assert_eq!(other.resolution(), tile.resolution());
        assert_eq!(other.version(), tile.version());
        assert_eq!(other.base_dir(), tile.base_dir());
        assert_eq!(other.kind, LayerKind::Surface);
    }

    #[test]
    fn parse_file_name_round_trip() {
        let tile = TileRef::new(5, LayerKind::Terrain, "1m", "II", "tiff_data");
        let parsed = TileRef::parse_file_name(&tile.file_name(".tif"), "tiff_data").unwrap();
        assert_eq!(parsed, tile);
    }

    #[test]
    fn parse_file_name_rejects_foreign_names() {
        for name in [
            "USGS_13_n48w123_20240327.tif",
            "DHMVIIDOMRAS1m_k15.tif",
            "DHMVIIDSMRAS1m_k15.zip",
            "DHMVIIDSMRAS1m_k5.tif",
            "DHMVIIDSMRAS_k15.tif",
        ] {
            assert!(
                matches!(
                    TileRef::parse_file_name(name, "tiff_data"),
                    Err(RasterError::InvalidFileName(_))
                ),
                "{name} should be rejected"
            );
        }
    }
}
