//! GeoJSON loader for the zone partition dataset.
//!
//! The Kaartbladversnijdingen are distributed as a small static dataset:
//! a feature collection where each feature carries the sheet number in a
//! `kblcode` (or `id`) property and a Polygon or MultiPolygon boundary in
//! Lambert 72 coordinates.

use crate::{ZoneError, ZoneTile};
use geo::{Coord, LineString, MultiPolygon, Polygon};
use serde::Deserialize;

#[derive(Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

#[derive(Deserialize)]
struct Feature {
    #[serde(default)]
    properties: Option<serde_json::Map<String, serde_json::Value>>,
    geometry: Geometry,
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum Geometry {
    Polygon {
        coordinates: Vec<Vec<Vec<f64>>>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<Vec<f64>>>>,
    },
}

/// Parse a feature collection into zone tiles.
pub(crate) fn parse(geojson: &str) -> Result<Vec<ZoneTile>, ZoneError> {
    let collection: FeatureCollection = serde_json::from_str(geojson)
        .map_err(|e| ZoneError::InvalidDataset(e.to_string()))?;

    collection
        .features
        .into_iter()
        .enumerate()
        .map(|(i, feature)| {
            let id = zone_id(&feature).ok_or_else(|| {
                ZoneError::InvalidDataset(format!(
                    "feature {i} has no integer \"kblcode\" or \"id\" property"
                ))
            })?;
            let boundary = boundary(feature.geometry, i)?;
            Ok(ZoneTile { id, boundary })
        })
        .collect()
}

fn zone_id(feature: &Feature) -> Option<u32> {
    let properties = feature.properties.as_ref()?;
    for key in ["kblcode", "id"] {
        for (name, value) in properties {
            if name.eq_ignore_ascii_case(key) {
                if let Some(id) = value.as_u64() {
                    return u32::try_from(id).ok();
                }
            }
        }
    }
    None
}

fn boundary(geometry: Geometry, index: usize) -> Result<MultiPolygon<f64>, ZoneError> {
    let polygons = match geometry {
        Geometry::Polygon { coordinates } => vec![polygon(coordinates, index)?],
        Geometry::MultiPolygon { coordinates } => coordinates
            .into_iter()
            .map(|rings| polygon(rings, index))
            .collect::<Result<Vec<_>, _>>()?,
    };
    Ok(MultiPolygon::new(polygons))
}

fn polygon(rings: Vec<Vec<Vec<f64>>>, index: usize) -> Result<Polygon<f64>, ZoneError> {
    let mut rings = rings.into_iter();
    let exterior = rings.next().ok_or_else(|| {
        ZoneError::InvalidDataset(format!("feature {index} has a polygon without rings"))
    })?;
    let exterior = line_string(exterior, index)?;
    let interiors = rings
        .map(|ring| line_string(ring, index))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Polygon::new(exterior, interiors))
}

fn line_string(ring: Vec<Vec<f64>>, index: usize) -> Result<LineString<f64>, ZoneError> {
    ring.into_iter()
        .map(|position| {
            if position.len() >= 2 {
                Ok(Coord {
                    x: position[0],
                    y: position[1],
                })
            } else {
                Err(ZoneError::InvalidDataset(format!(
                    "feature {index} has a position with fewer than two ordinates"
                )))
            }
        })
        .collect()
}
