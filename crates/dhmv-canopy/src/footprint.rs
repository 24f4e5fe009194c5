//! Building footprints: sets of polygons outlining the structures at an
//! address.

use dhmv_raster::LAMBERT72;
use geo::{BoundingRect, Intersects, Point, Polygon, Rect};

/// The polygon outlines of the building(s) at an address.
///
/// Most addresses point to a single building, but some carry several
/// structures on one parcel. The set semantics are preserved: disjoint
/// polygons stay separate and are never merged. Containment and bounding
/// queries operate over the whole set, matching the "union of structures"
/// meaning of a footprint.
#[derive(Debug, Clone)]
pub struct Footprint {
    polygons: Vec<Polygon<f64>>,
    crs: String,
}

impl Footprint {
    /// Create a footprint in the given reference system.
    pub fn new(polygons: Vec<Polygon<f64>>, crs: impl Into<String>) -> Self {
        Self {
            polygons,
            crs: crs.into(),
        }
    }

    /// Create a footprint in Lambert 72, the reference system of all DHMV
    /// products.
    pub fn lambert72(polygons: Vec<Polygon<f64>>) -> Self {
        Self::new(polygons, LAMBERT72)
    }

    /// The polygons of the set.
    pub fn polygons(&self) -> &[Polygon<f64>] {
        &self.polygons
    }

    /// Reference system tag.
    pub fn crs(&self) -> &str {
        &self.crs
    }

    /// Number of polygons.
    pub fn len(&self) -> usize {
        self.polygons.len()
    }

    /// Whether the set contains no polygons.
    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    /// Bounding rectangle of the whole set, or `None` when empty.
    pub fn bounding_rect(&self) -> Option<Rect<f64>> {
        let mut rects = self.polygons.iter().filter_map(|p| p.bounding_rect());
        let first = rects.next()?;
        Some(rects.fold(first, |acc, r| {
            Rect::new(
                Point::new(acc.min().x.min(r.min().x), acc.min().y.min(r.min().y)),
                Point::new(acc.max().x.max(r.max().x), acc.max().y.max(r.max().y)),
            )
        }))
    }

    /// Whether any polygon of the set covers the point, boundary included.
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        let point = Point::new(x, y);
        self.polygons.iter().any(|p| p.intersects(&point))
    }
}
