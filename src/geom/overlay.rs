use geo::{Area, BooleanOps, BoundingRect, CoordsIter, MultiPolygon};
use rayon::prelude::*;

use super::PolygonIndex;

/// The part of one feature that falls inside one cell.
#[derive(Debug, Clone)]
pub struct OverlayPiece {
    pub feature: usize,
    pub cell: usize,
    pub geometry: MultiPolygon<f64>,
}

/// Polygon-set intersection. Implementations must return pieces grouped by
/// ascending cell index, and only pieces with positive area.
pub trait Overlay: Sync {
    fn intersect(&self, features: &PolygonIndex, cells: &PolygonIndex) -> Vec<OverlayPiece>;
}

/// Overlay backed by `geo`'s boolean operations, with R-tree candidate filtering.
#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanOverlay;

impl Overlay for BooleanOverlay {
    fn intersect(&self, features: &PolygonIndex, cells: &PolygonIndex) -> Vec<OverlayPiece> {
        (0..cells.len()).into_par_iter()
            .flat_map_iter(|cell| {
                let shape = cells.get(cell);
                let candidates = match shape.bounding_rect() {
                    Some(rect) if is_finite(shape) => features.candidates(&rect),
                    _ => Vec::new(),
                };
                candidates.into_iter().filter_map(move |feature| {
                    let geometry = features.get(feature).intersection(shape);
                    let area = geometry.unsigned_area();
                    (area.is_finite() && area > 0.0).then_some(OverlayPiece { feature, cell, geometry })
                })
            })
            .collect()
    }
}

/// Repair self-intersections and ring orientation by re-running the shape through
/// the boolean-op sweep (the zero-distance buffer trick). Shapes with non-finite
/// coordinates cannot be repaired and come back empty.
pub fn repair(shape: &MultiPolygon<f64>) -> MultiPolygon<f64> {
    if !is_finite(shape) { return MultiPolygon(vec![]) }
    shape.union(&MultiPolygon::<f64>(vec![]))
}

/// Union a set of pieces into one MultiPolygon so overlapping parts count once.
pub fn dissolve(pieces: impl IntoIterator<Item = MultiPolygon<f64>>) -> MultiPolygon<f64> {
    pieces.into_iter()
        .reduce(|a, b| a.union(&b))
        .unwrap_or_else(|| MultiPolygon(vec![]))
}

/// True when every vertex of `shape` has finite coordinates.
#[inline]
pub(crate) fn is_finite<G: CoordsIter<Scalar = f64>>(shape: &G) -> bool {
    shape.coords_iter().all(|c| c.x.is_finite() && c.y.is_finite())
}
