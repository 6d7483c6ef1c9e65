use ahash::AHashMap;
use geo::{Area, Buffer, MultiLineString, MultiPolygon};
use rayon::prelude::*;

use crate::{
    common::Warnings,
    geom::{dissolve, is_finite, repair, Overlay, PolygonIndex},
    grid::Cell,
};
use super::names;

/// Turn road centrelines into road-surface polygons of half-width `radius`.
///
/// Centrelines with a non-finite vertex are skipped and recorded in `warnings`.
pub fn buffer_roads(centrelines: &[MultiLineString<f64>], radius: f64, warnings: &mut Warnings) -> Vec<MultiPolygon<f64>> {
    if radius <= 0.0 { return Vec::new() }
    let skipped = centrelines.iter().filter(|lines| !is_finite(*lines)).count();
    if skipped > 0 {
        warnings.push("roads", format!("skipped {skipped} road centreline(s) with non-finite coordinates"));
    }
    centrelines.par_iter()
        .filter(|lines| is_finite(*lines))
        .map(|lines| lines.buffer(radius))
        .filter(|surface| !surface.0.is_empty())
        .collect()
}

/// Fraction of each cell's area covered by the union of `features`, in cell order.
///
/// Features are repaired before the overlay. Pieces falling in the same cell are
/// dissolved so overlapping features are not counted twice. An empty collection
/// yields all zeros without running the overlay.
pub fn coverage_fractions(cells: &[Cell], features: &[MultiPolygon<f64>], overlay: &impl Overlay) -> Vec<f64> {
    let mut fractions = vec![0.0; cells.len()];
    if features.is_empty() || cells.is_empty() { return fractions }

    let repaired = features.par_iter()
        .map(repair)
        .filter(|shape| !shape.0.is_empty())
        .collect::<Vec<_>>();
    if repaired.is_empty() { return fractions }

    let feature_index = PolygonIndex::new(repaired);
    let cell_index = PolygonIndex::new(cells.iter().map(|cell| cell.geometry().clone()).collect());

    let mut by_cell: AHashMap<usize, Vec<MultiPolygon<f64>>> = AHashMap::new();
    for piece in overlay.intersect(&feature_index, &cell_index) {
        by_cell.entry(piece.cell).or_default().push(piece.geometry);
    }

    let covered = by_cell.into_iter().collect::<Vec<_>>().into_par_iter()
        .map(|(cell, pieces)| (cell, dissolve(pieces).unsigned_area()))
        .collect::<Vec<_>>();

    for (idx, area) in covered {
        let cell_area = cells[idx].area();
        if cell_area > 0.0 && area.is_finite() {
            fractions[idx] = (area / cell_area).clamp(0.0, 1.0);
        }
    }
    fractions
}

/// Attach `parking_fraction` and `road_fraction` to every cell.
pub fn join_vector_features(
    cells: &mut [Cell],
    parking: &[MultiPolygon<f64>],
    road_surfaces: &[MultiPolygon<f64>],
    overlay: &impl Overlay,
) {
    let parking_fraction = coverage_fractions(cells, parking, overlay);
    let road_fraction = coverage_fractions(cells, road_surfaces, overlay);

    for ((cell, parking), road) in cells.iter_mut().zip(parking_fraction).zip(road_fraction) {
        cell.set_feature(names::PARKING_FRACTION, parking);
        cell.set_feature(names::ROAD_FRACTION, road);
    }

    let road_cells = cells.iter().filter(|cell| cell.is_road_cell()).count();
    tracing::info!(
        parking = parking.len(),
        roads = road_surfaces.len(),
        road_cells,
        "joined vector features"
    );
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use geo::{line_string, polygon};

    use super::*;
    use crate::{geom::{BooleanOverlay, OverlayPiece}, grid::build_grid};

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> MultiPolygon<f64> {
        MultiPolygon(vec![polygon![(x: x0, y: y0), (x: x1, y: y0), (x: x1, y: y1), (x: x0, y: y1)]])
    }

    fn grid() -> Vec<Cell> {
        build_grid(&rect(0.0, 0.0, 100.0, 100.0), 50.0).unwrap()
    }

    /// Overlay that must never run.
    struct Unreachable;

    impl Overlay for Unreachable {
        fn intersect(&self, _: &PolygonIndex, _: &PolygonIndex) -> Vec<OverlayPiece> {
            panic!("overlay invoked for an empty feature collection")
        }
    }

    #[test]
    fn empty_collection_short_circuits() {
        let mut cells = grid();
        join_vector_features(&mut cells, &[], &[], &Unreachable);
        for cell in &cells {
            assert_eq!(cell.parking_fraction(), 0.0);
            assert_eq!(cell.road_fraction(), 0.0);
            assert!(!cell.is_road_cell());
        }
    }

    #[test]
    fn fractions_follow_overlap_area() {
        let cells = grid();
        // Covers the whole of cell_0 (0..50, 0..50) and half of cell_2 (50..100, 0..50).
        let fractions = coverage_fractions(&cells, &[rect(0.0, 0.0, 75.0, 50.0)], &BooleanOverlay);
        assert_relative_eq!(fractions[0], 1.0, epsilon = 1e-9);
        assert_eq!(fractions[1], 0.0);
        assert_relative_eq!(fractions[2], 0.5, epsilon = 1e-9);
        assert_eq!(fractions[3], 0.0);
    }

    #[test]
    fn overlapping_features_never_exceed_one() {
        let cells = grid();
        let features = [rect(0.0, 0.0, 50.0, 50.0), rect(0.0, 0.0, 50.0, 50.0), rect(25.0, 0.0, 50.0, 50.0)];
        let fractions = coverage_fractions(&cells, &features, &BooleanOverlay);
        assert_relative_eq!(fractions[0], 1.0, epsilon = 1e-9);
        assert!(fractions.iter().all(|f| (0.0..=1.0).contains(f)));
    }

    #[test]
    fn invalid_features_are_repaired() {
        let cells = grid();
        let bowtie = MultiPolygon(vec![polygon![(x: 0.0, y: 0.0), (x: 50.0, y: 50.0), (x: 50.0, y: 0.0), (x: 0.0, y: 50.0)]]);
        let fractions = coverage_fractions(&cells, &[bowtie], &BooleanOverlay);
        assert_relative_eq!(fractions[0], 0.5, epsilon = 1e-9);
    }

    #[test]
    fn buffered_road_marks_road_cells() {
        let mut cells = grid();
        // Horizontal road through the lower row of cells.
        let road = MultiLineString(vec![line_string![(x: -10.0, y: 25.0), (x: 110.0, y: 25.0)]]);
        let mut warnings = Warnings::new();
        let surfaces = buffer_roads(&[road], 3.0, &mut warnings);
        assert_eq!(surfaces.len(), 1);
        assert!(warnings.is_empty());

        join_vector_features(&mut cells, &[], &surfaces, &BooleanOverlay);
        // 6 m wide strip across a 50 m cell: 300 / 2500.
        assert_relative_eq!(cells[0].road_fraction(), 0.12, epsilon = 1e-3);
        assert_relative_eq!(cells[2].road_fraction(), 0.12, epsilon = 1e-3);
        assert_eq!(cells[1].road_fraction(), 0.0);
        for cell in &cells {
            assert_eq!(cell.is_road_cell(), cell.road_fraction() > 0.02);
        }
        assert!(buffer_roads(&[], 3.0, &mut warnings).is_empty());
    }

    #[test]
    fn non_finite_centreline_is_skipped_with_warning() {
        let broken = MultiLineString(vec![line_string![(x: 0.0, y: 25.0), (x: f64::NAN, y: 25.0), (x: 100.0, y: 25.0)]]);
        let good = MultiLineString(vec![line_string![(x: -10.0, y: 75.0), (x: 110.0, y: 75.0)]]);
        let mut warnings = Warnings::new();

        let surfaces = buffer_roads(&[broken, good], 3.0, &mut warnings);
        assert_eq!(surfaces.len(), 1);
        assert_eq!(warnings.len(), 1);
        assert!(warnings.iter().next().unwrap().starts_with("[roads]"));

        let mut cells = grid();
        join_vector_features(&mut cells, &[], &surfaces, &BooleanOverlay);
        assert_eq!(cells[0].road_fraction(), 0.0);
        assert_relative_eq!(cells[1].road_fraction(), 0.12, epsilon = 1e-3);
    }
}
