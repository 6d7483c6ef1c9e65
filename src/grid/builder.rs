use geo::{Area, BooleanOps, BoundingRect, Coord, MultiPolygon, Rect};
use rayon::prelude::*;

use crate::{error::PipelineError, geom::repair};
use super::{Cell, CellId};

/// Tile `boundary` with axis-aligned `grid_size`×`grid_size` squares and clip
/// each square to the boundary.
///
/// The lattice is snapped to multiples of `grid_size`. Squares are visited with
/// x ascending in the outer loop and y ascending in the inner loop; that order
/// assigns `cell_0, cell_1, ...`. Squares whose clipped part has no area are
/// dropped and consume no id.
pub fn build_grid(boundary: &MultiPolygon<f64>, grid_size: f64) -> Result<Vec<Cell>, PipelineError> {
    if !(grid_size.is_finite() && grid_size > 0.0) {
        return Err(PipelineError::InvalidConfig(format!("grid size must be positive, got {grid_size}")));
    }

    let boundary = repair(boundary);
    let area = boundary.unsigned_area();
    if !(area.is_finite() && area > 0.0) {
        return Err(PipelineError::InvalidBoundary("boundary is empty or has zero area".into()));
    }
    let bounds = boundary.bounding_rect()
        .ok_or_else(|| PipelineError::InvalidBoundary("boundary has no extent".into()))?;

    let (x_start, x_end) = lattice_range(bounds.min().x, bounds.max().x, grid_size);
    let (y_start, y_end) = lattice_range(bounds.min().y, bounds.max().y, grid_size);

    let squares = (x_start..x_end)
        .flat_map(|ix| (y_start..y_end).map(move |iy| (ix, iy)))
        .collect::<Vec<_>>();

    let clipped = squares.par_iter()
        .map(|&(ix, iy)| {
            let min = Coord { x: ix as f64 * grid_size, y: iy as f64 * grid_size };
            let max = Coord { x: min.x + grid_size, y: min.y + grid_size };
            let square = MultiPolygon(vec![Rect::new(min, max).to_polygon()]);
            let piece = square.intersection(&boundary);
            (piece.unsigned_area() > 0.0).then_some(piece)
        })
        .collect::<Vec<_>>();

    let cells = clipped.into_iter()
        .flatten()
        .enumerate()
        .map(|(i, geometry)| Cell::new(CellId::new(i as u32), geometry))
        .collect::<Vec<_>>();

    tracing::info!(cells = cells.len(), grid_size, "built grid");
    Ok(cells)
}

/// Lattice indices `[floor(min/g), ceil(max/g))`, always at least one step wide.
fn lattice_range(min: f64, max: f64, grid_size: f64) -> (i64, i64) {
    let start = (min / grid_size).floor() as i64;
    let end = ((max / grid_size).ceil() as i64).max(start + 1);
    (start, end)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use geo::{polygon, Contains, Intersects};

    use super::*;

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> MultiPolygon<f64> {
        MultiPolygon(vec![polygon![(x: x0, y: y0), (x: x1, y: y0), (x: x1, y: y1), (x: x0, y: y1)]])
    }

    #[test]
    fn square_boundary_yields_four_cells() {
        let cells = build_grid(&rect(0.0, 0.0, 100.0, 100.0), 50.0).unwrap();
        assert_eq!(cells.len(), 4);
        let ids = cells.iter().map(|c| c.id().to_string()).collect::<Vec<_>>();
        assert_eq!(ids, ["cell_0", "cell_1", "cell_2", "cell_3"]);
        for cell in &cells {
            assert_relative_eq!(cell.area(), 2500.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn scan_order_is_x_outer_y_inner() {
        let cells = build_grid(&rect(0.0, 0.0, 100.0, 100.0), 50.0).unwrap();
        let origin = |cell: &Cell| {
            let r = cell.geometry().bounding_rect().unwrap();
            (r.min().x, r.min().y)
        };
        let origins = cells.iter().map(origin).collect::<Vec<_>>();
        assert_eq!(origins, [(0.0, 0.0), (0.0, 50.0), (50.0, 0.0), (50.0, 50.0)]);
    }

    #[test]
    fn origin_snaps_to_grid_and_clips() {
        // Boundary offset from the lattice: squares start at multiples of 50.
        let boundary = rect(30.0, 70.0, 130.0, 120.0);
        let cells = build_grid(&boundary, 50.0).unwrap();
        // x lattice 0..150 (3 columns), y lattice 50..150 (2 rows).
        assert_eq!(cells.len(), 6);
        let total = cells.iter().map(Cell::area).sum::<f64>();
        assert_relative_eq!(total, boundary.unsigned_area(), epsilon = 1e-6);

        let first = cells[0].geometry().bounding_rect().unwrap();
        assert_relative_eq!(first.min().x, 30.0, epsilon = 1e-9);
        assert_relative_eq!(first.max().x, 50.0, epsilon = 1e-9);
        assert_relative_eq!(first.min().y, 70.0, epsilon = 1e-9);
    }

    #[test]
    fn cells_stay_inside_boundary_and_skip_empty_squares() {
        // L-shaped boundary: the top-right 50x50 square lies outside.
        let boundary = MultiPolygon(vec![polygon![
            (x: 0.0, y: 0.0), (x: 100.0, y: 0.0), (x: 100.0, y: 50.0),
            (x: 50.0, y: 50.0), (x: 50.0, y: 100.0), (x: 0.0, y: 100.0),
        ]]);
        let cells = build_grid(&boundary, 50.0).unwrap();
        assert_eq!(cells.len(), 3);
        for cell in &cells {
            assert!(cell.area() > 0.0);
            let inner = geo::InteriorPoint::interior_point(cell.geometry()).unwrap();
            assert!(boundary.contains(&inner));
            assert!(boundary.intersects(cell.geometry()));
        }
        assert_eq!(cells[2].id().to_string(), "cell_2");
    }

    #[test]
    fn degenerate_boundary_is_rejected() {
        let empty = MultiPolygon::<f64>(vec![]);
        assert!(matches!(build_grid(&empty, 50.0), Err(PipelineError::InvalidBoundary(_))));

        let flat = rect(0.0, 0.0, 100.0, 0.0);
        assert!(matches!(build_grid(&flat, 50.0), Err(PipelineError::InvalidBoundary(_))));

        assert!(matches!(build_grid(&rect(0.0, 0.0, 1.0, 1.0), 0.0), Err(PipelineError::InvalidConfig(_))));
    }
}
