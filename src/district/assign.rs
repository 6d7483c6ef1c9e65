use geo::{Area, BooleanOps, BoundingRect, Intersects};
use rayon::prelude::*;

use crate::{geom::{repair, PolygonIndex}, grid::Cell};
use super::{District, DistrictAssignment};

/// Position in `districts` each cell is attributed to, in cell order. Cells
/// intersecting no district map to `None`.
///
/// District geometries are repaired first; a district with non-finite
/// coordinates repairs to nothing and never matches.
pub fn assign_cells(cells: &[Cell], districts: &[District], policy: DistrictAssignment) -> Vec<Option<usize>> {
    let index = PolygonIndex::new(districts.par_iter().map(|d| repair(&d.geometry)).collect());
    if index.is_empty() { return vec![None; cells.len()] }

    cells.par_iter()
        .map(|cell| {
            let rect = cell.geometry().bounding_rect()?;
            let hits = index.candidates(&rect).into_iter()
                .filter(|&d| index.get(d).intersects(cell.geometry()));

            match policy {
                DistrictAssignment::FirstMatch => hits.min(),
                DistrictAssignment::LargestOverlap => {
                    let mut best: Option<(usize, f64)> = None;
                    for d in hits {
                        let shared = index.get(d).intersection(cell.geometry()).unsigned_area();
                        match best {
                            Some((_, area)) if area >= shared => {}
                            _ => best = Some((d, shared)),
                        }
                    }
                    best.map(|(d, _)| d)
                }
            }
        })
        .collect()
}
