use geo::{BoundingRect, MultiPolygon, Rect};
use rstar::{primitives::{GeomWithData, Rectangle}, RTree, AABB};

type IndexedBounds = GeomWithData<Rectangle<[f64; 2]>, usize>;

/// A collection of MultiPolygons with an R-tree over their bounding boxes.
/// Entries keep their input order; empty shapes are stored but never indexed.
#[derive(Debug, Clone)]
pub struct PolygonIndex {
    shapes: Vec<MultiPolygon<f64>>,
    rtree: RTree<IndexedBounds>,
}

impl PolygonIndex {
    /// Construct an index over `shapes`.
    pub fn new(shapes: Vec<MultiPolygon<f64>>) -> Self {
        Self {
            rtree: RTree::bulk_load(
                shapes.iter().enumerate()
                    .filter_map(|(i, shape)| {
                        let rect = shape.bounding_rect()?;
                        Some(GeomWithData::new(Rectangle::from_corners(rect.min().into(), rect.max().into()), i))
                    })
                    .collect()
            ),
            shapes,
        }
    }

    /// Get the number of MultiPolygons.
    #[inline] pub fn len(&self) -> usize { self.shapes.len() }

    /// Check if there are no MultiPolygons.
    #[inline] pub fn is_empty(&self) -> bool { self.shapes.is_empty() }

    #[inline] pub fn get(&self, idx: usize) -> &MultiPolygon<f64> { &self.shapes[idx] }

    /// Indices of the shapes whose bounding box intersects `rect`, ascending.
    pub fn candidates(&self, rect: &Rect<f64>) -> Vec<usize> {
        let envelope = AABB::from_corners(rect.min().into(), rect.max().into());
        let mut hits = self.rtree.locate_in_envelope_intersecting(&envelope)
            .map(|entry| entry.data)
            .collect::<Vec<_>>();
        hits.sort_unstable();
        hits
    }
}

#[cfg(test)]
mod tests {
    use geo::{polygon, Coord, Rect};

    use super::*;

    fn square(x: f64, y: f64, size: f64) -> MultiPolygon<f64> {
        MultiPolygon(vec![polygon![
            (x: x, y: y), (x: x + size, y: y), (x: x + size, y: y + size), (x: x, y: y + size),
        ]])
    }

    #[test]
    fn candidates_are_sorted_bbox_hits() {
        let index = PolygonIndex::new(vec![square(20.0, 0.0, 5.0), square(0.0, 0.0, 5.0), square(3.0, 3.0, 5.0)]);
        let query = Rect::new(Coord { x: 1.0, y: 1.0 }, Coord { x: 4.0, y: 4.0 });
        assert_eq!(index.candidates(&query), vec![1, 2]);
    }

    #[test]
    fn empty_shapes_are_skipped() {
        let index = PolygonIndex::new(vec![MultiPolygon(vec![]), square(0.0, 0.0, 1.0)]);
        assert_eq!(index.len(), 2);
        let query = Rect::new(Coord { x: -10.0, y: -10.0 }, Coord { x: 10.0, y: 10.0 });
        assert_eq!(index.candidates(&query), vec![1]);
        assert!(!index.is_empty());
        assert!(PolygonIndex::new(vec![]).is_empty());
    }
}
