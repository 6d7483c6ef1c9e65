use std::ops::Range;

use geo::Rect;
use ndarray::{s, Array2, ArrayView2};

use super::GeoTransform;

/// Offsets within this distance of an integer are treated as that integer, so
/// cell edges lying exactly on pixel edges do not pull in a neighbouring row.
const SNAP_EPS: f64 = 1e-6;

/// A rectangular block of pixels, always within the raster it was derived for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelWindow {
    pub row_off: usize,
    pub col_off: usize,
    pub height: usize,
    pub width: usize,
}

impl PixelWindow {
    /// Pixels covering the world-space rectangle `rect`, clipped to a raster of
    /// `shape = (rows, cols)`. Returns `None` when the transform is singular, the
    /// mapping is not finite, or the rectangle misses the raster entirely.
    pub fn from_bounds(transform: &GeoTransform, rect: &Rect<f64>, shape: (usize, usize)) -> Option<Self> {
        let inverse = transform.inverse()?;
        let (min, max) = (rect.min(), rect.max());
        let corners = [(min.x, min.y), (min.x, max.y), (max.x, min.y), (max.x, max.y)]
            .map(|(x, y)| inverse.apply(x, y));
        if corners.iter().any(|p| !(p.x.is_finite() && p.y.is_finite())) { return None }

        let min_of = |v: [f64; 4]| v.into_iter().fold(f64::INFINITY, f64::min);
        let max_of = |v: [f64; 4]| v.into_iter().fold(f64::NEG_INFINITY, f64::max);
        let (xs, ys) = (corners.map(|p| p.x), corners.map(|p| p.y));
        let col_start = snap(min_of(xs)).floor();
        let col_stop = snap(max_of(xs)).ceil();
        let row_start = snap(min_of(ys)).floor();
        let row_stop = snap(max_of(ys)).ceil();

        let (rows, cols) = shape;
        let r0 = row_start.max(0.0);
        let r1 = row_stop.min(rows as f64);
        let c0 = col_start.max(0.0);
        let c1 = col_stop.min(cols as f64);
        if r0 >= r1 || c0 >= c1 { return None }

        Some(Self {
            row_off: r0 as usize,
            col_off: c0 as usize,
            height: (r1 - r0) as usize,
            width: (c1 - c0) as usize,
        })
    }

    /// A `height`×`width` patch centred on pixel `(row, col)`, clipped to the raster.
    /// The result may be empty.
    pub fn centred(row: i64, col: i64, height: i64, width: i64, shape: (usize, usize)) -> Self {
        let (rows, cols) = (shape.0 as i64, shape.1 as i64);
        let (half_h, half_w) = (height.max(0) / 2, width.max(0) / 2);
        let r0 = (row - half_h).max(0);
        let r1 = (row + half_h).min(rows);
        let c0 = (col - half_w).max(0);
        let c1 = (col + half_w).min(cols);

        if r1 <= r0 || c1 <= c0 {
            return Self { row_off: 0, col_off: 0, height: 0, width: 0 };
        }
        Self {
            row_off: r0 as usize,
            col_off: c0 as usize,
            height: (r1 - r0) as usize,
            width: (c1 - c0) as usize,
        }
    }

    #[inline] pub fn len(&self) -> usize { self.height * self.width }

    #[inline] pub fn is_empty(&self) -> bool { self.len() == 0 }

    #[inline] pub fn rows(&self) -> Range<usize> { self.row_off..self.row_off + self.height }

    #[inline] pub fn cols(&self) -> Range<usize> { self.col_off..self.col_off + self.width }

    /// View of `array` restricted to this window.
    pub fn view<'a, T>(&self, array: &'a Array2<T>) -> ArrayView2<'a, T> {
        array.slice(s![self.rows(), self.cols()])
    }
}

#[inline]
fn snap(v: f64) -> f64 {
    let r = v.round();
    if (v - r).abs() < SNAP_EPS { r } else { v }
}
