use geo::Coord;
use serde::{Deserialize, Serialize};

/// Affine map from pixel space to projected coordinates:
///
/// ```text
/// x = a * col + b * row + c
/// y = d * col + e * row + f
/// ```
///
/// `(col, row) = (0, 0)` is the outer corner of the first pixel; pixel centres
/// sit at half-integer positions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl GeoTransform {
    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    /// North-up grid with its top-left corner at `(origin_x, origin_y)`.
    pub fn north_up(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self::new(pixel_width, 0.0, origin_x, 0.0, -pixel_height, origin_y)
    }

    /// Apply the map to `(u, v)`: pixel `(col, row)` to world `(x, y)`, or the
    /// reverse for an inverted transform.
    #[inline]
    pub fn apply(&self, u: f64, v: f64) -> Coord<f64> {
        Coord {
            x: self.a * u + self.b * v + self.c,
            y: self.d * u + self.e * v + self.f,
        }
    }

    /// The world-to-pixel transform, or `None` when this one is singular.
    pub fn inverse(&self) -> Option<Self> {
        let det = self.a * self.e - self.b * self.d;
        if det == 0.0 || !det.is_finite() { return None }
        Some(Self {
            a: self.e / det,
            b: -self.b / det,
            c: (self.b * self.f - self.e * self.c) / det,
            d: -self.d / det,
            e: self.a / det,
            f: (self.d * self.c - self.a * self.f) / det,
        })
    }

    /// Ground size of one pixel along columns and rows.
    #[inline]
    pub fn pixel_scale(&self) -> (f64, f64) {
        (self.a.hypot(self.d), self.b.hypot(self.e))
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn inverse_round_trips() {
        let t = GeoTransform::new(10.0, 2.0, 2_600_000.0, 1.0, -10.0, 1_250_000.0);
        let inv = t.inverse().unwrap();
        let world = t.apply(12.5, 7.5);
        let back = inv.apply(world.x, world.y);
        assert_relative_eq!(back.x, 12.5, epsilon = 1e-6);
        assert_relative_eq!(back.y, 7.5, epsilon = 1e-6);
    }

    #[test]
    fn singular_transform_has_no_inverse() {
        assert!(GeoTransform::new(10.0, 0.0, 0.0, 0.0, 0.0, 0.0).inverse().is_none());
        assert!(GeoTransform::new(f64::NAN, 0.0, 0.0, 0.0, -10.0, 0.0).inverse().is_none());
    }

    #[test]
    fn north_up_scale() {
        let t = GeoTransform::north_up(100.0, 200.0, 10.0, 20.0);
        assert_eq!(t.apply(1.0, 1.0), Coord { x: 110.0, y: 180.0 });
        assert_eq!(t.pixel_scale(), (10.0, 20.0));
    }
}
