//! Georeferenced single-band rasters.

mod read;
mod transform;
mod window;

use ndarray::Array2;

pub use transform::GeoTransform;
pub use window::PixelWindow;

/// One named band (spectral band or radar polarisation) on an affine pixel grid.
#[derive(Debug, Clone)]
pub struct BandRaster {
    name: String,
    data: Array2<f64>, // (row, col), row 0 at the transform origin
    transform: GeoTransform,
    nodata: Option<f64>,
}

impl BandRaster {
    pub fn new(name: impl Into<String>, data: Array2<f64>, transform: GeoTransform) -> Self {
        Self { name: name.into(), data, transform, nodata: None }
    }

    /// Mark `value` as the no-data sentinel.
    pub fn with_nodata(mut self, value: f64) -> Self {
        self.nodata = Some(value);
        self
    }

    #[inline] pub fn name(&self) -> &str { &self.name }

    #[inline] pub fn data(&self) -> &Array2<f64> { &self.data }

    #[inline] pub fn transform(&self) -> &GeoTransform { &self.transform }

    #[inline] pub fn nodata(&self) -> Option<f64> { self.nodata }

    /// `(rows, cols)`.
    #[inline] pub fn shape(&self) -> (usize, usize) { self.data.dim() }

    /// Whether `value` is real data (finite and not the no-data sentinel).
    #[inline]
    pub fn is_valid(&self, value: f64) -> bool {
        value.is_finite() && self.nodata != Some(value)
    }
}
