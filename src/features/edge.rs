use geo::{BoundingRect, InteriorPoint};
use ndarray::{Array2, Zip};
use rayon::prelude::*;

use crate::{
    common::{percentile, Warnings},
    error::RasterError,
    grid::Cell,
    raster::{BandRaster, GeoTransform, PixelWindow},
};
use super::{names, OpticalBands};

/// Percentile of the gradient magnitude above which a pixel is an edge.
pub const EDGE_PERCENTILE: f64 = 75.0;

/// Binary edge map on the pixel grid of the source bands.
#[derive(Debug, Clone)]
pub struct EdgeMask {
    pub mask: Array2<bool>,
    /// Magnitude a pixel must exceed to count as an edge.
    pub threshold: f64,
    pub transform: GeoTransform,
}

/// Unweighted mean of the three visible bands. A pixel that is invalid in any
/// band is NaN in the result. All bands must share red's shape and transform.
pub fn grayscale(red: &BandRaster, green: &BandRaster, blue: &BandRaster) -> Result<Array2<f64>, RasterError> {
    let expected = red.shape();
    for band in [green, blue] {
        if band.shape() != expected {
            return Err(RasterError::ShapeMismatch { name: band.name().to_string(), expected, found: band.shape() });
        }
        if band.transform() != red.transform() {
            return Err(RasterError::TransformMismatch { name: band.name().to_string(), reference: red.name().to_string() });
        }
    }

    let mut gray = Array2::zeros(expected);
    Zip::from(&mut gray)
        .and(red.data())
        .and(green.data())
        .and(blue.data())
        .for_each(|out, &r, &g, &b| {
            *out = if red.is_valid(r) && green.is_valid(g) && blue.is_valid(b) {
                (r + g + b) / 3.0
            } else {
                f64::NAN
            };
        });
    Ok(gray)
}

/// Sobel gradient magnitude. Kernels are scaled by 1/4 and the border is
/// extended by repeating the outermost pixel.
pub fn sobel_magnitude(image: &Array2<f64>) -> Array2<f64> {
    let (rows, cols) = image.dim();
    let mut magnitude = Array2::zeros((rows, cols));
    if rows == 0 || cols == 0 { return magnitude }

    let at = |r: isize, c: isize| {
        let r = r.clamp(0, rows as isize - 1) as usize;
        let c = c.clamp(0, cols as isize - 1) as usize;
        image[[r, c]]
    };

    Zip::indexed(&mut magnitude).par_for_each(|(r, c), out| {
        let (r, c) = (r as isize, c as isize);
        let gx = (at(r - 1, c + 1) + 2.0 * at(r, c + 1) + at(r + 1, c + 1)
            - at(r - 1, c - 1) - 2.0 * at(r, c - 1) - at(r + 1, c - 1)) / 4.0;
        let gy = (at(r + 1, c - 1) + 2.0 * at(r + 1, c) + at(r + 1, c + 1)
            - at(r - 1, c - 1) - 2.0 * at(r - 1, c) - at(r - 1, c + 1)) / 4.0;
        *out = gx.hypot(gy);
    });
    magnitude
}

/// Threshold `magnitude` at its [`EDGE_PERCENTILE`]th percentile over the whole
/// raster. NaN pixels never count as edges.
pub fn edge_mask(magnitude: &Array2<f64>, transform: GeoTransform) -> EdgeMask {
    let values = magnitude.iter().copied().collect::<Vec<_>>();
    let threshold = percentile(&values, EDGE_PERCENTILE).unwrap_or(f64::INFINITY);
    let mask = magnitude.mapv(|m| m > threshold);
    EdgeMask { mask, threshold, transform }
}

/// Share of edge pixels under each cell, in cell order.
pub fn edge_density(cells: &[Cell], edges: &EdgeMask) -> Vec<f64> {
    let shape = edges.mask.dim();
    cells.par_iter()
        .map(|cell| {
            // With an affine transform `from_bounds` only fails for cells off
            // the raster, and the centred patch is then clipped to nothing too.
            let window = cell.geometry().bounding_rect()
                .and_then(|rect| PixelWindow::from_bounds(&edges.transform, &rect, shape))
                .or_else(|| {
                    tracing::debug!(cell = %cell.id(), "bounding window unavailable, using centred patch");
                    fallback_window(cell, &edges.transform, shape)
                });

            match window {
                Some(window) if !window.is_empty() => {
                    let hits = window.view(&edges.mask).iter().filter(|&&e| e).count();
                    hits as f64 / window.len() as f64
                }
                _ => 0.0,
            }
        })
        .collect()
}

/// Patch centred on the cell's interior point, as many pixels across as the
/// cell's bounding box spans.
fn fallback_window(cell: &Cell, transform: &GeoTransform, shape: (usize, usize)) -> Option<PixelWindow> {
    let point = cell.geometry().interior_point()?;
    let rect = cell.geometry().bounding_rect()?;
    let pixel = transform.inverse()?.apply(point.x(), point.y());
    let (scale_x, scale_y) = transform.pixel_scale();
    if !(pixel.x.is_finite() && pixel.y.is_finite()) || scale_x <= 0.0 || scale_y <= 0.0 {
        return None;
    }

    let width = (rect.width() / scale_x).ceil().max(1.0) as i64;
    let height = (rect.height() / scale_y).ceil().max(1.0) as i64;
    let window = PixelWindow::centred(pixel.y.floor() as i64, pixel.x.floor() as i64, height, width, shape);
    Some(window)
}

/// Attach `edge_density` to every cell. Missing visible bands or bands on
/// different grids zero-fill the feature.
pub fn join_edge_density(cells: &mut [Cell], bands: &OpticalBands, warnings: &mut Warnings) {
    let densities = match (&bands.red, &bands.green, &bands.blue) {
        (Some(red), Some(green), Some(blue)) => match grayscale(red, green, blue) {
            Ok(gray) => {
                let edges = edge_mask(&sobel_magnitude(&gray), *red.transform());
                let densities = edge_density(cells, &edges);
                tracing::info!(cells = cells.len(), threshold = edges.threshold, "estimated edge density");
                densities
            }
            Err(e) => {
                warnings.push("edge_density", format!("{e}; edge density set to 0"));
                vec![0.0; cells.len()]
            }
        },
        _ => {
            warnings.push("edge_density", "red, green and blue bands are required; edge density set to 0");
            vec![0.0; cells.len()]
        }
    };

    for (cell, density) in cells.iter_mut().zip(densities) {
        cell.set_feature(names::EDGE_DENSITY, density);
    }
}
