use geo::{
    coordinate_position::{CoordPos, CoordinatePosition},
    BoundingRect, Coord, MultiPolygon,
};
use rayon::prelude::*;

use crate::{common::mean_std, grid::Cell, raster::{BandRaster, PixelWindow}};
use super::names;

/// Pixel statistics under one geometry.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ZonalStats {
    pub mean: f64,
    pub std: f64,
    /// Number of valid pixels sampled.
    pub count: usize,
}

/// Visible and near-infrared bands of an optical scene. Absent bands zero-fill.
#[derive(Debug, Clone, Default)]
pub struct OpticalBands {
    pub blue: Option<BandRaster>,
    pub green: Option<BandRaster>,
    pub red: Option<BandRaster>,
    pub nir: Option<BandRaster>,
}

/// Backscatter bands of a radar scene. Absent bands zero-fill.
#[derive(Debug, Clone, Default)]
pub struct RadarBands {
    pub vv: Option<BandRaster>,
    pub vh: Option<BandRaster>,
}

/// Mean and population std of the valid pixels whose centre lies inside
/// `geometry`. `None` when no such pixel exists.
///
/// A centre exactly on the boundary counts only when the cell extends to its
/// right and below it, so cells sharing an edge never sample the same pixel.
pub fn zonal_stats(raster: &BandRaster, geometry: &MultiPolygon<f64>) -> Option<ZonalStats> {
    let rect = geometry.bounding_rect()?;
    let window = PixelWindow::from_bounds(raster.transform(), &rect, raster.shape())?;
    let (scale_x, scale_y) = raster.transform().pixel_scale();
    let nudge = 1e-6 * scale_x.min(scale_y);

    let data = raster.data();
    let mut values = Vec::with_capacity(window.len());
    for row in window.rows() {
        for col in window.cols() {
            let value = data[[row, col]];
            if !raster.is_valid(value) { continue }
            let centre = raster.transform().apply(col as f64 + 0.5, row as f64 + 0.5);
            if covers_centre(geometry, centre, nudge) {
                values.push(value);
            }
        }
    }

    let (mean, std) = mean_std(&values)?;
    Some(ZonalStats { mean, std, count: values.len() })
}

/// Zonal statistics of `raster` for every cell, in cell order. Cells without
/// valid pixels, and every cell when the raster is absent, get zeros.
pub fn sample_band(cells: &[Cell], raster: Option<&BandRaster>) -> Vec<ZonalStats> {
    let Some(raster) = raster else { return vec![ZonalStats::default(); cells.len()] };
    let stats = cells.par_iter()
        .map(|cell| zonal_stats(raster, cell.geometry()).unwrap_or_default())
        .collect::<Vec<_>>();

    let empty = stats.iter().filter(|s| s.count == 0).count();
    tracing::debug!(band = raster.name(), cells = cells.len(), empty, "sampled band");
    stats
}

/// Attach per-band `<band>_mean`/`<band>_std` plus `brightness` and `ndvi`.
pub fn sample_optical(cells: &mut [Cell], bands: &OpticalBands) {
    let blue = sample_band(cells, bands.blue.as_ref());
    let green = sample_band(cells, bands.green.as_ref());
    let red = sample_band(cells, bands.red.as_ref());
    let nir = sample_band(cells, bands.nir.as_ref());

    for (i, cell) in cells.iter_mut().enumerate() {
        for (band, stats) in [("blue", &blue[i]), ("green", &green[i]), ("red", &red[i]), ("nir", &nir[i])] {
            cell.set_feature(format!("{band}_mean"), stats.mean);
            cell.set_feature(format!("{band}_std"), stats.std);
        }
        cell.set_feature(names::BRIGHTNESS, (blue[i].mean + green[i].mean + red[i].mean) / 3.0);
        cell.set_feature(names::NDVI, ndvi(nir[i].mean, red[i].mean));
    }
}

/// Attach `vv_mean`, `vv_std` and `vh_mean`.
pub fn sample_radar(cells: &mut [Cell], bands: &RadarBands) {
    let vv = sample_band(cells, bands.vv.as_ref());
    let vh = sample_band(cells, bands.vh.as_ref());

    for ((cell, vv), vh) in cells.iter_mut().zip(vv).zip(vh) {
        cell.set_feature(names::VV_MEAN, vv.mean);
        cell.set_feature(names::VV_STD, vv.std);
        cell.set_feature(names::VH_MEAN, vh.mean);
    }
}

#[inline]
fn covers_centre(geometry: &MultiPolygon<f64>, centre: Coord<f64>, nudge: f64) -> bool {
    match geometry.coordinate_position(&centre) {
        CoordPos::Inside => true,
        CoordPos::OnBoundary => {
            let shifted = Coord { x: centre.x + nudge, y: centre.y - nudge };
            geometry.coordinate_position(&shifted) == CoordPos::Inside
        }
        CoordPos::Outside => false,
    }
}

/// Normalised difference `(nir - red) / (nir + red)`; zero whenever either
/// input or the denominator is zero.
#[inline]
fn ndvi(nir: f64, red: f64) -> f64 {
    let denominator = nir + red;
    if nir == 0.0 || red == 0.0 || denominator == 0.0 { return 0.0 }
    (nir - red) / denominator
}
