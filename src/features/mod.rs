//! Per-cell feature extraction: vector coverage, raster zonal statistics and edge density.

mod edge;
mod vector;
mod zonal;

pub use edge::{edge_density, edge_mask, grayscale, join_edge_density, sobel_magnitude, EdgeMask, EDGE_PERCENTILE};
pub use vector::{buffer_roads, coverage_fractions, join_vector_features};
pub use zonal::{sample_band, sample_optical, sample_radar, zonal_stats, OpticalBands, RadarBands, ZonalStats};

/// Share of a cell covered by road surface above which it counts as a road cell.
pub const ROAD_CELL_THRESHOLD: f64 = 0.02;

/// Feature column names.
pub mod names {
    pub const PARKING_FRACTION: &str = "parking_fraction";
    pub const ROAD_FRACTION: &str = "road_fraction";
    pub const BRIGHTNESS: &str = "brightness";
    pub const NDVI: &str = "ndvi";
    pub const EDGE_DENSITY: &str = "edge_density";
    pub const VV_MEAN: &str = "vv_mean";
    pub const VV_STD: &str = "vv_std";
    pub const VH_MEAN: &str = "vh_mean";
}
