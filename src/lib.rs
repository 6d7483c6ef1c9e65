#![doc = "Relative traffic-density estimation from a single remote-sensing scene and open map data"]
mod common;
mod config;
mod district;
mod error;
mod features;
mod geom;
mod grid;
mod pipeline;
mod raster;
mod score;

#[doc(inline)]
pub use common::{io, mean_std, percentile, Warnings};

#[doc(inline)]
pub use config::{ClassCountMap, CountEstimate, PipelineConfig};

#[doc(inline)]
pub use error::{PipelineError, RasterError};

#[doc(inline)]
pub use grid::{build_grid, Cell, CellId, Classification, TrafficLevel};

#[doc(inline)]
pub use geom::{dissolve, repair, BooleanOverlay, Overlay, OverlayPiece, PolygonIndex};

#[doc(inline)]
pub use features::{
    buffer_roads, coverage_fractions, edge_density, edge_mask, grayscale, join_edge_density,
    join_vector_features, names, sample_band, sample_optical, sample_radar, sobel_magnitude,
    zonal_stats, EdgeMask, OpticalBands, RadarBands, ZonalStats, EDGE_PERCENTILE, ROAD_CELL_THRESHOLD,
};

#[doc(inline)]
pub use raster::{BandRaster, GeoTransform, PixelWindow};

#[doc(inline)]
pub use score::{
    classify, compute_scores, min_max_normalize, score_cells, SensorMode,
    OVERRIDE_PARKING_FRACTION, PROMOTION_PARKING_FRACTION, PROMOTION_PERCENTILE,
};

#[doc(inline)]
pub use district::{aggregate, assign_cells, to_dataframe, District, DistrictAssignment, DistrictSummary};

#[doc(inline)]
pub use pipeline::{
    load_boundary, load_districts, load_lines, load_polygons, read_vector, run, BandPaths,
    InputPaths, OutputPaths, PipelineInputs, RunOutput, RunSummary, SceneMetadata,
    CELLS_FILE, DISTRICTS_FILE, SUMMARY_FILE, SUMMARY_NOTE,
};
