//! End-to-end run: grid, features, classification and district rollup.

mod inputs;
mod output;

use std::path::Path;

use geo::{MultiLineString, MultiPolygon};
use serde::Serialize;

use crate::{
    common::Warnings,
    config::PipelineConfig,
    district::{aggregate, District, DistrictSummary},
    error::PipelineError,
    features::{buffer_roads, join_edge_density, join_vector_features, sample_optical, sample_radar, OpticalBands, RadarBands},
    geom::BooleanOverlay,
    grid::{build_grid, Cell},
    raster::BandRaster,
    score::{score_cells, SensorMode},
};

pub use inputs::{load_boundary, load_districts, load_lines, load_polygons, read_vector, BandPaths, InputPaths, SceneMetadata};
pub use output::{OutputPaths, CELLS_FILE, DISTRICTS_FILE, SUMMARY_FILE};

/// Fixed caveat attached to every run summary.
pub const SUMMARY_NOTE: &str = "Single-scene snapshot. Counts are approximate relative-density \
    priors and should be calibrated against labelled high-resolution tiles.";

/// Everything a run consumes, in the working projection.
#[derive(Debug, Clone)]
pub struct PipelineInputs {
    pub boundary: MultiPolygon<f64>,
    pub parking: Vec<MultiPolygon<f64>>,
    pub road_centrelines: Vec<MultiLineString<f64>>,
    pub road_surfaces: Vec<MultiPolygon<f64>>,
    /// Empty means the whole boundary is a single district.
    pub districts: Vec<District>,
    pub bands: BandPaths,
    pub scene: SceneMetadata,
}

/// Run-level totals written as the summary JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub estimated_total_vehicles: f64,
    pub n_cells: usize,
    pub sensor_mode: SensorMode,
    pub method: SceneMetadata,
    pub notes: String,
    pub warnings: Warnings,
}

/// Result of [`run`]: classified cells, district rows and the summary.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub cells: Vec<Cell>,
    pub districts: Vec<DistrictSummary>,
    pub summary: RunSummary,
}

/// Run every stage on `inputs`.
///
/// Only an invalid configuration or an unusable boundary stops the run; every
/// other problem zero-fills the affected features and is reported in
/// `summary.warnings`.
pub fn run(inputs: &PipelineInputs, config: &PipelineConfig) -> Result<RunOutput, PipelineError> {
    config.validate()?;
    let mut warnings = Warnings::new();

    let mut cells = build_grid(&inputs.boundary, config.grid_size_m)?;

    let mut road_surfaces = buffer_roads(&inputs.road_centrelines, config.road_buffer_m, &mut warnings);
    road_surfaces.extend(inputs.road_surfaces.iter().cloned());
    join_vector_features(&mut cells, &inputs.parking, &road_surfaces, &BooleanOverlay);

    match config.sensor_mode {
        SensorMode::Optical => {
            let bands = OpticalBands {
                blue: load_band("blue", inputs.bands.blue.as_deref(), true, &mut warnings),
                green: load_band("green", inputs.bands.green.as_deref(), true, &mut warnings),
                red: load_band("red", inputs.bands.red.as_deref(), true, &mut warnings),
                nir: load_band("nir", inputs.bands.nir.as_deref(), true, &mut warnings),
            };
            sample_optical(&mut cells, &bands);
            join_edge_density(&mut cells, &bands, &mut warnings);
        }
        SensorMode::Radar => {
            let bands = RadarBands {
                vv: load_band("vv", inputs.bands.vv.as_deref(), true, &mut warnings),
                vh: load_band("vh", inputs.bands.vh.as_deref(), false, &mut warnings),
            };
            sample_radar(&mut cells, &bands);
        }
    }

    score_cells(&mut cells, config);

    let whole_boundary;
    let districts = if inputs.districts.is_empty() {
        whole_boundary = [District::new(0, None, inputs.boundary.clone())];
        &whole_boundary[..]
    } else {
        &inputs.districts[..]
    };
    let district_rows = aggregate(&cells, districts, config.district_assignment);

    let summary = RunSummary {
        estimated_total_vehicles: cells.iter()
            .filter_map(|cell| cell.classification)
            .map(|class| class.approx_count)
            .sum(),
        n_cells: cells.len(),
        sensor_mode: config.sensor_mode,
        method: inputs.scene.clone(),
        notes: SUMMARY_NOTE.to_string(),
        warnings,
    };
    tracing::info!(
        cells = summary.n_cells,
        total = summary.estimated_total_vehicles,
        warnings = summary.warnings.len(),
        "run complete"
    );

    Ok(RunOutput { cells, districts: district_rows, summary })
}

/// Read one band. A band that is absent or unreadable yields `None`; the
/// problem is recorded as a warning when the band is `required` or when a
/// path was given but could not be read.
fn load_band(name: &str, path: Option<&Path>, required: bool, warnings: &mut Warnings) -> Option<BandRaster> {
    let Some(path) = path else {
        if required {
            warnings.push("rasters", format!("no {name} raster provided; {name} features set to 0"));
        } else {
            tracing::debug!(band = name, "optional band not provided");
        }
        return None;
    };

    match BandRaster::from_geotiff(name, path) {
        Ok(raster) => {
            let (rows, cols) = raster.shape();
            tracing::debug!(band = name, rows, cols, "read band");
            Some(raster)
        }
        Err(e) => {
            warnings.push("rasters", format!("failed to read {name} raster {}: {e}; {name} features set to 0", path.display()));
            None
        }
    }
}
