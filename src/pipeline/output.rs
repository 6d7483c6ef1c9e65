use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::{json, Value};

use crate::{
    common::{ensure_dir_exists, io::{multipolygon_to_geojson, write_csv, write_geojson, write_json}},
    district::to_dataframe,
    error::PipelineError,
    grid::Cell,
};
use super::RunOutput;

pub const CELLS_FILE: &str = "traffic_cells.geojson";
pub const DISTRICTS_FILE: &str = "traffic_districts.csv";
pub const SUMMARY_FILE: &str = "traffic_summary.json";

/// Where [`RunOutput::write_to`] put each artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub cells: PathBuf,
    pub districts: PathBuf,
    pub summary: PathBuf,
}

impl RunOutput {
    /// Write the per-cell GeoJSON, the district CSV and the summary JSON into
    /// `dir`, creating it if needed. Existing files are overwritten.
    pub fn write_to(&self, dir: &Path) -> Result<OutputPaths, PipelineError> {
        self.write_files(dir).map_err(|e| PipelineError::Output(format!("{e:#}")))
    }

    fn write_files(&self, dir: &Path) -> Result<OutputPaths> {
        ensure_dir_exists(dir)?;
        let paths = OutputPaths {
            cells: dir.join(CELLS_FILE),
            districts: dir.join(DISTRICTS_FILE),
            summary: dir.join(SUMMARY_FILE),
        };

        write_geojson(&paths.cells, self.cells.iter().map(cell_feature).collect())?;

        let mut df = to_dataframe(&self.districts).context("[output] Failed to build district table")?;
        write_csv(&mut df, &paths.districts)?;

        write_json(&paths.summary, &self.summary)?;

        tracing::info!(dir = %dir.display(), "wrote outputs");
        Ok(paths)
    }
}

/// GeoJSON Feature for one cell with its classification attributes.
fn cell_feature(cell: &Cell) -> Value {
    let class = cell.classification;
    json!({
        "type": "Feature",
        "geometry": multipolygon_to_geojson(cell.geometry()),
        "properties": {
            "cell_id": cell.id(),
            "traffic_level": class.map(|c| c.traffic_level),
            "score": cell.score(),
            "approx_count": class.map_or(0.0, |c| c.approx_count),
            "approx_std": class.map_or(0.0, |c| c.approx_std),
            "is_road_cell": cell.is_road_cell(),
            "parking_fraction": cell.parking_fraction(),
            "road_fraction": cell.road_fraction(),
        },
    })
}
