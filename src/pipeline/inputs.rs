use std::{fs, path::{Path, PathBuf}};

use anyhow::{bail, Context, Result};
use geo::{Geometry, LineString, MultiLineString, MultiPolygon, Polygon};
use serde::{Deserialize, Serialize};

use crate::{
    common::io::{read_geojson, read_shapefile, VectorRecord},
    district::District,
    geom::{dissolve, repair},
};
use super::PipelineInputs;

/// Descriptive metadata of the scene a run was built from, passed through
/// to the run summary untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneMetadata {
    pub product_id: Option<String>,
    pub platform: Option<String>,
    pub acquisition_time: Option<String>,
    pub cloud_cover_percentage: Option<f64>,
}

/// GeoTIFF locations of the sensor bands. Only the bands of the configured
/// sensor mode are read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BandPaths {
    pub blue: Option<PathBuf>,
    pub green: Option<PathBuf>,
    pub red: Option<PathBuf>,
    pub nir: Option<PathBuf>,
    pub vv: Option<PathBuf>,
    pub vh: Option<PathBuf>,
}

fn default_name_field() -> String { "name".to_string() }

/// File locations of every run input, as read from a JSON manifest.
/// Vector layers may be GeoJSON or ESRI shapefiles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputPaths {
    pub boundary: PathBuf,
    pub parking: Option<PathBuf>,
    /// Road centrelines, buffered by `road_buffer_m` before the overlay.
    pub roads: Option<PathBuf>,
    /// Road-surface polygons used as they are.
    pub road_surfaces: Option<PathBuf>,
    pub districts: Option<PathBuf>,
    #[serde(default = "default_name_field")]
    pub district_name_field: String,
    #[serde(default)]
    pub bands: BandPaths,
    #[serde(default)]
    pub scene: SceneMetadata,
}

impl InputPaths {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)
            .with_context(|| format!("[inputs] Failed to read {}", path.display()))?;
        serde_json::from_slice(&bytes)
            .with_context(|| format!("[inputs] Failed to parse {}", path.display()))
    }

    /// Read every vector layer. Rasters are left as paths and read by the run.
    pub fn load(&self) -> Result<PipelineInputs> {
        let optional = |path: &Option<PathBuf>, load: fn(&Path) -> Result<Vec<MultiPolygon<f64>>>| match path {
            Some(path) => load(path),
            None => Ok(Vec::new()),
        };

        let inputs = PipelineInputs {
            boundary: load_boundary(&self.boundary)?,
            parking: optional(&self.parking, load_polygons)?,
            road_centrelines: match &self.roads {
                Some(path) => load_lines(path)?,
                None => Vec::new(),
            },
            road_surfaces: optional(&self.road_surfaces, load_polygons)?,
            districts: match &self.districts {
                Some(path) => load_districts(path, &self.district_name_field)?,
                None => Vec::new(),
            },
            bands: self.bands.clone(),
            scene: self.scene.clone(),
        };

        tracing::info!(
            parking = inputs.parking.len(),
            road_centrelines = inputs.road_centrelines.len(),
            road_surfaces = inputs.road_surfaces.len(),
            districts = inputs.districts.len(),
            "loaded vector inputs"
        );
        Ok(inputs)
    }
}

/// Read a vector file, choosing the format by extension.
pub fn read_vector(path: &Path) -> Result<Vec<VectorRecord>> {
    let is_shapefile = path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("shp"));
    if is_shapefile { read_shapefile(path) } else { read_geojson(path) }
}

/// The study boundary: every polygon in the file, repaired and dissolved.
pub fn load_boundary(path: &Path) -> Result<MultiPolygon<f64>> {
    let parts = load_polygons(path)?;
    if parts.is_empty() {
        bail!("[inputs] No polygon found in boundary file {}", path.display());
    }
    Ok(dissolve(parts.iter().map(repair)))
}

/// One MultiPolygon per record; records without polygonal parts are skipped.
pub fn load_polygons(path: &Path) -> Result<Vec<MultiPolygon<f64>>> {
    let records = read_vector(path)?;
    Ok(records.iter()
        .map(|record| polygons_of(&record.geometry))
        .filter(|mp| !mp.0.is_empty())
        .collect())
}

/// One MultiLineString per record; records without linear parts are skipped.
pub fn load_lines(path: &Path) -> Result<Vec<MultiLineString<f64>>> {
    let records = read_vector(path)?;
    Ok(records.iter()
        .map(|record| lines_of(&record.geometry))
        .filter(|ml| !ml.0.is_empty())
        .collect())
}

/// Districts in file order, named from the `name_field` attribute when present.
pub fn load_districts(path: &Path, name_field: &str) -> Result<Vec<District>> {
    let records = read_vector(path)?;
    Ok(records.iter()
        .filter_map(|record| {
            let geometry = polygons_of(&record.geometry);
            if geometry.0.is_empty() { return None }
            Some((record.property_str(name_field).map(str::to_owned), geometry))
        })
        .enumerate()
        .map(|(id, (name, geometry))| District::new(id, name, geometry))
        .collect())
}

fn polygons_of(geometry: &Geometry<f64>) -> MultiPolygon<f64> {
    fn collect(geometry: &Geometry<f64>, out: &mut Vec<Polygon<f64>>) {
        match geometry {
            Geometry::Polygon(p) => out.push(p.clone()),
            Geometry::MultiPolygon(mp) => out.extend(mp.0.iter().cloned()),
            Geometry::Rect(r) => out.push(r.to_polygon()),
            Geometry::Triangle(t) => out.push(t.to_polygon()),
            Geometry::GeometryCollection(gc) => gc.0.iter().for_each(|g| collect(g, out)),
            _ => {}
        }
    }
    let mut polygons = Vec::new();
    collect(geometry, &mut polygons);
    MultiPolygon(polygons)
}

fn lines_of(geometry: &Geometry<f64>) -> MultiLineString<f64> {
    fn collect(geometry: &Geometry<f64>, out: &mut Vec<LineString<f64>>) {
        match geometry {
            Geometry::Line(l) => out.push(LineString::from(vec![l.start, l.end])),
            Geometry::LineString(ls) => out.push(ls.clone()),
            Geometry::MultiLineString(mls) => out.extend(mls.0.iter().cloned()),
            Geometry::GeometryCollection(gc) => gc.0.iter().for_each(|g| collect(g, out)),
            _ => {}
        }
    }
    let mut lines = Vec::new();
    collect(geometry, &mut lines);
    MultiLineString(lines)
}

#[cfg(test)]
mod tests {
    use geo::Area;

    use super::*;

    fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    const SQUARES: &str = r#"{"type": "FeatureCollection", "features": [
        {"type": "Feature", "properties": {"name": "West"},
         "geometry": {"type": "Polygon", "coordinates": [[[0, 0], [60, 0], [60, 100], [0, 100], [0, 0]]]}},
        {"type": "Feature", "properties": {},
         "geometry": {"type": "Polygon", "coordinates": [[[50, 0], [100, 0], [100, 100], [50, 100], [50, 0]]]}},
        {"type": "Feature", "properties": {"name": "Street"},
         "geometry": {"type": "LineString", "coordinates": [[0, 50], [100, 50]]}}
    ]}"#;

    #[test]
    fn boundary_dissolves_all_polygons() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "boundary.geojson", SQUARES);
        let boundary = load_boundary(&path).unwrap();
        assert!((boundary.unsigned_area() - 10_000.0).abs() < 1e-6);
    }

    #[test]
    fn layers_split_by_geometry_kind() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "mixed.geojson", SQUARES);
        assert_eq!(load_polygons(&path).unwrap().len(), 2);
        assert_eq!(load_lines(&path).unwrap().len(), 1);

        let districts = load_districts(&path, "name").unwrap();
        assert_eq!(districts.len(), 2);
        assert_eq!(districts[0].name.as_deref(), Some("West"));
        assert_eq!((districts[1].id, districts[1].name.as_deref()), (1, None));
    }

    #[test]
    fn boundary_without_polygons_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "line.geojson", r#"{"type": "LineString", "coordinates": [[0, 0], [1, 1]]}"#);
        assert!(load_boundary(&path).is_err());
        assert!(load_boundary(&dir.path().join("missing.geojson")).is_err());
    }

    #[test]
    fn manifest_loads_optional_layers() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "boundary.geojson", SQUARES);
        let manifest = write(dir.path(), "inputs.json", &format!(
            r#"{{"boundary": {:?}, "roads": {:?}, "bands": {{"red": "red.tif"}}, "scene": {{"platform": "Sentinel-2A"}}}}"#,
            dir.path().join("boundary.geojson"),
            dir.path().join("boundary.geojson"),
        ));

        let paths = InputPaths::from_json_file(&manifest).unwrap();
        assert_eq!(paths.district_name_field, "name");
        assert_eq!(paths.bands.red.as_deref(), Some(Path::new("red.tif")));

        let inputs = paths.load().unwrap();
        assert!(inputs.parking.is_empty());
        assert_eq!(inputs.road_centrelines.len(), 1);
        assert!(inputs.districts.is_empty());
        assert_eq!(inputs.scene.platform.as_deref(), Some("Sentinel-2A"));
    }
}
