use std::{fs, path::Path};

use anyhow::{anyhow, bail, Context, Result};
use geo::{Coord, Geometry, GeometryCollection, LineString, MultiLineString, MultiPolygon, Point, Polygon};
use serde_json::{json, Map, Value};

/// One feature read from a vector file: its geometry plus its attribute table row.
#[derive(Debug, Clone)]
pub struct VectorRecord {
    pub geometry: Geometry<f64>,
    pub properties: Map<String, Value>,
}

impl VectorRecord {
    /// The string attribute `key`, if present.
    pub fn property_str(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(Value::as_str)
    }
}

/// Read every feature with a supported geometry from a GeoJSON file.
/// Accepts a FeatureCollection, a single Feature, or a bare geometry.
pub fn read_geojson(path: &Path) -> Result<Vec<VectorRecord>> {
    let bytes = fs::read(path)
        .with_context(|| format!("[io::geojson] Failed to read {}", path.display()))?;
    let value: Value = serde_json::from_slice(&bytes)
        .with_context(|| format!("[io::geojson] Failed to parse {}", path.display()))?;

    let kind = value["type"].as_str().map(str::to_owned);
    let features = match kind.as_deref() {
        Some("FeatureCollection") => value["features"].as_array().cloned().unwrap_or_default(),
        Some("Feature") => vec![value],
        Some(_) => vec![json!({ "type": "Feature", "geometry": value, "properties": {} })],
        None => bail!("[io::geojson] {} is not a GeoJSON object", path.display()),
    };

    let mut records = Vec::with_capacity(features.len());
    for (idx, feature) in features.iter().enumerate() {
        if feature["geometry"].is_null() { continue }
        let geometry = parse_geometry(&feature["geometry"])
            .with_context(|| format!("[io::geojson] Invalid geometry in feature {idx}"))?;
        let properties = feature["properties"].as_object().cloned().unwrap_or_default();
        records.push(VectorRecord { geometry, properties });
    }
    Ok(records)
}

/// Write a FeatureCollection built from `features` to `path`.
pub fn write_geojson(path: &Path, features: Vec<Value>) -> Result<()> {
    let collection = json!({
        "type": "FeatureCollection",
        "features": features,
    });
    let bytes = serde_json::to_vec(&collection).context("Failed to serialize GeoJSON")?;
    fs::write(path, bytes)
        .with_context(|| format!("[io::geojson] Failed to write {}", path.display()))
}

/// Convert a MultiPolygon into a GeoJSON geometry object.
pub fn multipolygon_to_geojson(mp: &MultiPolygon<f64>) -> Value {
    let ring = |ls: &LineString<f64>| ls.coords().map(|c| vec![c.x, c.y]).collect::<Vec<_>>();
    let polygons = mp.0.iter()
        .map(|polygon| {
            std::iter::once(ring(polygon.exterior()))
                .chain(polygon.interiors().iter().map(ring))
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();

    json!({
        "type": "MultiPolygon",
        "coordinates": polygons,
    })
}

fn parse_geometry(value: &Value) -> Result<Geometry<f64>> {
    let coords = &value["coordinates"];
    let geometry = match value["type"].as_str() {
        Some("Point") => Geometry::Point(Point::from(parse_coord(coords)?)),
        Some("LineString") => Geometry::LineString(parse_line(coords)?),
        Some("MultiLineString") => Geometry::MultiLineString(MultiLineString(
            as_array(coords)?.iter().map(parse_line).collect::<Result<_>>()?,
        )),
        Some("Polygon") => Geometry::Polygon(parse_polygon(coords)?),
        Some("MultiPolygon") => Geometry::MultiPolygon(MultiPolygon(
            as_array(coords)?.iter().map(parse_polygon).collect::<Result<_>>()?,
        )),
        Some("GeometryCollection") => Geometry::GeometryCollection(GeometryCollection(
            value["geometries"].as_array()
                .ok_or_else(|| anyhow!("GeometryCollection without geometries"))?
                .iter().map(parse_geometry).collect::<Result<_>>()?,
        )),
        other => bail!("Unsupported geometry type {other:?}"),
    };
    Ok(geometry)
}

fn as_array(value: &Value) -> Result<&Vec<Value>> {
    value.as_array().ok_or_else(|| anyhow!("Expected a coordinate array, got {value}"))
}

fn parse_coord(value: &Value) -> Result<Coord<f64>> {
    let pair = as_array(value)?;
    let get = |i: usize| pair.get(i).and_then(Value::as_f64)
        .ok_or_else(|| anyhow!("Invalid coordinate {value}"));
    Ok(Coord { x: get(0)?, y: get(1)? })
}

fn parse_line(value: &Value) -> Result<LineString<f64>> {
    Ok(LineString(as_array(value)?.iter().map(parse_coord).collect::<Result<_>>()?))
}

/// Parse a polygon ring list `[exterior, hole, ...]`, closing rings left open.
fn parse_polygon(value: &Value) -> Result<Polygon<f64>> {
    let mut rings = as_array(value)?.iter()
        .map(|ring| {
            let mut ls = parse_line(ring)?;
            ls.close();
            Ok(ls)
        })
        .collect::<Result<Vec<_>>>()?;
    if rings.is_empty() { bail!("Polygon without an exterior ring") }
    let exterior = rings.remove(0);
    Ok(Polygon::new(exterior, rings))
}

#[cfg(test)]
mod tests {
    use geo::Area;

    use super::*;

    #[test]
    fn reads_mixed_feature_collection() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("features.geojson");
        fs::write(&path, r#"{
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "properties": {"name": "Altstadt"},
                 "geometry": {"type": "Polygon", "coordinates": [[[0,0],[10,0],[10,10],[0,10]]]}},
                {"type": "Feature", "properties": {},
                 "geometry": {"type": "LineString", "coordinates": [[0,0],[5,5]]}},
                {"type": "Feature", "properties": {}, "geometry": null}
            ]
        }"#).unwrap();

        let records = read_geojson(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].property_str("name"), Some("Altstadt"));
        let Geometry::Polygon(polygon) = &records[0].geometry else { panic!("expected polygon") };
        assert!(polygon.exterior().is_closed());
        assert_eq!(polygon.unsigned_area(), 100.0);
        assert!(matches!(records[1].geometry, Geometry::LineString(_)));
    }

    #[test]
    fn written_geometry_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.geojson");
        let square = MultiPolygon(vec![Polygon::new(
            LineString::from(vec![(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0), (0.0, 0.0)]),
            vec![LineString::from(vec![(1.0, 1.0), (2.0, 1.0), (2.0, 2.0), (1.0, 2.0), (1.0, 1.0)])],
        )]);
        let feature = json!({"type": "Feature", "geometry": multipolygon_to_geojson(&square), "properties": {}});
        write_geojson(&path, vec![feature]).unwrap();

        let records = read_geojson(&path).unwrap();
        let Geometry::MultiPolygon(mp) = &records[0].geometry else { panic!("expected multipolygon") };
        assert_eq!(mp.unsigned_area(), 15.0);
    }

    #[test]
    fn rejects_unknown_geometry() {
        assert!(parse_geometry(&json!({"type": "Circle", "coordinates": [0, 0]})).is_err());
    }
}
