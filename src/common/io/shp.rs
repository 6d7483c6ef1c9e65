use std::path::Path;

use anyhow::{Context, Result};
use geo::{Coord, Geometry, LineString, MultiLineString, MultiPolygon, Polygon};
use serde_json::{Map, Value};
use shapefile::{self as shp, dbase::FieldValue, PolygonRing, Reader, Shape};

use super::VectorRecord;

/// Read all polygon and polyline shapes, with their attribute rows, from a `.shp` file.
/// Other shape types are skipped.
pub fn read_shapefile(path: &Path) -> Result<Vec<VectorRecord>> {
    let mut reader = Reader::from_path(path)
        .with_context(|| format!("[io::shp] Failed to open shapefile: {}", path.display()))?;

    let mut records = Vec::with_capacity(reader.shape_count()?);
    for (idx, result) in reader.iter_shapes_and_records().enumerate() {
        let (shape, record) = result.context("[io::shp] Error reading shape+record")?;
        let geometry = match shape {
            Shape::Polygon(polygon) => Geometry::MultiPolygon(shp_polygon_to_geo(&polygon)),
            Shape::Polyline(line) => Geometry::MultiLineString(shp_polyline_to_geo(&line)),
            other => {
                tracing::debug!("skipping shape {idx} of type {:?}", other.shapetype());
                continue;
            }
        };

        let mut properties = Map::new();
        for (field, value) in record {
            let value = match value {
                FieldValue::Character(Some(s)) => Value::from(s.trim().to_string()),
                FieldValue::Numeric(Some(n)) | FieldValue::Double(n) => Value::from(n),
                FieldValue::Float(Some(f)) => Value::from(f as f64),
                FieldValue::Integer(i) => Value::from(i),
                _ => continue,
            };
            properties.insert(field, value);
        }
        records.push(VectorRecord { geometry, properties });
    }
    Ok(records)
}

#[inline]
fn ring_to_linestring(points: &[shp::Point]) -> LineString<f64> {
    let mut ls = LineString(points.iter().map(|p| Coord { x: p.x, y: p.y }).collect());
    ls.close();
    ls
}

/// Convert a shapefile polygon to a MultiPolygon. Shapefiles store each outer
/// ring followed by its holes, so holes attach to the most recent outer ring.
fn shp_polygon_to_geo(polygon: &shp::Polygon) -> MultiPolygon<f64> {
    let mut polys = Vec::new();
    let mut exterior: Option<LineString<f64>> = None;
    let mut holes = Vec::new();

    for ring in polygon.rings() {
        match ring {
            PolygonRing::Outer(points) => {
                if let Some(ext) = exterior.replace(ring_to_linestring(points)) {
                    polys.push(Polygon::new(ext, std::mem::take(&mut holes)));
                }
            }
            PolygonRing::Inner(points) => holes.push(ring_to_linestring(points)),
        }
    }
    if let Some(ext) = exterior {
        polys.push(Polygon::new(ext, holes));
    }

    MultiPolygon(polys)
}

fn shp_polyline_to_geo(line: &shp::Polyline) -> MultiLineString<f64> {
    MultiLineString(line.parts().iter()
        .map(|part| LineString(part.iter().map(|p| Coord { x: p.x, y: p.y }).collect()))
        .collect())
}
