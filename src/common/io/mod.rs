//! File formats for the vector inputs and the run outputs.

mod csv;
mod geojson;
mod json;
mod shp;

pub use csv::write_csv;
pub use geojson::{read_geojson, write_geojson, multipolygon_to_geojson, VectorRecord};
pub use json::write_json;
pub use shp::read_shapefile;
