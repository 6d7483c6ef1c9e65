use std::{collections::BTreeMap, fmt};

use geo::{Area, MultiPolygon};
use serde::{Deserialize, Serialize, Serializer};

use crate::features::{names, ROAD_CELL_THRESHOLD};

/// Stable identifier of a grid cell, rendered as `cell_<n>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellId(u32);

impl CellId {
    #[inline] pub(crate) fn new(index: u32) -> Self { Self(index) }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "cell_{}", self.0) }
}

impl Serialize for CellId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Relative density tier of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TrafficLevel { Low, Medium, High }

impl fmt::Display for TrafficLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TrafficLevel::Low => "Low",
            TrafficLevel::Medium => "Medium",
            TrafficLevel::High => "High",
        })
    }
}

/// Output of the classification stage for one cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub score: f64,
    pub traffic_level: TrafficLevel,
    pub approx_count: f64,
    pub approx_std: f64,
}

/// A grid tile clipped to the study boundary.
///
/// Id and geometry are fixed at creation; later stages only add feature
/// columns and, finally, a classification.
#[derive(Debug, Clone)]
pub struct Cell {
    id: CellId,
    geometry: MultiPolygon<f64>,
    area: f64,
    features: BTreeMap<String, f64>,
    pub classification: Option<Classification>,
}

impl Cell {
    pub(crate) fn new(id: CellId, geometry: MultiPolygon<f64>) -> Self {
        Self {
            id,
            area: geometry.unsigned_area(),
            geometry,
            features: BTreeMap::new(),
            classification: None,
        }
    }

    #[inline] pub fn id(&self) -> CellId { self.id }

    #[inline] pub fn geometry(&self) -> &MultiPolygon<f64> { &self.geometry }

    /// Planar area in square units of the working projection.
    #[inline] pub fn area(&self) -> f64 { self.area }

    #[inline] pub fn features(&self) -> &BTreeMap<String, f64> { &self.features }

    /// Value of feature `name`; features never computed read as 0.0.
    #[inline]
    pub fn feature(&self, name: &str) -> f64 {
        self.features.get(name).copied().unwrap_or(0.0)
    }

    /// Set feature `name`. Non-finite values are stored as 0.0.
    pub fn set_feature(&mut self, name: impl Into<String>, value: f64) {
        self.features.insert(name.into(), if value.is_finite() { value } else { 0.0 });
    }

    #[inline] pub fn parking_fraction(&self) -> f64 { self.feature(names::PARKING_FRACTION) }

    #[inline] pub fn road_fraction(&self) -> f64 { self.feature(names::ROAD_FRACTION) }

    /// Whether road surface covers a meaningful share of the cell.
    #[inline] pub fn is_road_cell(&self) -> bool { self.road_fraction() > ROAD_CELL_THRESHOLD }

    /// Composite score, or 0.0 before classification.
    #[inline]
    pub fn score(&self) -> f64 {
        self.classification.map_or(0.0, |c| c.score)
    }
}
