use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{district::DistrictAssignment, error::PipelineError, grid::TrafficLevel, score::SensorMode};

/// Mean and standard deviation of the vehicle count attached to one density tier.
pub type CountEstimate = (f64, f64);

/// Lookup from density tier to an approximate `(count, std)` per cell.
///
/// Serialized in the `{"Low": [1, 1.0], "Medium": [6, 4.0], "High": [20, 9.0]}` shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassCountMap {
    #[serde(rename = "Low")]
    pub low: CountEstimate,
    #[serde(rename = "Medium")]
    pub medium: CountEstimate,
    #[serde(rename = "High")]
    pub high: CountEstimate,
}

impl Default for ClassCountMap {
    fn default() -> Self {
        Self { low: (1.0, 1.0), medium: (6.0, 4.0), high: (20.0, 9.0) }
    }
}

impl ClassCountMap {
    #[inline]
    pub fn get(&self, level: TrafficLevel) -> CountEstimate {
        match level {
            TrafficLevel::Low => self.low,
            TrafficLevel::Medium => self.medium,
            TrafficLevel::High => self.high,
        }
    }
}

/// Immutable run configuration, passed by reference through every stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Edge length of a grid cell, in metres of the working projection.
    pub grid_size_m: f64,
    /// Radius used to turn road centrelines into road-surface polygons.
    pub road_buffer_m: f64,
    /// Score percentiles separating Low/Medium and Medium/High.
    pub percentile_thresholds: [f64; 2],
    pub class_count_map: ClassCountMap,
    pub sensor_mode: SensorMode,
    pub district_assignment: DistrictAssignment,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            grid_size_m: 50.0,
            road_buffer_m: 3.0,
            percentile_thresholds: [33.0, 67.0],
            class_count_map: ClassCountMap::default(),
            sensor_mode: SensorMode::Optical,
            district_assignment: DistrictAssignment::FirstMatch,
        }
    }
}

impl PipelineConfig {
    /// Load a configuration from a JSON file; absent fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)
            .with_context(|| format!("[config] Failed to read {}", path.display()))?;
        let config: Self = serde_json::from_slice(&bytes)
            .with_context(|| format!("[config] Failed to parse {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make tiling, buffering or classification meaningless.
    pub fn validate(&self) -> Result<(), PipelineError> {
        let invalid = |msg: String| Err(PipelineError::InvalidConfig(msg));

        if !(self.grid_size_m.is_finite() && self.grid_size_m > 0.0) {
            return invalid(format!("grid_size_m must be positive, got {}", self.grid_size_m));
        }
        if !(self.road_buffer_m.is_finite() && self.road_buffer_m >= 0.0) {
            return invalid(format!("road_buffer_m must be non-negative, got {}", self.road_buffer_m));
        }

        let [lo, hi] = self.percentile_thresholds;
        if !(0.0..=100.0).contains(&lo) || !(0.0..=100.0).contains(&hi) || lo > hi {
            return invalid(format!("percentile_thresholds must be ascending within [0, 100], got [{lo}, {hi}]"));
        }

        for level in [TrafficLevel::Low, TrafficLevel::Medium, TrafficLevel::High] {
            let (count, std) = self.class_count_map.get(level);
            if !(count.is_finite() && std.is_finite()) || count < 0.0 || std < 0.0 {
                return invalid(format!("class_count_map entry for {level} must be non-negative, got ({count}, {std})"));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.grid_size_m, 50.0);
        assert_eq!(config.road_buffer_m, 3.0);
        assert_eq!(config.percentile_thresholds, [33.0, 67.0]);
        assert_eq!(config.class_count_map.get(TrafficLevel::High), (20.0, 9.0));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let json = r#"{
            "grid_size_m": 25,
            "sensor_mode": "radar",
            "class_count_map": {"Low": [0, 0.5], "Medium": [4, 2.0], "High": [12, 5.0]}
        }"#;
        let config: PipelineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.grid_size_m, 25.0);
        assert_eq!(config.sensor_mode, SensorMode::Radar);
        assert_eq!(config.road_buffer_m, 3.0);
        assert_eq!(config.class_count_map.get(TrafficLevel::Medium), (4.0, 2.0));
        assert_eq!(config.district_assignment, DistrictAssignment::FirstMatch);
    }

    #[test]
    fn rejects_bad_values() {
        let mut config = PipelineConfig { grid_size_m: 0.0, ..Default::default() };
        assert!(matches!(config.validate(), Err(PipelineError::InvalidConfig(_))));

        config.grid_size_m = 50.0;
        config.percentile_thresholds = [67.0, 33.0];
        assert!(config.validate().is_err());

        config.percentile_thresholds = [33.0, 120.0];
        assert!(config.validate().is_err());

        config.percentile_thresholds = [33.0, 67.0];
        config.class_count_map.high = (-1.0, 9.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"road_buffer_m": 5.5, "district_assignment": "largest_overlap"}"#).unwrap();

        let config = PipelineConfig::from_json_file(&path).unwrap();
        assert_eq!(config.road_buffer_m, 5.5);
        assert_eq!(config.district_assignment, DistrictAssignment::LargestOverlap);

        fs::write(&path, r#"{"grid_size_m": -3}"#).unwrap();
        assert!(PipelineConfig::from_json_file(&path).is_err());
    }
}
