use std::fmt;

use serde::{Deserialize, Serialize};

use crate::features::names;

const OPTICAL_WEIGHTS: [(&str, f64); 4] = [
    (names::BRIGHTNESS, 0.35),
    (names::EDGE_DENSITY, 0.25),
    (names::PARKING_FRACTION, 0.25),
    (names::ROAD_FRACTION, 0.15),
];

const RADAR_WEIGHTS: [(&str, f64); 4] = [
    (names::VV_MEAN, 0.45),
    (names::VV_STD, 0.15),
    (names::PARKING_FRACTION, 0.25),
    (names::ROAD_FRACTION, 0.15),
];

/// Kind of scene the run was built from. Each mode fixes which features
/// enter the composite score and with what weight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorMode {
    #[default]
    Optical,
    Radar,
}

impl SensorMode {
    /// `(feature, weight)` pairs; weights sum to 1.
    #[inline]
    pub fn weights(self) -> &'static [(&'static str, f64)] {
        match self {
            SensorMode::Optical => &OPTICAL_WEIGHTS,
            SensorMode::Radar => &RADAR_WEIGHTS,
        }
    }
}

impl fmt::Display for SensorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SensorMode::Optical => "optical",
            SensorMode::Radar => "radar",
        })
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn weights_sum_to_one() {
        for mode in [SensorMode::Optical, SensorMode::Radar] {
            let total = mode.weights().iter().map(|(_, w)| w).sum::<f64>();
            assert_abs_diff_eq!(total, 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn modes_serialize_lowercase() {
        assert_eq!(serde_json::to_string(&SensorMode::Radar).unwrap(), "\"radar\"");
        assert_eq!(serde_json::from_str::<SensorMode>("\"optical\"").unwrap(), SensorMode::Optical);
        assert_eq!(SensorMode::Radar.weights()[0], (names::VV_MEAN, 0.45));
    }
}
