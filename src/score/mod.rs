//! Composite scoring and density-tier classification.

mod classify;
mod normalize;
mod sensor;

pub use classify::{classify, compute_scores, score_cells, OVERRIDE_PARKING_FRACTION, PROMOTION_PARKING_FRACTION, PROMOTION_PERCENTILE};
pub use normalize::min_max_normalize;
pub use sensor::SensorMode;
