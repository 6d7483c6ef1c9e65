use crate::{
    common::percentile,
    config::PipelineConfig,
    grid::{Cell, Classification, TrafficLevel},
};
use super::{min_max_normalize, SensorMode};

/// Non-road cells with less parking cover than this are forced to `Low`.
pub const OVERRIDE_PARKING_FRACTION: f64 = 0.01;

/// Cells with more parking cover than this form the promotion subgroup.
pub const PROMOTION_PARKING_FRACTION: f64 = 0.5;

/// Subgroup members scoring above this percentile of the subgroup become `High`.
pub const PROMOTION_PERCENTILE: f64 = 60.0;

/// Weighted sum of min-max normalised features for every cell, in cell order.
pub fn compute_scores(cells: &[Cell], mode: SensorMode) -> Vec<f64> {
    let mut scores = vec![0.0; cells.len()];
    for &(name, weight) in mode.weights() {
        let column = cells.iter().map(|c| c.feature(name)).collect::<Vec<_>>();
        for (score, value) in scores.iter_mut().zip(min_max_normalize(&column)) {
            *score += weight * value;
        }
    }
    scores
}

/// Assign a tier and count estimate to each cell from the fully computed
/// batch `scores`.
///
/// Tiers come from the configured score percentiles. Two rules then refine
/// them: non-road cells with almost no parking drop to `Low`, and the
/// top-scoring cells of the parking-dominated subgroup rise to `High`.
pub fn classify(cells: &[Cell], scores: &[f64], config: &PipelineConfig) -> Vec<Classification> {
    debug_assert_eq!(cells.len(), scores.len());
    let [lo_q, hi_q] = config.percentile_thresholds;
    let lo = percentile(scores, lo_q).unwrap_or(0.0);
    let hi = percentile(scores, hi_q).unwrap_or(0.0);

    let mut levels = scores.iter()
        .map(|&score| match score {
            s if s <= lo => TrafficLevel::Low,
            s if s <= hi => TrafficLevel::Medium,
            _ => TrafficLevel::High,
        })
        .collect::<Vec<_>>();

    for (level, cell) in levels.iter_mut().zip(cells) {
        if !cell.is_road_cell() && cell.parking_fraction() < OVERRIDE_PARKING_FRACTION {
            *level = TrafficLevel::Low;
        }
    }

    let lots = cells.iter()
        .enumerate()
        .filter(|(_, c)| c.parking_fraction() > PROMOTION_PARKING_FRACTION)
        .map(|(i, _)| i)
        .collect::<Vec<_>>();
    let lot_scores = lots.iter().map(|&i| scores[i]).collect::<Vec<_>>();
    if let Some(cutoff) = percentile(&lot_scores, PROMOTION_PERCENTILE) {
        for &i in &lots {
            if scores[i] > cutoff {
                levels[i] = TrafficLevel::High;
            }
        }
    }

    scores.iter()
        .zip(levels)
        .map(|(&score, traffic_level)| {
            let (approx_count, approx_std) = config.class_count_map.get(traffic_level);
            Classification { score, traffic_level, approx_count, approx_std }
        })
        .collect()
}

/// Score and classify `cells` in place.
pub fn score_cells(cells: &mut [Cell], config: &PipelineConfig) {
    let scores = compute_scores(cells, config.sensor_mode);
    let classes = classify(cells, &scores, config);

    let mut counts = [0usize; 3];
    for (cell, class) in cells.iter_mut().zip(classes) {
        counts[class.traffic_level as usize] += 1;
        cell.classification = Some(class);
    }
    let [low, medium, high] = counts;
    tracing::info!(mode = %config.sensor_mode, low, medium, high, "classified cells");
}
