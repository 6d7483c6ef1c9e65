//! Batch statistics shared by the sampling and classification stages.

/// Percentile `q` (0-100) of the finite values, interpolating linearly between
/// the two nearest order statistics. Returns `None` when no finite value exists.
pub fn percentile(values: &[f64], q: f64) -> Option<f64> {
    let mut sorted = values.iter().copied().filter(|v| v.is_finite()).collect::<Vec<_>>();
    if sorted.is_empty() { return None }
    sorted.sort_by(f64::total_cmp);

    let rank = (q / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64))
}

/// Population mean and standard deviation, or `None` for an empty sample.
pub fn mean_std(values: &[f64]) -> Option<(f64, f64)> {
    if values.is_empty() { return None }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
    Some((mean, var.sqrt()))
}
