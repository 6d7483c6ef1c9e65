/// Rescale `values` to `[0, 1]` by their batch minimum and maximum. A column
/// with no spread (or no finite values) maps to all zeros.
pub fn min_max_normalize(values: &[f64]) -> Vec<f64> {
    let (min, max) = values.iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));

    let range = max - min;
    if !(range.is_finite() && range > 0.0) {
        return vec![0.0; values.len()];
    }
    values.iter()
        .map(|&v| if v.is_finite() { ((v - min) / range).clamp(0.0, 1.0) } else { 0.0 })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rescales_to_unit_interval() {
        assert_eq!(min_max_normalize(&[2.0, 4.0, 3.0]), vec![0.0, 1.0, 0.5]);
    }

    #[test]
    fn constant_column_is_zero() {
        assert_eq!(min_max_normalize(&[7.0; 4]), vec![0.0; 4]);
        assert!(min_max_normalize(&[]).is_empty());
    }

    #[test]
    fn non_finite_values_are_ignored() {
        assert_eq!(min_max_normalize(&[f64::NAN, 1.0, 3.0]), vec![0.0, 0.0, 1.0]);
    }
}
