/// Absolute error below which a band-gap prediction counts as a hit, in eV.
pub const ENERGY_THRESHOLD_EV: f64 = 0.02;

/// Share of predictions whose absolute error is strictly below `threshold`.
///
/// Returns `None` for empty or mismatched inputs.
pub fn energy_within_threshold(predictions: &[f64], targets: &[f64], threshold: f64) -> Option<f64> {
    if predictions.is_empty() || predictions.len() != targets.len() {
        return None;
    }
    let hits = predictions
        .iter()
        .zip(targets)
        .filter(|(p, t)| (*t - *p).abs() < threshold)
        .count();
    Some(hits as f64 / predictions.len() as f64)
}

pub fn mean_absolute_error(predictions: &[f64], targets: &[f64]) -> Option<f64> {
    if predictions.is_empty() || predictions.len() != targets.len() {
        return None;
    }
    let total: f64 = predictions.iter().zip(targets).map(|(p, t)| (t - p).abs()).sum();
    Some(total / predictions.len() as f64)
}
