use log::warn;

/// Mean of `count` values summing to `sum`.
///
/// A zero count yields `0.0` rather than NaN.
pub fn guarded_mean(sum: f64, count: usize, label: &str) -> f64 {
    if count == 0 {
        warn!("{label} volume has no voxels, reporting a mean of 0");
        return 0.0;
    }
    sum / count as f64
}
