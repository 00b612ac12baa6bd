//! Trailing mean and volume-spike detection.
//!
//! The mean ignores non-finite samples; the window shrinks to the series
//! length when fewer samples are available.

/// NaN-ignoring mean of the last `min(window, len)` samples.
///
/// NaN when the window is empty or holds no finite sample.
pub fn trailing_mean(values: &[f64], window: usize) -> f64 {
    let n = window.min(values.len());
    if n == 0 {
        return f64::NAN;
    }
    let (sum, count) = values[values.len() - n..]
        .iter()
        .filter(|v| v.is_finite())
        .fold((0.0, 0usize), |(s, c), &v| (s + v, c + 1));
    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}

/// True when the latest volume exceeds `mult` times the trailing mean.
///
/// The trailing window includes the latest sample. Fewer than two samples in
/// the window never count as a spike.
pub fn volume_spike(volumes: &[f64], window: usize, mult: f64) -> bool {
    let n = window.min(volumes.len());
    if n < 2 {
        return false;
    }
    let latest = volumes[volumes.len() - 1];
    latest > mult * trailing_mean(volumes, window)
}
