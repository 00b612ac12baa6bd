//! Indicator trait.
//!
//! Indicators are pure functions: a candle series in, a numeric series out of
//! the same length. The engine recomputes them on demand for every evaluation;
//! nothing is cached between closes.

use crate::engine::series::Series;

/// Trait for indicators.
///
/// The first `lookback()` values are `f64::NAN` (warmup), so a caller reading
/// the latest value never sees an unsettled number.
///
/// # Look-ahead contamination guard
/// No indicator value at bar t may depend on price data from bar t+1 or later.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "ema_20", "atr_14").
    fn name(&self) -> &str;

    /// Number of bars needed before the indicator produces valid output.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire series.
    fn compute(&self, series: &Series) -> Vec<f64>;

    /// Latest value, NaN when the series is empty or still warming up.
    fn latest(&self, series: &Series) -> f64 {
        self.compute(series).last().copied().unwrap_or(f64::NAN)
    }
}

/// Overwrite the first `lookback` positions with NaN.
pub fn mask_warmup(mut values: Vec<f64>, lookback: usize) -> Vec<f64> {
    let end = lookback.min(values.len());
    for v in &mut values[..end] {
        *v = f64::NAN;
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_warmup_prefix_only() {
        let masked = mask_warmup(vec![1.0, 2.0, 3.0, 4.0], 2);
        assert!(masked[0].is_nan());
        assert!(masked[1].is_nan());
        assert_eq!(&masked[2..], &[3.0, 4.0]);
    }

    #[test]
    fn mask_warmup_longer_than_series() {
        let masked = mask_warmup(vec![1.0, 2.0], 5);
        assert!(masked.iter().all(|v| v.is_nan()));
        assert!(mask_warmup(Vec::new(), 3).is_empty());
    }
}
