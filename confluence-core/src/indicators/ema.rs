//! Exponential Moving Average (EMA).
//!
//! Recursive: EMA[t] = alpha * x[t] + (1 - alpha) * EMA[t-1], alpha = 2 / (period + 1).
//! Seed: EMA at the first finite input equals that input (no SMA seed).
//! Non-finite inputs after the seed hold the previous smoothed value.
//! Lookback (engine view): period - 1.

use crate::components::indicator::{mask_warmup, Indicator};
use crate::engine::series::Series;

#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
    name: String,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "EMA period must be >= 1");
        Self {
            period,
            name: format!("ema_{period}"),
        }
    }
}

impl Indicator for Ema {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, series: &Series) -> Vec<f64> {
        mask_warmup(ema(series.closes(), self.period), self.lookback())
    }
}

/// Compute raw EMA values over an arbitrary series.
///
/// Positions before the first finite input are NaN. Returns all NaN for
/// `period == 0`.
pub fn ema(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    if period == 0 {
        return result;
    }

    let first = match values.iter().position(|v| v.is_finite()) {
        Some(i) => i,
        None => return result,
    };

    let alpha = 2.0 / (period as f64 + 1.0);
    let mut prev = values[first];
    result[first] = prev;

    for i in (first + 1)..n {
        let x = if values[i].is_finite() { values[i] } else { prev };
        let smoothed = alpha * x + (1.0 - alpha) * prev;
        result[i] = smoothed;
        prev = smoothed;
    }

    result
}
