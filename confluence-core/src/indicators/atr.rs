//! Average True Range (ATR).
//!
//! True Range: max(high-low, |high-prev_close|, |low-prev_close|), TR[0] = high-low.
//! Any non-finite input gives a NaN TR for that bar.
//! Seed: mean of the finite TR values at indices 1..=period, placed at index `period`.
//! Recurrence (Wilder): ATR = (ATR * (period - 1) + TR) / period. A NaN TR after
//! the seed makes that ATR and every later one NaN.
//! Lookback: period.

use crate::components::indicator::Indicator;
use crate::engine::series::Series;

use super::wilder_step;

#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
    name: String,
}

impl Atr {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ATR period must be >= 1");
        Self {
            period,
            name: format!("atr_{period}"),
        }
    }
}

impl Indicator for Atr {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, series: &Series) -> Vec<f64> {
        atr(series.highs(), series.lows(), series.closes(), self.period)
    }
}

/// Compute the True Range series.
///
/// The three slices must have equal length; extra elements in a longer slice
/// are ignored. A bar whose high, low or previous close is not finite yields
/// NaN rather than whichever term survives `f64::max`.
pub fn true_range(high: &[f64], low: &[f64], close: &[f64]) -> Vec<f64> {
    let n = high.len().min(low.len()).min(close.len());
    let mut tr = vec![f64::NAN; n];

    if n == 0 {
        return tr;
    }

    if high[0].is_finite() && low[0].is_finite() {
        tr[0] = high[0] - low[0];
    }
    for i in 1..n {
        let (h, l, pc) = (high[i], low[i], close[i - 1]);
        if h.is_finite() && l.is_finite() && pc.is_finite() {
            tr[i] = (h - l).max((h - pc).abs()).max((l - pc).abs());
        }
    }

    tr
}

/// Compute ATR with Wilder smoothing.
pub fn atr(high: &[f64], low: &[f64], close: &[f64], period: usize) -> Vec<f64> {
    let tr = true_range(high, low, close);
    let n = tr.len();
    let mut result = vec![f64::NAN; n];

    if period == 0 || n <= period {
        return result;
    }

    let seed: Vec<f64> = tr[1..=period]
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .collect();
    let mut value = if seed.is_empty() {
        f64::NAN
    } else {
        seed.iter().sum::<f64>() / seed.len() as f64
    };
    result[period] = value;

    for i in (period + 1)..n {
        value = wilder_step(value, tr[i], period);
        result[i] = value;
    }

    result
}
