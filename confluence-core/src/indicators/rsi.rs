//! Relative Strength Index (RSI).
//!
//! Changes: change[0] = 0, change[t] = close[t] - close[t-1].
//! Seed: average gain / loss = mean of the positive / negative parts of
//! changes 1..=period, placed at index `period`.
//! Recurrence (Wilder): avg = (avg * (period - 1) + current) / period.
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss).
//! Edge cases: avg_loss == 0 → NaN (undefined, not 100); a non-finite change
//! contributes zero gain and zero loss.
//! Lookback: period.

use crate::components::indicator::Indicator;
use crate::engine::series::Series;

use super::wilder_step;

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    name: String,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            period,
            name: format!("rsi_{period}"),
        }
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, series: &Series) -> Vec<f64> {
        rsi(series.closes(), self.period)
    }
}

/// Compute RSI over a close series.
pub fn rsi(close: &[f64], period: usize) -> Vec<f64> {
    let n = close.len();
    let mut result = vec![f64::NAN; n];

    if period == 0 || n <= period {
        return result;
    }

    let mut gains = vec![0.0; n];
    let mut losses = vec![0.0; n];
    for i in 1..n {
        let change = close[i] - close[i - 1];
        if change > 0.0 {
            gains[i] = change;
        } else if change < 0.0 {
            losses[i] = -change;
        }
    }

    let mut avg_gain = gains[1..=period].iter().sum::<f64>() / period as f64;
    let mut avg_loss = losses[1..=period].iter().sum::<f64>() / period as f64;
    result[period] = compute_rsi(avg_gain, avg_loss);

    for i in (period + 1)..n {
        avg_gain = wilder_step(avg_gain, gains[i], period);
        avg_loss = wilder_step(avg_loss, losses[i], period);
        result[i] = compute_rsi(avg_gain, avg_loss);
    }

    result
}

fn compute_rsi(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return f64::NAN;
    }
    100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
}
