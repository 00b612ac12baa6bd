//! Concrete indicator implementations.
//!
//! Every indicator is available twice: as a plain function over slices
//! (`ema`, `rsi`, `macd`, `atr`) and as an `Indicator` implementation over a
//! candle `Series` that masks its warmup window.
//!
//! MACD is a multi-series indicator and is exposed as separate named
//! instances per band, keeping the single-series `Indicator` trait unchanged.
//! The session VWAP is stateful and lives outside the trait.

pub mod atr;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;
pub mod vwap;

pub use atr::{atr, true_range, Atr};
pub use ema::{ema, Ema};
pub use macd::{macd, Macd, MacdBand, MacdLines};
pub use rsi::{rsi, Rsi};
pub use sma::{trailing_mean, volume_spike};
pub use vwap::{SigmaBands, VwapSession};

/// One step of Wilder smoothing: (prev * (period - 1) + current) / period.
pub(crate) fn wilder_step(prev: f64, current: f64, period: usize) -> f64 {
    let p = period as f64;
    (prev * (p - 1.0) + current) / p
}

/// Create a synthetic 5m series from close prices for testing.
///
/// Generates plausible OHLCV: open = prev_close (or close for first candle),
/// high = max(open,close) + 1.0, low = min(open,close) - 1.0, volume = 1000.
#[cfg(test)]
pub fn make_series(closes: &[f64]) -> crate::engine::series::Series {
    crate::engine::series::Series::from_candles(&make_candles(closes))
}

#[cfg(test)]
pub fn make_candles(closes: &[f64]) -> Vec<crate::domain::Candle> {
    use crate::domain::Candle;
    let base_ts = 1_704_153_600; // 2024-01-02 00:00 UTC
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            let high = open.max(close) + 1.0;
            let low = open.min(close) - 1.0;
            Candle::new(base_ts + 300 * i as i64, open, high, low, close, 1000.0)
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
