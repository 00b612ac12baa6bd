//! Moving Average Convergence Divergence (MACD).
//!
//! Three bands (separate Indicator instances):
//! - Line: EMA(close, fast) - EMA(close, slow)
//! - Signal: EMA(line, signal)
//! - Histogram: line - signal
//!
//! Lookback: slow + signal - 2 for every band.

use crate::components::indicator::{mask_warmup, Indicator};
use crate::engine::series::Series;

use super::ema;

/// Which band of the MACD to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacdBand {
    Line,
    Signal,
    Histogram,
}

/// The three parallel MACD sequences.
#[derive(Debug, Clone, PartialEq)]
pub struct MacdLines {
    pub line: Vec<f64>,
    pub signal: Vec<f64>,
    pub histogram: Vec<f64>,
}

/// Compute the raw MACD sequences. No warmup mask.
pub fn macd(close: &[f64], fast: usize, slow: usize, signal: usize) -> MacdLines {
    let fast_ema = ema(close, fast);
    let slow_ema = ema(close, slow);
    let line: Vec<f64> = fast_ema
        .iter()
        .zip(&slow_ema)
        .map(|(f, s)| f - s)
        .collect();
    let signal_line = ema(&line, signal);
    let histogram = line.iter().zip(&signal_line).map(|(l, s)| l - s).collect();
    MacdLines {
        line,
        signal: signal_line,
        histogram,
    }
}

#[derive(Debug, Clone)]
pub struct Macd {
    fast: usize,
    slow: usize,
    signal: usize,
    band: MacdBand,
    name: String,
}

impl Macd {
    fn with_band(fast: usize, slow: usize, signal: usize, band: MacdBand, label: &str) -> Self {
        assert!(fast >= 1 && slow >= 1 && signal >= 1, "MACD periods must be >= 1");
        Self {
            fast,
            slow,
            signal,
            band,
            name: format!("macd_{label}_{fast}_{slow}_{signal}"),
        }
    }

    pub fn line(fast: usize, slow: usize, signal: usize) -> Self {
        Self::with_band(fast, slow, signal, MacdBand::Line, "line")
    }

    pub fn signal(fast: usize, slow: usize, signal: usize) -> Self {
        Self::with_band(fast, slow, signal, MacdBand::Signal, "signal")
    }

    pub fn histogram(fast: usize, slow: usize, signal: usize) -> Self {
        Self::with_band(fast, slow, signal, MacdBand::Histogram, "hist")
    }

    /// All three bands in one pass, masked to the shared lookback.
    pub fn lines(&self, series: &Series) -> MacdLines {
        let raw = macd(series.closes(), self.fast, self.slow, self.signal);
        let lookback = self.lookback();
        MacdLines {
            line: mask_warmup(raw.line, lookback),
            signal: mask_warmup(raw.signal, lookback),
            histogram: mask_warmup(raw.histogram, lookback),
        }
    }
}

impl Indicator for Macd {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        (self.slow + self.signal).saturating_sub(2)
    }

    fn compute(&self, series: &Series) -> Vec<f64> {
        let lines = self.lines(series);
        match self.band {
            MacdBand::Line => lines.line,
            MacdBand::Signal => lines.signal,
            MacdBand::Histogram => lines.histogram,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_series, DEFAULT_EPSILON};

    #[test]
    fn macd_flat_series_is_zero() {
        let lines = macd(&[50.0; 40], 12, 26, 9);
        for i in 0..40 {
            assert_approx(lines.line[i], 0.0, DEFAULT_EPSILON);
            assert_approx(lines.signal[i], 0.0, DEFAULT_EPSILON);
            assert_approx(lines.histogram[i], 0.0, DEFAULT_EPSILON);
        }
    }

    #[test]
    fn macd_histogram_is_line_minus_signal() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + (i as f64 * 0.7).sin() * 3.0).collect();
        let lines = macd(&closes, 12, 26, 9);
        for i in 0..60 {
            assert_approx(
                lines.histogram[i],
                lines.line[i] - lines.signal[i],
                DEFAULT_EPSILON,
            );
        }
    }

    #[test]
    fn macd_rising_series_has_positive_line() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        let lines = macd(&closes, 12, 26, 9);
        assert!(lines.line[59] > 0.0);
        assert!(lines.line[59] > lines.signal[59]);
    }

    #[test]
    fn macd_bands_mask_shared_lookback() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + i as f64 * 0.5).collect();
        let series = make_series(&closes);
        let hist = Macd::histogram(12, 26, 9);
        assert_eq!(hist.lookback(), 33);
        let values = hist.compute(&series);
        assert!(values[32].is_nan());
        assert!(values[33].is_finite());

        let raw = macd(&closes, 12, 26, 9);
        assert_eq!(Macd::line(12, 26, 9).compute(&series)[39], raw.line[39]);
        assert_eq!(Macd::signal(12, 26, 9).compute(&series)[39], raw.signal[39]);
    }

    #[test]
    fn macd_names() {
        assert_eq!(Macd::line(12, 26, 9).name(), "macd_line_12_26_9");
        assert_eq!(Macd::histogram(5, 13, 4).name(), "macd_hist_5_13_4");
    }
}
