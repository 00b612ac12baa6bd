//! Session VWAP with dispersion bands.
//!
//! Accumulates price × volume and volume since the last reset. The sigma
//! bands are the mean ± 1σ / 2σ of the session's price observations
//! (population std-dev, unweighted, non-finite entries ignored), which is a
//! different centre from the VWAP itself.

use serde::Serialize;

/// Mean ± 1σ / 2σ of the session's price observations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SigmaBands {
    pub plus1: f64,
    pub plus2: f64,
    pub minus1: f64,
    pub minus2: f64,
}

impl SigmaBands {
    pub const UNDEFINED: SigmaBands = SigmaBands {
        plus1: f64::NAN,
        plus2: f64::NAN,
        minus1: f64::NAN,
        minus2: f64::NAN,
    };
}

#[derive(Debug, Clone, Default)]
pub struct VwapSession {
    cum_price_volume: f64,
    cum_volume: f64,
    prices: Vec<f64>,
}

impl VwapSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all accumulators.
    pub fn reset(&mut self) {
        self.cum_price_volume = 0.0;
        self.cum_volume = 0.0;
        self.prices.clear();
    }

    pub fn update(&mut self, typical_price: f64, volume: f64) {
        self.cum_price_volume += typical_price * volume;
        self.cum_volume += volume;
        self.prices.push(typical_price);
    }

    /// Cumulative price·volume / cumulative volume; NaN with no volume.
    pub fn vwap(&self) -> f64 {
        if self.cum_volume > 0.0 {
            self.cum_price_volume / self.cum_volume
        } else {
            f64::NAN
        }
    }

    pub fn sigma(&self) -> SigmaBands {
        if self.prices.len() < 2 {
            return SigmaBands::UNDEFINED;
        }
        let finite: Vec<f64> = self
            .prices
            .iter()
            .copied()
            .filter(|p| p.is_finite())
            .collect();
        if finite.is_empty() {
            return SigmaBands::UNDEFINED;
        }
        let n = finite.len() as f64;
        let mean = finite.iter().sum::<f64>() / n;
        let variance = finite.iter().map(|p| (p - mean) * (p - mean)).sum::<f64>() / n;
        let sd = variance.sqrt();
        SigmaBands {
            plus1: mean + sd,
            plus2: mean + 2.0 * sd,
            minus1: mean - sd,
            minus2: mean - 2.0 * sd,
        }
    }

    /// Number of observations since the last reset.
    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn vwap_two_equal_volumes() {
        let mut session = VwapSession::new();
        session.update(10.0, 1.0);
        session.update(20.0, 1.0);
        assert_eq!(session.vwap(), 15.0);
    }

    #[test]
    fn vwap_is_volume_weighted() {
        let mut session = VwapSession::new();
        session.update(10.0, 3.0);
        session.update(20.0, 1.0);
        assert_approx(session.vwap(), 12.5, DEFAULT_EPSILON);
    }

    #[test]
    fn vwap_empty_or_zero_volume_is_undefined() {
        let mut session = VwapSession::new();
        assert!(session.vwap().is_nan());
        session.update(10.0, 0.0);
        assert!(session.vwap().is_nan());
    }

    #[test]
    fn sigma_needs_two_observations() {
        let mut session = VwapSession::new();
        assert!(session.sigma().plus1.is_nan());
        session.update(10.0, 1.0);
        let bands = session.sigma();
        assert!(bands.plus1.is_nan());
        assert!(bands.minus2.is_nan());
    }

    #[test]
    fn sigma_uses_unweighted_population_stddev() {
        let mut session = VwapSession::new();
        session.update(10.0, 100.0);
        session.update(20.0, 1.0);
        // mean 15, population sd 5, independent of volume
        let bands = session.sigma();
        assert_approx(bands.plus1, 20.0, DEFAULT_EPSILON);
        assert_approx(bands.plus2, 25.0, DEFAULT_EPSILON);
        assert_approx(bands.minus1, 10.0, DEFAULT_EPSILON);
        assert_approx(bands.minus2, 5.0, DEFAULT_EPSILON);
    }

    #[test]
    fn sigma_ignores_nan_prices() {
        let mut session = VwapSession::new();
        session.update(10.0, 1.0);
        session.update(f64::NAN, 0.0);
        session.update(20.0, 1.0);
        assert_approx(session.sigma().plus1, 20.0, DEFAULT_EPSILON);
    }

    #[test]
    fn reset_clears_everything() {
        let mut session = VwapSession::new();
        session.update(10.0, 1.0);
        session.update(20.0, 1.0);
        session.reset();
        assert!(session.is_empty());
        assert!(session.vwap().is_nan());
        assert!(session.sigma().plus1.is_nan());
    }
}
