//! Confirmation conditions, condition groups and the confirmation tally.
//!
//! Every condition is a plain boolean computed from indicator histories.
//! Comparisons against an undefined (NaN) value are false, so an unsettled
//! indicator can only ever withhold a confirmation, never grant one.

use serde::Serialize;

/// Value `k` positions from the end (`k = 1` is the latest), NaN if absent.
pub fn back(values: &[f64], k: usize) -> f64 {
    if k == 0 || k > values.len() {
        return f64::NAN;
    }
    values[values.len() - k]
}

/// MACD turning up: the histogram crosses above zero on the latest bar or has
/// risen two bars running, and the MACD line is above its signal line.
pub fn macd_up(histogram: &[f64], line: f64, signal: f64) -> bool {
    let (h1, h2, h3) = (back(histogram, 1), back(histogram, 2), back(histogram, 3));
    let cross = h2 <= 0.0 && 0.0 < h1;
    let rising = h1 > h2 && h2 > h3;
    (cross || rising) && line > signal
}

/// RSI reclaim on 5m, confirmed by the 15m RSI holding the midline.
///
/// 5m qualifies when it sits at or above `mid`, or when it bounced off `low`
/// two bars ago and now closes above `mid`.
pub fn rsi_reclaim(rsi_5m: &[f64], rsi_15m: f64, low: f64, mid: f64) -> bool {
    let (r1, r2, r3) = (back(rsi_5m, 1), back(rsi_5m, 2), back(rsi_5m, 3));
    let five = r1 >= mid || (r3 <= low && r2 > r3 && r1 > mid);
    five && rsi_15m >= mid
}

/// The latest close crosses above `baseline` after `bars_below` closes under it.
///
/// `closes` and `baseline` are parallel series.
pub fn reclaim(closes: &[f64], baseline: &[f64], bars_below: usize) -> bool {
    let n = closes.len();
    if n < bars_below + 2 || baseline.len() != n {
        return false;
    }
    let below = (n - 1 - bars_below..n - 1).all(|i| closes[i] < baseline[i]);
    below && closes[n - 1] > baseline[n - 1]
}

/// VWAP reclaim: at least 3 of the 4 closes before the latest sat below
/// `vwap`, the latest closes above it, on a volume spike.
pub fn vwap_reclaim(closes: &[f64], vwap: f64, volume_spike: bool) -> bool {
    let n = closes.len();
    if !vwap.is_finite() || n < 5 {
        return false;
    }
    let below = closes[n - 5..n - 1].iter().filter(|&&c| c < vwap).count();
    below >= 3 && closes[n - 1] > vwap && volume_spike
}

/// Individual confirmation conditions for one evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Conditions {
    pub ema_bias_1h: bool,
    pub ema_trend_above_15m: bool,
    pub ema_trend_reclaim_15m: bool,
    pub macd_up: bool,
    pub rsi_reclaim: bool,
    pub vwap_above: bool,
    pub vwap_reclaim: bool,
    pub volume_spike: bool,
}

impl Conditions {
    /// 15m close above, or reclaiming, the trend EMA.
    pub fn ema_trend_15m(&self) -> bool {
        self.ema_trend_above_15m || self.ema_trend_reclaim_15m
    }

    pub fn vwap_ok(&self) -> bool {
        self.vwap_above || self.vwap_reclaim
    }

    pub fn trend(&self) -> bool {
        self.ema_bias_1h || self.ema_trend_15m()
    }

    pub fn momentum(&self, require_macd_and_rsi: bool) -> bool {
        if require_macd_and_rsi {
            self.macd_up && self.rsi_reclaim
        } else {
            self.macd_up || self.rsi_reclaim
        }
    }

    pub fn liquidity(&self) -> bool {
        self.vwap_ok() || self.volume_spike
    }

    /// Trend, momentum and liquidity groups all hold.
    pub fn groups_hold(&self, require_macd_and_rsi: bool) -> bool {
        self.trend() && self.momentum(require_macd_and_rsi) && self.liquidity()
    }

    /// Number of confirmations out of five.
    ///
    /// Volume spike is the sixth candidate and is not counted; it only feeds
    /// the liquidity group and the VWAP reclaim.
    pub fn confirmations(&self) -> u32 {
        let counted = [
            self.ema_bias_1h,
            self.ema_trend_15m(),
            self.macd_up,
            self.rsi_reclaim,
            self.vwap_ok(),
        ];
        counted.iter().filter(|&&c| c).count() as u32
    }

    /// Human-readable reasons for the conditions that hold, in fixed order.
    pub fn reasons(&self, labels: &ReasonLabels) -> Vec<String> {
        let entries = [
            (self.ema_bias_1h, &labels.ema_bias_1h),
            (self.ema_trend_above_15m, &labels.ema_trend_above_15m),
            (self.ema_trend_reclaim_15m, &labels.ema_trend_reclaim_15m),
            (self.macd_up, &labels.macd_up),
            (self.rsi_reclaim, &labels.rsi_reclaim),
            (self.vwap_ok(), &labels.vwap),
            (self.volume_spike, &labels.volume_spike),
        ];
        entries
            .into_iter()
            .filter(|(held, _)| *held)
            .map(|(_, label)| label.clone())
            .collect()
    }
}

/// Reason strings, rendered once from the configured periods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReasonLabels {
    pub ema_bias_1h: String,
    pub ema_trend_above_15m: String,
    pub ema_trend_reclaim_15m: String,
    pub macd_up: String,
    pub rsi_reclaim: String,
    pub vwap: String,
    pub volume_spike: String,
}

impl ReasonLabels {
    pub fn new(
        ema_fast_1h: usize,
        ema_slow_1h: usize,
        ema_trend_15m: usize,
        rsi_mid: f64,
        volume_window: usize,
        volume_mult: f64,
    ) -> Self {
        Self {
            ema_bias_1h: format!("1h EMA{ema_fast_1h}>EMA{ema_slow_1h}"),
            ema_trend_above_15m: format!("Close>EMA{ema_trend_15m}(15m)"),
            ema_trend_reclaim_15m: format!("EMA{ema_trend_15m}(15m) reclaim"),
            macd_up: "MACD up".to_string(),
            rsi_reclaim: format!("RSI5m>{rsi_mid} (+15m>={rsi_mid})"),
            vwap: "VWAP above/reclaim".to_string(),
            volume_spike: format!("Volume>SMA{volume_window} x{volume_mult}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAN: f64 = f64::NAN;

    #[test]
    fn back_indexes_from_end() {
        let v = [1.0, 2.0, 3.0];
        assert_eq!(back(&v, 1), 3.0);
        assert_eq!(back(&v, 3), 1.0);
        assert!(back(&v, 4).is_nan());
        assert!(back(&v, 0).is_nan());
    }

    #[test]
    fn macd_up_on_zero_cross() {
        assert!(macd_up(&[-0.3, -0.1, 0.05], 0.2, 0.1));
        assert!(macd_up(&[0.5, 0.0, 0.05], 0.2, 0.1));
        // Line below signal vetoes.
        assert!(!macd_up(&[-0.3, -0.1, 0.05], 0.1, 0.2));
    }

    #[test]
    fn macd_up_on_two_bar_rise() {
        assert!(macd_up(&[0.1, 0.2, 0.3], 1.0, 0.7));
        assert!(!macd_up(&[0.2, 0.1, 0.3], 1.0, 0.7));
        assert!(!macd_up(&[NAN, NAN, NAN], 1.0, 0.7));
        assert!(!macd_up(&[0.1, 0.2, 0.3], NAN, 0.7));
    }

    #[test]
    fn rsi_reclaim_paths() {
        assert!(rsi_reclaim(&[45.0, 48.0, 50.0], 50.0, 40.0, 50.0));
        // Bounce off the low zone into the midline.
        assert!(!rsi_reclaim(&[38.0, 44.0, 49.0], 55.0, 40.0, 50.0));
        assert!(rsi_reclaim(&[38.0, 44.0, 51.0], 55.0, 40.0, 50.0));
        // 15m must confirm.
        assert!(!rsi_reclaim(&[60.0, 61.0, 62.0], 49.9, 40.0, 50.0));
        assert!(!rsi_reclaim(&[60.0, 61.0, 62.0], NAN, 40.0, 50.0));
        assert!(!rsi_reclaim(&[NAN, NAN, NAN], 60.0, 40.0, 50.0));
    }

    #[test]
    fn reclaim_needs_prior_bars_below() {
        let baseline = [10.0; 5];
        assert!(reclaim(&[11.0, 9.0, 9.5, 9.9, 10.5], &baseline, 3));
        assert!(!reclaim(&[11.0, 10.1, 9.5, 9.9, 10.5], &baseline, 3));
        assert!(!reclaim(&[11.0, 9.0, 9.5, 9.9, 10.0], &baseline, 3));
        assert!(!reclaim(&[9.0, 9.5, 9.9, 10.5], &baseline[..4], 3));
        let undefined = [NAN; 5];
        assert!(!reclaim(&[11.0, 9.0, 9.5, 9.9, 10.5], &undefined, 3));
    }

    #[test]
    fn vwap_reclaim_counts_three_of_four() {
        let closes = [100.0, 99.0, 101.0, 99.5, 99.8, 100.6];
        assert!(vwap_reclaim(&closes, 100.0, true));
        assert!(!vwap_reclaim(&closes, 100.0, false));
        let only_two = [100.0, 101.0, 101.0, 99.5, 99.8, 100.6];
        assert!(!vwap_reclaim(&only_two, 100.0, true));
        assert!(!vwap_reclaim(&closes, NAN, true));
        assert!(!vwap_reclaim(&closes[..4], 100.0, true));
    }

    #[test]
    fn tally_ignores_volume_spike() {
        let all = Conditions {
            ema_bias_1h: true,
            ema_trend_above_15m: true,
            ema_trend_reclaim_15m: true,
            macd_up: true,
            rsi_reclaim: true,
            vwap_above: true,
            vwap_reclaim: true,
            volume_spike: true,
        };
        assert_eq!(all.confirmations(), 5);
        let spike_only = Conditions {
            volume_spike: true,
            ..Default::default()
        };
        assert_eq!(spike_only.confirmations(), 0);
        assert!(spike_only.liquidity());
        assert!(!spike_only.trend());
    }

    #[test]
    fn momentum_override_requires_both() {
        let macd_only = Conditions {
            macd_up: true,
            ..Default::default()
        };
        assert!(macd_only.momentum(false));
        assert!(!macd_only.momentum(true));
    }

    #[test]
    fn reasons_follow_conditions_in_order() {
        let labels = ReasonLabels::new(20, 50, 200, 50.0, 20, 1.5);
        let conditions = Conditions {
            ema_bias_1h: true,
            ema_trend_above_15m: true,
            rsi_reclaim: true,
            vwap_above: true,
            volume_spike: true,
            ..Default::default()
        };
        assert_eq!(
            conditions.reasons(&labels),
            vec![
                "1h EMA20>EMA50",
                "Close>EMA200(15m)",
                "RSI5m>50 (+15m>=50)",
                "VWAP above/reclaim",
                "Volume>SMA20 x1.5",
            ]
        );
    }
}
