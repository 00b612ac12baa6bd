//! Trade levels: entry, stop-loss, take-profits and trailing stop.
//!
//! Risk unit R = ATR × stop multiplier. Entry sits one basis point above the
//! higher of the bar's high and close; stops and targets are measured from
//! the entry in units of R. Every price is snapped to the symbol's tick.

use serde::Serialize;

use crate::domain::round_to_tick;

/// Entry premium over max(high, close).
pub const ENTRY_BUFFER: f64 = 1.0001;

/// Multipliers that shape the levels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelParams {
    pub atr_sl_mult: f64,
    pub tp_multipliers: [f64; 3],
    pub atr_trailing_mult: f64,
    pub use_vwap_trailing: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TradeLevels {
    pub entry: f64,
    pub stop_loss: f64,
    pub take_profits: [f64; 3],
    pub trailing: f64,
}

impl TradeLevels {
    /// Raw (unrounded) levels; `None` when ATR is undefined or not positive.
    pub fn compute(high: f64, close: f64, atr: f64, vwap: f64, params: &LevelParams) -> Option<Self> {
        if !(atr.is_finite() && atr > 0.0) {
            return None;
        }
        let entry = high.max(close) * ENTRY_BUFFER;
        let risk = atr * params.atr_sl_mult;
        let take_profits = params.tp_multipliers.map(|m| entry + m * risk);

        let trail_atr = close - params.atr_trailing_mult * atr;
        let trail_vwap = if params.use_vwap_trailing && vwap.is_finite() {
            vwap
        } else {
            trail_atr
        };

        Some(Self {
            entry,
            stop_loss: entry - risk,
            take_profits,
            trailing: trail_atr.max(trail_vwap),
        })
    }

    /// Copy with every price snapped to `tick`.
    pub fn rounded(&self, tick: f64) -> Self {
        Self {
            entry: round_to_tick(self.entry, tick),
            stop_loss: round_to_tick(self.stop_loss, tick),
            take_profits: self.take_profits.map(|tp| round_to_tick(tp, tick)),
            trailing: round_to_tick(self.trailing, tick),
        }
    }
}
