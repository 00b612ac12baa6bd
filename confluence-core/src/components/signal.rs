//! Trade signal: the engine's output for one qualifying 5m close.
//!
//! A signal is immutable once emitted. It carries rounded levels, the
//! confirmation count and the ordered reason list, plus enough context to
//! render the notification text.

use serde::Serialize;

use crate::domain::Timeframe;

use super::levels::TradeLevels;

/// Directional intent of a signal. The engine only emits longs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SignalDirection {
    Long,
}

impl SignalDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalDirection::Long => "LONG",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeSignal {
    pub symbol: String,
    pub direction: SignalDirection,
    pub timeframe: Timeframe,
    /// Close time of the 5m bar that produced the signal.
    pub bar_timestamp: i64,
    pub confirmations: u32,
    pub confirmations_min: u32,
    /// Levels already snapped to the symbol's tick.
    pub levels: TradeLevels,
    pub reasons: Vec<String>,
    /// Decimal places used when printing prices.
    pub precision: usize,
}

impl TradeSignal {
    /// Notification text.
    pub fn message(&self) -> String {
        let p = self.precision;
        let lv = &self.levels;
        let [tp1, tp2, tp3] = lv.take_profits;
        format!(
            "{dir} {sym} {tf} | {count}/5 confirmations (min {min})\n\
             Entry: {entry:.p$}\n\
             SL: {sl:.p$}\n\
             TP1: {tp1:.p$} | TP2: {tp2:.p$} | TP3: {tp3:.p$}\n\
             Trail: {trail:.p$}\n\
             Reasons: {reasons}",
            dir = self.direction.as_str(),
            sym = self.symbol,
            tf = self.timeframe,
            count = self.confirmations,
            min = self.confirmations_min,
            entry = lv.entry,
            sl = lv.stop_loss,
            trail = lv.trailing,
            reasons = self.reasons.join(", "),
        )
    }
}
