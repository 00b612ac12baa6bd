//! Block filters: hard vetoes checked before any confirmation is counted.
//!
//! Filters run in a fixed order and the first veto wins. A filter whose
//! inputs are undefined (NaN) never vetoes, except the VWAP position check,
//! which requires a defined VWAP to pass.

use std::fmt;

use serde::Serialize;

use crate::engine::evaluate::IndicatorSnapshot;

use super::confirmation::Conditions;

/// Why a bar was vetoed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "block", rename_all = "snake_case")]
pub enum BlockReason {
    /// 1h RSI under the block threshold.
    Rsi1hBelow { rsi: f64, threshold: f64 },
    /// Close stretched above VWAP+2σ without a recent touch of VWAP+1σ or VWAP.
    ExtendedAboveVwap { close: f64, upper_band: f64 },
    /// Upper wick too long relative to ATR.
    UpperWick { ratio: f64, threshold: f64 },
    /// Close below VWAP and no VWAP reclaim.
    BelowVwap { close: f64, vwap: f64 },
}

impl fmt::Display for BlockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockReason::Rsi1hBelow { rsi, threshold } => {
                write!(f, "1h RSI {rsi:.2} < {threshold}")
            }
            BlockReason::ExtendedAboveVwap { close, upper_band } => {
                write!(f, "close {close} above VWAP+2σ {upper_band:.6} without a pullback")
            }
            BlockReason::UpperWick { ratio, threshold } => {
                write!(f, "upper wick {ratio:.2} ATR > {threshold}")
            }
            BlockReason::BelowVwap { close, vwap } => {
                write!(f, "close {close} below VWAP {vwap:.6} and no reclaim")
            }
        }
    }
}

/// Trait for block filters.
///
/// Filters see only market state for the current bar; dedup and cooldown
/// bookkeeping are handled by the engine after levels are computed.
pub trait BlockFilter: Send + Sync {
    /// Human-readable name (e.g., "rsi_1h_block").
    fn name(&self) -> &str;

    /// Return a veto, or `None` to let the bar through.
    fn check(&self, snapshot: &IndicatorSnapshot, conditions: &Conditions) -> Option<BlockReason>;
}

/// Veto while the 1h RSI sits below `threshold`.
#[derive(Debug, Clone)]
pub struct Rsi1hBlock {
    pub threshold: f64,
}

impl BlockFilter for Rsi1hBlock {
    fn name(&self) -> &str {
        "rsi_1h_block"
    }

    fn check(&self, snapshot: &IndicatorSnapshot, _conditions: &Conditions) -> Option<BlockReason> {
        let rsi = snapshot.rsi_1h;
        (rsi.is_finite() && rsi < self.threshold).then_some(BlockReason::Rsi1hBelow {
            rsi,
            threshold: self.threshold,
        })
    }
}

/// Veto a close above VWAP+2σ unless one of the recent lows touched VWAP+1σ
/// or VWAP.
#[derive(Debug, Clone)]
pub struct ExtensionBlock;

impl BlockFilter for ExtensionBlock {
    fn name(&self) -> &str {
        "vwap_extension_block"
    }

    fn check(&self, snapshot: &IndicatorSnapshot, _conditions: &Conditions) -> Option<BlockReason> {
        let (vwap, upper1, upper2) = (snapshot.vwap, snapshot.bands.plus1, snapshot.bands.plus2);
        if !(vwap.is_finite() && upper2.is_finite() && snapshot.close > upper2) {
            return None;
        }
        let touched = snapshot
            .recent_lows
            .iter()
            .any(|&low| low <= upper1 || low <= vwap);
        (!touched).then_some(BlockReason::ExtendedAboveVwap {
            close: snapshot.close,
            upper_band: upper2,
        })
    }
}

/// Veto when upper wick / ATR exceeds `threshold`. Needs a positive ATR.
#[derive(Debug, Clone)]
pub struct UpperWickBlock {
    pub threshold: f64,
}

impl BlockFilter for UpperWickBlock {
    fn name(&self) -> &str {
        "upper_wick_block"
    }

    fn check(&self, snapshot: &IndicatorSnapshot, _conditions: &Conditions) -> Option<BlockReason> {
        let atr = snapshot.atr;
        if !(atr.is_finite() && atr > 0.0) {
            return None;
        }
        let wick = snapshot.high - snapshot.open.max(snapshot.close);
        let ratio = wick / atr;
        (ratio > self.threshold).then_some(BlockReason::UpperWick {
            ratio,
            threshold: self.threshold,
        })
    }
}

/// Veto unless the close is at or above VWAP or reclaiming it.
#[derive(Debug, Clone)]
pub struct VwapPositionBlock;

impl BlockFilter for VwapPositionBlock {
    fn name(&self) -> &str {
        "vwap_position_block"
    }

    fn check(&self, snapshot: &IndicatorSnapshot, conditions: &Conditions) -> Option<BlockReason> {
        (!conditions.vwap_ok()).then_some(BlockReason::BelowVwap {
            close: snapshot.close,
            vwap: snapshot.vwap,
        })
    }
}

/// The four block filters in evaluation order.
pub fn standard_blocks(rsi1h_block: f64, upper_wick_atr_block: f64) -> Vec<Box<dyn BlockFilter>> {
    vec![
        Box::new(Rsi1hBlock {
            threshold: rsi1h_block,
        }),
        Box::new(ExtensionBlock),
        Box::new(UpperWickBlock {
            threshold: upper_wick_atr_block,
        }),
        Box::new(VwapPositionBlock),
    ]
}

/// First veto across `filters`, in order.
pub fn first_block(
    filters: &[Box<dyn BlockFilter>],
    snapshot: &IndicatorSnapshot,
    conditions: &Conditions,
) -> Option<BlockReason> {
    filters
        .iter()
        .find_map(|filter| filter.check(snapshot, conditions))
}
