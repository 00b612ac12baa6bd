//! Per-bar evaluation: indicator snapshot, confirmation conditions and the
//! verdict that names where the pipeline stopped.
//!
//! Everything here is read-only with respect to engine state. The dedup gate
//! (one signal per bar, cooldown) and its bookkeeping live in `SignalEngine`.

use serde::Serialize;

use crate::components::confirmation::{self, back, Conditions, ReasonLabels};
use crate::components::filter::{first_block, standard_blocks, BlockFilter, BlockReason};
use crate::components::indicator::Indicator;
use crate::components::levels::{LevelParams, TradeLevels};
use crate::components::signal::{SignalDirection, TradeSignal};
use crate::domain::{tick_precision, Timeframe};
use crate::indicators::{volume_spike, Atr, Ema, Macd, Rsi, SigmaBands};

use super::config::{EngineConfig, ResolvedRules};
use super::state::SymbolState;

/// Minimum 5m history before a symbol is evaluated at all.
pub const MIN_M5_CANDLES: usize = 60;

/// Bars (current included) searched for a pullback under the extension block.
pub const RECENT_LOW_BARS: usize = 5;

/// Closes below the 15m trend EMA required before a reclaim counts.
const EMA_RECLAIM_BARS: usize = 3;

/// Latest indicator values for one symbol. NaN means undefined.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorSnapshot {
    pub bar_timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    /// Lows of the last `min(5, len - 1)` 5m bars, current included.
    pub recent_lows: Vec<f64>,
    pub ema_fast_1h: f64,
    pub ema_slow_1h: f64,
    pub rsi_1h: f64,
    pub close_15m: f64,
    pub ema_trend_15m: f64,
    pub rsi_15m: f64,
    pub rsi_5m: f64,
    pub macd_line: f64,
    pub macd_signal: f64,
    pub macd_hist: f64,
    pub atr: f64,
    pub vwap: f64,
    pub bands: SigmaBands,
}

impl IndicatorSnapshot {
    /// A snapshot with every value undefined.
    pub fn empty() -> Self {
        Self {
            bar_timestamp: 0,
            open: f64::NAN,
            high: f64::NAN,
            low: f64::NAN,
            close: f64::NAN,
            volume: f64::NAN,
            recent_lows: Vec::new(),
            ema_fast_1h: f64::NAN,
            ema_slow_1h: f64::NAN,
            rsi_1h: f64::NAN,
            close_15m: f64::NAN,
            ema_trend_15m: f64::NAN,
            rsi_15m: f64::NAN,
            rsi_5m: f64::NAN,
            macd_line: f64::NAN,
            macd_signal: f64::NAN,
            macd_hist: f64::NAN,
            atr: f64::NAN,
            vwap: f64::NAN,
            bands: SigmaBands::UNDEFINED,
        }
    }
}

/// Where an evaluation stopped.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    /// The symbol has never been warmed up or seen a close.
    UnknownSymbol,
    InsufficientData { have: usize, need: usize },
    /// This bar already produced an emission.
    AlreadyEmitted { bar_timestamp: i64 },
    Blocked { reason: BlockReason },
    GroupsFailed {
        trend: bool,
        momentum: bool,
        liquidity: bool,
    },
    BelowMinimum { confirmations: u32, minimum: u32 },
    /// ATR undefined or not positive, so no stop can be placed.
    UndefinedRisk { atr: f64 },
    CoolingDown { remaining_secs: i64 },
    Signal { signal: TradeSignal },
}

impl Verdict {
    pub fn is_signal(&self) -> bool {
        matches!(self, Self::Signal { .. })
    }

    pub fn signal(&self) -> Option<&TradeSignal> {
        match self {
            Self::Signal { signal } => Some(signal),
            _ => None,
        }
    }

    pub fn into_signal(self) -> Option<TradeSignal> {
        match self {
            Self::Signal { signal } => Some(signal),
            _ => None,
        }
    }
}

/// Full diagnostic result of one evaluation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub symbol: String,
    pub verdict: Verdict,
    /// Present once indicators were computed.
    pub snapshot: Option<IndicatorSnapshot>,
    pub conditions: Option<Conditions>,
    pub confirmations: Option<u32>,
}

impl Evaluation {
    pub(crate) fn bare(symbol: &str, verdict: Verdict) -> Self {
        Self {
            symbol: symbol.to_string(),
            verdict,
            snapshot: None,
            conditions: None,
            confirmations: None,
        }
    }
}

/// Indicator instances and block filters built once from configuration.
pub(crate) struct RuleBook {
    pub(crate) config: EngineConfig,
    ema_fast_1h: Ema,
    ema_slow_1h: Ema,
    ema_trend_15m: Ema,
    rsi: Rsi,
    macd: Macd,
    atr: Atr,
    blocks: Vec<Box<dyn BlockFilter>>,
}

impl RuleBook {
    /// `config` must already be validated.
    pub(crate) fn new(config: EngineConfig) -> Self {
        Self {
            ema_fast_1h: Ema::new(config.ema_fast_1h),
            ema_slow_1h: Ema::new(config.ema_slow_1h),
            ema_trend_15m: Ema::new(config.ema_trend_15m),
            rsi: Rsi::new(config.rsi_period),
            macd: Macd::histogram(config.macd_fast, config.macd_slow, config.macd_signal),
            atr: Atr::new(config.atr_period),
            blocks: standard_blocks(config.rsi1h_block, config.upper_wick_atr_block),
            config,
        }
    }

    fn level_params(&self, rules: &ResolvedRules) -> LevelParams {
        let tp = &self.config.tp_multipliers;
        LevelParams {
            atr_sl_mult: rules.atr_sl_mult,
            tp_multipliers: [tp[0], tp[1], tp[2]],
            atr_trailing_mult: self.config.atr_trailing_mult,
            use_vwap_trailing: self.config.use_vwap_trailing,
        }
    }

    fn labels(&self, rules: &ResolvedRules) -> ReasonLabels {
        ReasonLabels::new(
            self.config.ema_fast_1h,
            self.config.ema_slow_1h,
            self.config.ema_trend_15m,
            self.config.rsi_zone_mid,
            self.config.volume_window,
            rules.volume_spike_mult,
        )
    }

    /// Run the pipeline up to (not including) the cooldown gate.
    pub(crate) fn assess(
        &self,
        symbol: &str,
        state: &SymbolState,
        rules: &ResolvedRules,
        tick_size: f64,
    ) -> Evaluation {
        let m5 = &state.series.m5;
        if m5.len() < MIN_M5_CANDLES {
            return Evaluation::bare(
                symbol,
                Verdict::InsufficientData {
                    have: m5.len(),
                    need: MIN_M5_CANDLES,
                },
            );
        }
        let Some(last) = m5.last() else {
            return Evaluation::bare(symbol, Verdict::InsufficientData { have: 0, need: MIN_M5_CANDLES });
        };

        if self.config.one_signal_per_bar && state.already_emitted(last.timestamp) {
            return Evaluation::bare(
                symbol,
                Verdict::AlreadyEmitted {
                    bar_timestamp: last.timestamp,
                },
            );
        }

        let h1 = &state.series.h1;
        let m15 = &state.series.m15;
        let cfg = &self.config;

        let ema_trend_15m = self.ema_trend_15m.compute(m15);
        let rsi_5m = self.rsi.compute(m5);
        let macd = self.macd.lines(m5);
        let lows = m5.lows();
        let recent = RECENT_LOW_BARS.min(lows.len() - 1);

        let snapshot = IndicatorSnapshot {
            bar_timestamp: last.timestamp,
            open: last.open,
            high: last.high,
            low: last.low,
            close: last.close,
            volume: last.volume,
            recent_lows: lows[lows.len() - recent..].to_vec(),
            ema_fast_1h: self.ema_fast_1h.latest(h1),
            ema_slow_1h: self.ema_slow_1h.latest(h1),
            rsi_1h: self.rsi.latest(h1),
            close_15m: back(m15.closes(), 1),
            ema_trend_15m: back(&ema_trend_15m, 1),
            rsi_15m: self.rsi.latest(m15),
            rsi_5m: back(&rsi_5m, 1),
            macd_line: back(&macd.line, 1),
            macd_signal: back(&macd.signal, 1),
            macd_hist: back(&macd.histogram, 1),
            atr: self.atr.latest(m5),
            vwap: state.vwap.vwap(),
            bands: state.vwap.sigma(),
        };

        let spike = volume_spike(m5.volumes(), cfg.volume_window, rules.volume_spike_mult);
        let conditions = Conditions {
            ema_bias_1h: snapshot.ema_fast_1h > snapshot.ema_slow_1h,
            ema_trend_above_15m: snapshot.close_15m > snapshot.ema_trend_15m,
            ema_trend_reclaim_15m: confirmation::reclaim(
                m15.closes(),
                &ema_trend_15m,
                EMA_RECLAIM_BARS,
            ),
            macd_up: confirmation::macd_up(&macd.histogram, snapshot.macd_line, snapshot.macd_signal),
            rsi_reclaim: confirmation::rsi_reclaim(
                &rsi_5m,
                snapshot.rsi_15m,
                cfg.rsi_zone_low,
                cfg.rsi_zone_mid,
            ),
            vwap_above: snapshot.close >= snapshot.vwap,
            vwap_reclaim: confirmation::vwap_reclaim(m5.closes(), snapshot.vwap, spike),
            volume_spike: spike,
        };
        let confirmations = conditions.confirmations();

        let verdict = self.decide(symbol, &snapshot, &conditions, confirmations, rules, tick_size);
        Evaluation {
            symbol: symbol.to_string(),
            verdict,
            snapshot: Some(snapshot),
            conditions: Some(conditions),
            confirmations: Some(confirmations),
        }
    }

    fn decide(
        &self,
        symbol: &str,
        snapshot: &IndicatorSnapshot,
        conditions: &Conditions,
        confirmations: u32,
        rules: &ResolvedRules,
        tick_size: f64,
    ) -> Verdict {
        if let Some(reason) = first_block(&self.blocks, snapshot, conditions) {
            return Verdict::Blocked { reason };
        }

        if !conditions.groups_hold(rules.require_macd_and_rsi) {
            return Verdict::GroupsFailed {
                trend: conditions.trend(),
                momentum: conditions.momentum(rules.require_macd_and_rsi),
                liquidity: conditions.liquidity(),
            };
        }
        if confirmations < rules.confirmations_min {
            return Verdict::BelowMinimum {
                confirmations,
                minimum: rules.confirmations_min,
            };
        }

        let params = self.level_params(rules);
        let Some(levels) =
            TradeLevels::compute(snapshot.high, snapshot.close, snapshot.atr, snapshot.vwap, &params)
        else {
            return Verdict::UndefinedRisk { atr: snapshot.atr };
        };

        Verdict::Signal {
            signal: TradeSignal {
                symbol: symbol.to_string(),
                direction: SignalDirection::Long,
                timeframe: Timeframe::M5,
                bar_timestamp: snapshot.bar_timestamp,
                confirmations,
                confirmations_min: rules.confirmations_min,
                levels: levels.rounded(tick_size),
                reasons: conditions.reasons(&self.labels(rules)),
                precision: tick_precision(tick_size),
            },
        }
    }
}
