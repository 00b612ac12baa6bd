//! Signal engine: per-symbol state, warmup, close intake and evaluation.
//!
//! One `SignalEngine` owns every symbol's series, session VWAP and dedup
//! bookkeeping. A single consumer drives it:
//!
//! 1. `warmup` / `warmup_batch`: bulk-load history, seed today's VWAP
//! 2. `on_close`: append a closed candle; on 5m, reset VWAP at the session
//!    minute, then feed it the typical price
//! 3. `evaluate`: run filters, confirmations and levels, then the
//!    one-per-bar and cooldown gates

pub mod config;
pub mod evaluate;
pub mod intake;
pub mod series;
pub mod session;
pub mod state;

pub use config::{ConfigError, EngineConfig, Preset, ResolvedRules, SymbolOverrides};
pub use evaluate::{Evaluation, IndicatorSnapshot, Verdict, MIN_M5_CANDLES};
pub use intake::{run_intake, IntakeStats};
pub use series::{Series, SeriesSet};
pub use session::{Clock, ManualClock, SessionCalendar, SessionZone, SystemClock};
pub use state::{CooldownPhase, SymbolState};

use std::collections::HashMap;
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, info};

use crate::components::signal::TradeSignal;
use crate::domain::{Candle, ConfigFingerprint, TickSizeMap, Timeframe};

use evaluate::RuleBook;

/// History for one symbol, loaded in one go.
#[derive(Debug, Clone, Default)]
pub struct WarmupBatch {
    pub symbol: String,
    pub h1: Vec<Candle>,
    pub m15: Vec<Candle>,
    pub m5: Vec<Candle>,
}

pub struct SignalEngine {
    rules: RuleBook,
    calendar: SessionCalendar,
    ticks: TickSizeMap,
    clock: Arc<dyn Clock>,
    states: HashMap<String, SymbolState>,
    fingerprint: ConfigFingerprint,
}

impl SignalEngine {
    /// Validate `config`, apply its preset and build the engine.
    pub fn new(
        config: EngineConfig,
        ticks: TickSizeMap,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        let config = config.effective();
        config.validate()?;
        let calendar = config.calendar()?;
        let fingerprint = config.fingerprint();
        info!(
            fingerprint = fingerprint.short(),
            preset = config.preset.map(|p| p.as_str()).unwrap_or("none"),
            confirmations_min = config.confirmations_min_clamped(),
            cooldown_minutes = config.cooldown_minutes,
            "signal engine configured"
        );
        Ok(Self {
            rules: RuleBook::new(config),
            calendar,
            ticks,
            clock,
            states: HashMap::new(),
            fingerprint,
        })
    }

    /// Build with the real system clock.
    pub fn with_system_clock(config: EngineConfig, ticks: TickSizeMap) -> Result<Self, ConfigError> {
        Self::new(config, ticks, Arc::new(SystemClock))
    }

    /// Effective configuration (preset applied).
    pub fn config(&self) -> &EngineConfig {
        &self.rules.config
    }

    pub fn calendar(&self) -> &SessionCalendar {
        &self.calendar
    }

    pub fn fingerprint(&self) -> &ConfigFingerprint {
        &self.fingerprint
    }

    pub fn tick_sizes(&self) -> &TickSizeMap {
        &self.ticks
    }

    /// Known symbols, sorted.
    pub fn symbols(&self) -> Vec<&str> {
        let mut symbols: Vec<&str> = self.states.keys().map(String::as_str).collect();
        symbols.sort_unstable();
        symbols
    }

    pub fn state(&self, symbol: &str) -> Option<&SymbolState> {
        self.states.get(symbol)
    }

    fn cooldown_secs(&self) -> i64 {
        self.rules.config.cooldown_minutes.saturating_mul(60).min(i64::MAX as u64) as i64
    }

    /// Bulk-load history for `symbol`, replacing any existing state.
    ///
    /// Only 5m candles on today's local date (per the injected clock) seed the
    /// session VWAP. No reset check runs during warmup.
    pub fn warmup(&mut self, symbol: &str, h1: &[Candle], m15: &[Candle], m5: &[Candle]) {
        let now = self.clock.now();
        let state = build_warmed_state(&self.calendar, now, h1, m15, m5);
        log_warmup(symbol, &state);
        self.states.insert(symbol.to_string(), state);
    }

    /// Warm many symbols in parallel. Symbols share no state, so each batch
    /// builds independently.
    pub fn warmup_batch(&mut self, batches: Vec<WarmupBatch>) {
        let now = self.clock.now();
        let calendar = self.calendar;
        let built: Vec<(String, SymbolState)> = batches
            .into_par_iter()
            .map(|batch| {
                let state = build_warmed_state(&calendar, now, &batch.h1, &batch.m15, &batch.m5);
                (batch.symbol, state)
            })
            .collect();
        for (symbol, state) in built {
            log_warmup(&symbol, &state);
            self.states.insert(symbol, state);
        }
    }

    /// Append a closed candle. Unknown symbols get an empty state.
    pub fn on_close(&mut self, symbol: &str, timeframe: Timeframe, candle: Candle) {
        let calendar = self.calendar;
        let state = self.states.entry(symbol.to_string()).or_default();
        state.series.append(timeframe, candle);
        if timeframe == Timeframe::M5 {
            if calendar.is_reset_minute(candle.timestamp) {
                debug!(symbol, timestamp = candle.timestamp, "session VWAP reset");
                state.vwap.reset();
            }
            state.vwap.update(candle.typical_price(), candle.volume);
        }
    }

    /// Evaluate the latest 5m bar; `Some` only when a signal is emitted.
    pub fn evaluate(&mut self, symbol: &str) -> Option<TradeSignal> {
        self.evaluate_detailed(symbol).verdict.into_signal()
    }

    /// Evaluate the latest 5m bar and report where the pipeline stopped.
    ///
    /// An emitted signal records the wall-clock send time and bar timestamp,
    /// which arms the cooldown and one-per-bar gates.
    pub fn evaluate_detailed(&mut self, symbol: &str) -> Evaluation {
        let Some(state) = self.states.get(symbol) else {
            return Evaluation::bare(symbol, Verdict::UnknownSymbol);
        };
        let rules = self.rules.config.rules_for(symbol);
        let tick = self.ticks.tick_size(symbol);
        let mut evaluation = self.rules.assess(symbol, state, &rules, tick);

        let Some(bar_timestamp) = evaluation.verdict.signal().map(|s| s.bar_timestamp) else {
            return evaluation;
        };

        let now = self.clock.now();
        let cooldown = self.cooldown_secs();
        if let CooldownPhase::CoolingDown { remaining_secs } = state.cooldown_phase(now, cooldown) {
            debug!(symbol, remaining_secs, "signal suppressed by cooldown");
            evaluation.verdict = Verdict::CoolingDown { remaining_secs };
            return evaluation;
        }

        if let Some(state) = self.states.get_mut(symbol) {
            state.record_emission(now, bar_timestamp);
        }
        if let Some(signal) = evaluation.verdict.signal() {
            info!(
                symbol,
                bar_timestamp,
                confirmations = signal.confirmations,
                entry = signal.levels.entry,
                stop_loss = signal.levels.stop_loss,
                "signal emitted"
            );
        }
        evaluation
    }

    /// Cooldown phase of `symbol` right now; `None` for unknown symbols.
    pub fn cooldown_phase(&self, symbol: &str) -> Option<CooldownPhase> {
        let now = self.clock.now();
        self.states
            .get(symbol)
            .map(|s| s.cooldown_phase(now, self.cooldown_secs()))
    }

    /// Multi-line status text for an operator.
    pub fn status_snapshot(&self, timezone_label: &str) -> String {
        let cfg = &self.rules.config;
        let symbols = self.symbols();
        let mut out = vec![
            "Status:".to_string(),
            format!("Symbols: {}", symbols.join(", ")),
            match self.calendar.offset_at(self.clock.now()) {
                Some(offset) => format!("TZ: {timezone_label} (UTC{offset})"),
                None => format!("TZ: {timezone_label} ({})", self.calendar.zone()),
            },
            "Mode: LONG-only".to_string(),
            format!("Min confirmations: {}/5", cfg.confirmations_min_clamped()),
            format!("RSI1h block: < {}", cfg.rsi1h_block),
            format!("Cooldown: {} min", cfg.cooldown_minutes),
        ];
        for symbol in &symbols {
            let phase = match self.cooldown_phase(symbol) {
                Some(CooldownPhase::CoolingDown { remaining_secs }) => {
                    format!("cooling down ({remaining_secs}s left)")
                }
                _ => "idle".to_string(),
            };
            out.push(format!("  {symbol}: {phase}"));
        }
        out.push(format!("Config: {}", self.fingerprint.short()));
        out.join("\n")
    }
}

fn build_warmed_state(
    calendar: &SessionCalendar,
    now: i64,
    h1: &[Candle],
    m15: &[Candle],
    m5: &[Candle],
) -> SymbolState {
    let mut state = SymbolState::new();
    state.series.h1 = Series::from_candles(h1);
    state.series.m15 = Series::from_candles(m15);
    state.series.m5 = Series::from_candles(m5);
    for candle in m5 {
        if calendar.same_local_day(candle.timestamp, now) {
            state.vwap.update(candle.typical_price(), candle.volume);
        }
    }
    state
}

fn log_warmup(symbol: &str, state: &SymbolState) {
    info!(
        symbol,
        h1 = state.series.h1.len(),
        m15 = state.series.m15.len(),
        m5 = state.series.m5.len(),
        session_bars = state.vwap.len(),
        "warmup complete"
    );
}
