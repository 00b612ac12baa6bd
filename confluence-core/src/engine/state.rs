//! Per-symbol mutable state: series, session VWAP and dedup bookkeeping.

use serde::Serialize;

use crate::indicators::VwapSession;

use super::series::SeriesSet;

/// Cooldown phase of one symbol, derived lazily from the last send time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum CooldownPhase {
    Idle,
    CoolingDown { remaining_secs: i64 },
}

/// Everything the engine owns for one symbol.
#[derive(Debug, Clone, Default)]
pub struct SymbolState {
    pub series: SeriesSet,
    pub vwap: VwapSession,
    /// Wall-clock unix seconds of the last emission.
    pub last_sent_at: Option<i64>,
    /// Timestamp of the 5m bar that produced the last emission.
    pub last_bar_emitted: Option<i64>,
}

impl SymbolState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Phase at wall-clock `now`. Idle once `cooldown_secs` have elapsed.
    pub fn cooldown_phase(&self, now: i64, cooldown_secs: i64) -> CooldownPhase {
        match self.last_sent_at {
            Some(sent) if now - sent < cooldown_secs => CooldownPhase::CoolingDown {
                remaining_secs: cooldown_secs - (now - sent),
            },
            _ => CooldownPhase::Idle,
        }
    }

    /// True when the bar at `bar_timestamp` already produced an emission.
    pub fn already_emitted(&self, bar_timestamp: i64) -> bool {
        self.last_bar_emitted == Some(bar_timestamp)
    }

    pub fn record_emission(&mut self, now: i64, bar_timestamp: i64) {
        self.last_sent_at = Some(now);
        self.last_bar_emitted = Some(bar_timestamp);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_state_is_idle() {
        let state = SymbolState::new();
        assert_eq!(state.cooldown_phase(1_000, 600), CooldownPhase::Idle);
        assert!(!state.already_emitted(300));
    }

    #[test]
    fn cooldown_expires_lazily() {
        let mut state = SymbolState::new();
        state.record_emission(1_000, 900);
        assert_eq!(
            state.cooldown_phase(1_000, 600),
            CooldownPhase::CoolingDown { remaining_secs: 600 }
        );
        assert_eq!(
            state.cooldown_phase(1_599, 600),
            CooldownPhase::CoolingDown { remaining_secs: 1 }
        );
        assert_eq!(state.cooldown_phase(1_600, 600), CooldownPhase::Idle);
        assert!(state.already_emitted(900));
        assert!(!state.already_emitted(1_200));
    }

    #[test]
    fn zero_cooldown_never_cools() {
        let mut state = SymbolState::new();
        state.record_emission(1_000, 900);
        assert_eq!(state.cooldown_phase(1_000, 0), CooldownPhase::Idle);
    }
}
