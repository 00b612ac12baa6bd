//! Shared fixtures for integration tests.
//!
//! The uptrend scenario: 300 candles per timeframe ending at 2024-03-01
//! 12:00 UTC, each a rising line with a fixed four-bar wiggle. The last four
//! 5m bars before the close pull back, then the final bar breaks out on triple
//! volume. `uptrend` breaks out with the MACD histogram still negative;
//! `macd_cross` breaks out far enough to turn it positive.

#![allow(dead_code)]

use std::sync::Arc;

use confluence_core::domain::{Candle, TickSizeMap};
use confluence_core::engine::{EngineConfig, ManualClock, SignalEngine};

/// 2024-03-01 12:00:00 UTC
pub const T_END: i64 = 1_709_294_400;

pub const SYMBOL: &str = "BTCUSDT";

const WIGGLE: [f64; 4] = [0.0, 0.6, 0.2, 0.8];

/// Rising candles: close = base + slope·i + wiggle·scale, open = previous close.
pub fn trend(
    n: usize,
    end_ts: i64,
    step: i64,
    base: f64,
    slope: f64,
    scale: f64,
    volume: f64,
) -> Vec<Candle> {
    let mut out = Vec::with_capacity(n);
    let mut prev: Option<f64> = None;
    for i in 0..n {
        let close = base + slope * i as f64 + WIGGLE[i % 4] * scale;
        let open = prev.unwrap_or(close);
        let ts = end_ts - (n - 1 - i) as i64 * step;
        out.push(Candle::new(
            ts,
            open,
            open.max(close) + 0.05,
            open.min(close) - 0.05,
            close,
            volume,
        ));
        prev = Some(close);
    }
    out
}

/// Push the `bars` closes before the last one down by `depth`, re-linking opens.
pub fn pullback(candles: &mut [Candle], bars: usize, depth: f64) {
    let n = candles.len();
    for c in &mut candles[n - 1 - bars..n - 1] {
        c.close -= depth;
    }
    for i in n - 1 - bars..n {
        let prev = candles[i - 1].close;
        let c = &mut candles[i];
        c.open = prev;
        c.high = c.open.max(c.close) + 0.05;
        c.low = c.open.min(c.close) - 0.05;
    }
}

pub struct Scenario {
    pub h1: Vec<Candle>,
    pub m15: Vec<Candle>,
    pub m5: Vec<Candle>,
}

/// The uptrend scenario with a configurable 1h leg and breakout size.
pub fn scenario(h1_base: f64, h1_slope: f64, breakout: f64) -> Scenario {
    let h1 = trend(300, T_END, 3600, h1_base, h1_slope, 1.0, 1000.0);
    let m15 = trend(300, T_END, 900, 100.0, 0.05, 0.5, 1000.0);
    let mut m5 = trend(300, T_END, 300, 100.0, 0.02, 0.25, 1000.0);
    pullback(&mut m5, 4, 0.8);

    let last = m5.len() - 1;
    let c = &mut m5[last];
    c.close += breakout;
    c.high = c.close + 0.02;
    c.low = c.open.min(c.close) - 0.05;
    c.volume = 3000.0;

    Scenario { h1, m15, m5 }
}

pub fn uptrend() -> Scenario {
    scenario(100.0, 0.2, 0.4)
}

/// A breakout strong enough to flip the 5m MACD histogram positive.
pub fn macd_cross() -> Scenario {
    scenario(100.0, 0.2, 0.8)
}

/// 1h falling hard enough to drag its RSI to ~35.
pub fn downtrend_1h() -> Scenario {
    scenario(200.0, -0.2, 0.4)
}

/// The j-th 5m bar after `prev`: +0.05 with a small upper wick.
pub fn follow_up(prev: &Candle, j: i64) -> Candle {
    let close = prev.close + 0.05;
    Candle::new(
        T_END + 300 * j,
        prev.close,
        close + 0.02,
        prev.close - 0.05,
        close,
        1000.0,
    )
}

/// Session anchored at UTC so the scenario's local day is 2024-03-01.
pub fn utc_config() -> EngineConfig {
    EngineConfig {
        utc_offset: "+00:00".to_string(),
        ..Default::default()
    }
}

pub fn ticks() -> TickSizeMap {
    let mut ticks = TickSizeMap::new();
    ticks.insert(SYMBOL, 0.01);
    ticks
}

/// Engine on a manual clock one second after the scenario's last close.
pub fn engine_with(config: EngineConfig) -> (SignalEngine, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(T_END + 1));
    let engine = SignalEngine::new(config, ticks(), clock.clone()).expect("valid config");
    (engine, clock)
}

pub fn warmed(config: EngineConfig, symbol: &str, scenario: &Scenario) -> (SignalEngine, Arc<ManualClock>) {
    let (mut engine, clock) = engine_with(config);
    engine.warmup(symbol, &scenario.h1, &scenario.m15, &scenario.m5);
    (engine, clock)
}

pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}
