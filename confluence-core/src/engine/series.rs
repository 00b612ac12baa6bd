//! Columnar candle storage per (symbol, timeframe).
//!
//! Append-only. Column accessors hand out borrowed slices so the indicator
//! functions read them without copying. There is no eviction: the EMA
//! recurrence depends on the full history, and capping it would shift
//! outputs.

use crate::domain::{Candle, Timeframe};
use tracing::warn;

/// One ordered candle series, stored column-wise.
#[derive(Debug, Clone, Default)]
pub struct Series {
    timestamps: Vec<i64>,
    opens: Vec<f64>,
    highs: Vec<f64>,
    lows: Vec<f64>,
    closes: Vec<f64>,
    volumes: Vec<f64>,
}

impl Series {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            timestamps: Vec::with_capacity(capacity),
            opens: Vec::with_capacity(capacity),
            highs: Vec::with_capacity(capacity),
            lows: Vec::with_capacity(capacity),
            closes: Vec::with_capacity(capacity),
            volumes: Vec::with_capacity(capacity),
        }
    }

    pub fn from_candles(candles: &[Candle]) -> Self {
        let mut series = Self::with_capacity(candles.len());
        for candle in candles {
            series.push(candle);
        }
        series
    }

    /// Append a candle.
    ///
    /// A timestamp at or before the last one violates the caller's ordering
    /// contract; it is logged and appended anyway.
    pub fn append(&mut self, candle: Candle) {
        if let Some(&last) = self.timestamps.last() {
            if candle.timestamp <= last {
                warn!(
                    last_timestamp = last,
                    timestamp = candle.timestamp,
                    "out-of-order candle appended"
                );
            }
        }
        self.push(&candle);
    }

    fn push(&mut self, candle: &Candle) {
        self.timestamps.push(candle.timestamp);
        self.opens.push(candle.open);
        self.highs.push(candle.high);
        self.lows.push(candle.low);
        self.closes.push(candle.close);
        self.volumes.push(candle.volume);
    }

    pub fn timestamps(&self) -> &[i64] {
        &self.timestamps
    }

    pub fn opens(&self) -> &[f64] {
        &self.opens
    }

    pub fn highs(&self) -> &[f64] {
        &self.highs
    }

    pub fn lows(&self) -> &[f64] {
        &self.lows
    }

    pub fn closes(&self) -> &[f64] {
        &self.closes
    }

    pub fn volumes(&self) -> &[f64] {
        &self.volumes
    }

    /// Candle at `index`, if any.
    pub fn get(&self, index: usize) -> Option<Candle> {
        if index >= self.len() {
            return None;
        }
        Some(Candle::new(
            self.timestamps[index],
            self.opens[index],
            self.highs[index],
            self.lows[index],
            self.closes[index],
            self.volumes[index],
        ))
    }

    /// The latest candle.
    pub fn last(&self) -> Option<Candle> {
        self.len().checked_sub(1).and_then(|i| self.get(i))
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}

/// The three timeframe series of one symbol.
#[derive(Debug, Clone, Default)]
pub struct SeriesSet {
    pub h1: Series,
    pub m15: Series,
    pub m5: Series,
}

impl SeriesSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, timeframe: Timeframe) -> &Series {
        match timeframe {
            Timeframe::H1 => &self.h1,
            Timeframe::M15 => &self.m15,
            Timeframe::M5 => &self.m5,
        }
    }

    pub fn get_mut(&mut self, timeframe: Timeframe) -> &mut Series {
        match timeframe {
            Timeframe::H1 => &mut self.h1,
            Timeframe::M15 => &mut self.m15,
            Timeframe::M5 => &mut self.m5,
        }
    }

    pub fn append(&mut self, timeframe: Timeframe, candle: Candle) {
        self.get_mut(timeframe).append(candle);
    }
}
