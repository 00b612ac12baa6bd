//! Market data collaborator traits and structured error types.
//!
//! The engine never talks to an exchange. History and tick sizes come in
//! through `MarketDataSource` and `TickSizeLookup`, live closes arrive as
//! `CloseEvent`s, so a REST/WebSocket client, a CSV directory or a test
//! fixture can stand behind the same seam.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{Candle, TickSizeMap, Timeframe};
use crate::engine::WarmupBatch;

/// Structured error types for data operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse CSV {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("invalid candle in {path} row {row}: {reason}")]
    InvalidCandle {
        path: PathBuf,
        row: usize,
        reason: String,
    },

    #[error("no {timeframe} history for symbol '{symbol}'")]
    NoHistory { symbol: String, timeframe: Timeframe },

    #[error("malformed close event: {0}")]
    MalformedEvent(#[from] serde_json::Error),

    #[error("data error: {0}")]
    Other(String),
}

/// A closed candle for one symbol and timeframe, as delivered by a stream.
///
/// Serialized as one JSON object per line:
/// `{"symbol":"BTCUSDT","timeframe":"5m","candle":{"timestamp":...,"open":...}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloseEvent {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub candle: Candle,
}

impl CloseEvent {
    pub fn new(symbol: impl Into<String>, timeframe: Timeframe, candle: Candle) -> Self {
        Self {
            symbol: symbol.into(),
            timeframe,
            candle,
        }
    }

    pub fn from_json_line(line: &str) -> Result<Self, DataError> {
        Ok(serde_json::from_str(line.trim())?)
    }
}

/// Source of historical candles.
pub trait MarketDataSource: Send + Sync {
    /// Human-readable name of this source.
    fn name(&self) -> &str;

    /// Up to `limit` most recent closed candles, oldest first.
    fn history(&self, symbol: &str, timeframe: Timeframe, limit: usize)
        -> Result<Vec<Candle>, DataError>;
}

/// Source of per-symbol tick sizes.
pub trait TickSizeLookup: Send + Sync {
    /// Tick sizes for `symbols`. Symbols the source does not know are left
    /// out; lookups on the returned map fall back to the nominal tick.
    fn tick_sizes(&self, symbols: &[String]) -> Result<TickSizeMap, DataError>;
}

/// Tick sizes fixed in configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticTickSizes {
    map: TickSizeMap,
}

impl StaticTickSizes {
    pub fn new(map: TickSizeMap) -> Self {
        Self { map }
    }
}

impl TickSizeLookup for StaticTickSizes {
    fn tick_sizes(&self, symbols: &[String]) -> Result<TickSizeMap, DataError> {
        Ok(symbols
            .iter()
            .filter(|s| self.map.contains(s))
            .map(|s| (s.clone(), self.map.tick_size(s)))
            .collect())
    }
}

/// In-memory history, keyed by symbol and timeframe.
#[derive(Debug, Clone, Default)]
pub struct MemoryHistory {
    candles: HashMap<(String, Timeframe), Vec<Candle>>,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, symbol: impl Into<String>, timeframe: Timeframe, candles: Vec<Candle>) {
        self.candles.insert((symbol.into(), timeframe), candles);
    }
}

impl MarketDataSource for MemoryHistory {
    fn name(&self) -> &str {
        "memory"
    }

    fn history(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Candle>, DataError> {
        let candles = self
            .candles
            .get(&(symbol.to_string(), timeframe))
            .ok_or_else(|| DataError::NoHistory {
                symbol: symbol.to_string(),
                timeframe,
            })?;
        Ok(last_n(candles, limit).to_vec())
    }
}

/// The last `limit` elements of `candles`.
pub(crate) fn last_n(candles: &[Candle], limit: usize) -> &[Candle] {
    &candles[candles.len().saturating_sub(limit)..]
}

/// Fetch all three timeframes for every symbol, ready for
/// `SignalEngine::warmup_batch`.
pub fn load_warmup(
    source: &dyn MarketDataSource,
    symbols: &[String],
    limit: usize,
) -> Result<Vec<WarmupBatch>, DataError> {
    symbols
        .iter()
        .map(|symbol| {
            Ok(WarmupBatch {
                symbol: symbol.clone(),
                h1: source.history(symbol, Timeframe::H1, limit)?,
                m15: source.history(symbol, Timeframe::M15, limit)?,
                m5: source.history(symbol, Timeframe::M5, limit)?,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candle(ts: i64) -> Candle {
        Candle::new(ts, 1.0, 1.1, 0.9, 1.05, 100.0)
    }

    #[test]
    fn close_event_from_json_line() {
        let line = r#"{"symbol":"BTCUSDT","timeframe":"5m","candle":{"timestamp":1709294400,"open":1.0,"high":1.1,"low":0.9,"close":1.05,"volume":100.0}}"#;
        let event = CloseEvent::from_json_line(line).unwrap();
        assert_eq!(event, CloseEvent::new("BTCUSDT", Timeframe::M5, candle(1_709_294_400)));
    }

    #[test]
    fn close_event_bad_timeframe() {
        let line = r#"{"symbol":"BTCUSDT","timeframe":"4h","candle":{"timestamp":1,"open":1,"high":1,"low":1,"close":1,"volume":1}}"#;
        assert!(matches!(
            CloseEvent::from_json_line(line),
            Err(DataError::MalformedEvent(_))
        ));
    }

    #[test]
    fn static_tick_sizes_filters_to_known() {
        let mut map = TickSizeMap::new();
        map.insert("BTCUSDT", 0.01);
        let lookup = StaticTickSizes::new(map);
        let ticks = lookup
            .tick_sizes(&["BTCUSDT".to_string(), "NEWUSDT".to_string()])
            .unwrap();
        assert_eq!(ticks.len(), 1);
        assert_eq!(ticks.tick_size("BTCUSDT"), 0.01);
        assert_eq!(ticks.tick_size("NEWUSDT"), 0.0001);
    }

    #[test]
    fn memory_history_limits_to_latest() {
        let mut history = MemoryHistory::new();
        history.insert("X", Timeframe::M5, (1..=5).map(|i| candle(i * 300)).collect());
        let got = history.history("X", Timeframe::M5, 2).unwrap();
        assert_eq!(got, vec![candle(1200), candle(1500)]);
        assert_eq!(history.history("X", Timeframe::M5, 50).unwrap().len(), 5);
        assert!(matches!(
            history.history("X", Timeframe::H1, 10),
            Err(DataError::NoHistory { .. })
        ));
    }

    #[test]
    fn load_warmup_fetches_all_timeframes() {
        let mut history = MemoryHistory::new();
        for tf in Timeframe::ALL {
            history.insert("X", tf, vec![candle(300), candle(600)]);
        }
        let batches = load_warmup(&history, &["X".to_string()], 300).unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].symbol, "X");
        assert_eq!(batches[0].m15.len(), 2);

        assert!(load_warmup(&history, &["Y".to_string()], 300).is_err());
    }
}
