//! CSV candle files as a `MarketDataSource`.
//!
//! Layout: `<dir>/<SYMBOL>_<tf>.csv`, e.g. `BTCUSDT_5m.csv`, with header
//! `timestamp,open,high,low,close,volume`. Rows must be in chronological
//! order; each row is checked with `Candle::is_sane`.

use std::path::{Path, PathBuf};

use crate::domain::{Candle, Timeframe};

use super::provider::{last_n, DataError, MarketDataSource};

#[derive(Debug, Clone)]
pub struct CsvHistory {
    dir: PathBuf,
}

impl CsvHistory {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, symbol: &str, timeframe: Timeframe) -> PathBuf {
        self.dir.join(format!("{symbol}_{timeframe}.csv"))
    }
}

impl MarketDataSource for CsvHistory {
    fn name(&self) -> &str {
        "csv"
    }

    fn history(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Candle>, DataError> {
        let path = self.path_for(symbol, timeframe);
        if !path.exists() {
            return Err(DataError::NoHistory {
                symbol: symbol.to_string(),
                timeframe,
            });
        }
        let candles = read_candles(&path)?;
        Ok(last_n(&candles, limit).to_vec())
    }
}

/// Read every candle from a CSV file.
pub fn read_candles(path: &Path) -> Result<Vec<Candle>, DataError> {
    let mut reader = csv::Reader::from_path(path).map_err(|source| DataError::Csv {
        path: path.to_path_buf(),
        source,
    })?;

    let mut candles = Vec::new();
    for (i, record) in reader.deserialize::<Candle>().enumerate() {
        // Row numbers are 1-based and count the header.
        let row = i + 2;
        let candle = record.map_err(|source| DataError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        if !candle.is_sane() {
            return Err(DataError::InvalidCandle {
                path: path.to_path_buf(),
                row,
                reason: format!(
                    "inconsistent OHLCV (o={} h={} l={} c={} v={})",
                    candle.open, candle.high, candle.low, candle.close, candle.volume
                ),
            });
        }
        if let Some(prev) = candles.last().map(|c: &Candle| c.timestamp) {
            if candle.timestamp <= prev {
                return Err(DataError::InvalidCandle {
                    path: path.to_path_buf(),
                    row,
                    reason: format!("timestamp {} not after {prev}", candle.timestamp),
                });
            }
        }
        candles.push(candle);
    }
    Ok(candles)
}

/// Write candles in the layout `read_candles` expects.
pub fn write_candles(path: &Path, candles: &[Candle]) -> Result<(), DataError> {
    let csv_err = |source| DataError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = csv::Writer::from_path(path).map_err(csv_err)?;
    for candle in candles {
        writer.serialize(candle).map_err(csv_err)?;
    }
    writer.flush().map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })
}
