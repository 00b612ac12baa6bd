//! Confluence Core: multi-timeframe, long-only signal engine.
//!
//! This crate contains:
//! - Domain types (candles, timeframes, tick sizes)
//! - The indicator library (EMA, RSI, MACD, ATR, session VWAP)
//! - Rule components (block filters, confirmations, trade levels)
//! - The stateful engine: warmup, close intake, evaluation, dedup
//! - Collaborator seams for market data and notifications

pub mod components;
pub mod data;
pub mod domain;
pub mod engine;
pub mod indicators;
pub mod notify;

pub use components::TradeSignal;
pub use domain::{Candle, TickSizeMap, Timeframe};
pub use engine::{EngineConfig, Evaluation, SignalEngine, Verdict};
