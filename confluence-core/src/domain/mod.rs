//! Domain types for the signal engine

pub mod candle;
pub mod ids;
pub mod instrument;
pub mod timeframe;

pub use candle::Candle;
pub use ids::ConfigFingerprint;
pub use instrument::{round_to_tick, tick_precision, TickSizeMap, DEFAULT_TICK_SIZE};
pub use timeframe::{Timeframe, UnknownTimeframe};

/// Symbol type alias
pub type Symbol = String;
