//! Rule components: the pieces one evaluation is assembled from.
//!
//! - Indicator trait: candle series in, numeric series out
//! - Block filters: hard vetoes checked first, in order
//! - Confirmations: condition booleans, groups and the tally
//! - Levels: entry, stop, targets and trailing stop from ATR
//! - Signal: the immutable output record and its message

pub mod confirmation;
pub mod filter;
pub mod indicator;
pub mod levels;
pub mod signal;

pub use confirmation::{Conditions, ReasonLabels};
pub use filter::{BlockFilter, BlockReason};
pub use indicator::Indicator;
pub use levels::{LevelParams, TradeLevels};
pub use signal::{SignalDirection, TradeSignal};
