//! Data collaborators: history sources, tick sizes, close events.

pub mod csv_history;
pub mod provider;

pub use csv_history::{read_candles, write_candles, CsvHistory};
pub use provider::{
    load_warmup, CloseEvent, DataError, MarketDataSource, MemoryHistory, StaticTickSizes,
    TickSizeLookup,
};
