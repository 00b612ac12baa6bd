use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Nominal tick used when the exchange did not report one for a symbol.
pub const DEFAULT_TICK_SIZE: f64 = 0.0001;

/// Decimal places implied by a tick size: `max(0, -round(log10(tick)))`.
pub fn tick_precision(tick_size: f64) -> usize {
    let digits = -tick_size.log10().round();
    if digits.is_finite() && digits > 0.0 {
        digits as usize
    } else {
        0
    }
}

/// Round a price to the nearest multiple of `tick_size` (ties to even), then
/// to the tick's decimal precision.
pub fn round_to_tick(price: f64, tick_size: f64) -> f64 {
    if !price.is_finite() {
        return price;
    }
    let tick = sanitize_tick(tick_size);
    let snapped = (price / tick).round_ties_even() * tick;
    let scale = 10f64.powi(tick_precision(tick) as i32);
    (snapped * scale).round_ties_even() / scale
}

fn sanitize_tick(tick_size: f64) -> f64 {
    if tick_size.is_finite() && tick_size > 0.0 {
        tick_size
    } else {
        DEFAULT_TICK_SIZE
    }
}

/// Symbol -> minimum price increment, used only for rounding outputs.
///
/// Fetched once at startup and treated as static for the process lifetime.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TickSizeMap {
    ticks: HashMap<String, f64>,
}

impl TickSizeMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, symbol: impl Into<String>, tick_size: f64) {
        self.ticks.insert(symbol.into(), tick_size);
    }

    /// Tick size for `symbol`, falling back to [`DEFAULT_TICK_SIZE`] when the
    /// symbol is missing or its entry is not a positive number.
    pub fn tick_size(&self, symbol: &str) -> f64 {
        self.ticks
            .get(symbol)
            .copied()
            .map(sanitize_tick)
            .unwrap_or(DEFAULT_TICK_SIZE)
    }

    pub fn precision(&self, symbol: &str) -> usize {
        tick_precision(self.tick_size(symbol))
    }

    pub fn round_price(&self, symbol: &str, price: f64) -> f64 {
        round_to_tick(price, self.tick_size(symbol))
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.ticks.contains_key(symbol)
    }

    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for TickSizeMap {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        Self {
            ticks: iter.into_iter().map(|(s, t)| (s.into(), t)).collect(),
        }
    }
}
