//! Close-event intake: feed a stream of closes through the engine and hand
//! emitted messages to a sink.

use serde::Serialize;
use tracing::{debug, warn};

use crate::data::CloseEvent;
use crate::domain::Timeframe;
use crate::notify::NotificationSink;

use super::SignalEngine;

/// Counters for one intake run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IntakeStats {
    pub events: usize,
    pub evaluations: usize,
    pub signals: usize,
    /// Events rejected before reaching the engine (unparseable lines).
    pub rejected: usize,
}

/// Drive `events` through `engine`, evaluating after every 5m close.
///
/// Events must be in non-decreasing timestamp order per symbol. `Err` items
/// are counted as rejected and skipped.
pub fn run_intake<I, E>(
    engine: &mut SignalEngine,
    events: I,
    sink: &mut dyn NotificationSink,
    recipient: &str,
) -> IntakeStats
where
    I: IntoIterator<Item = Result<CloseEvent, E>>,
    E: std::fmt::Display,
{
    let mut stats = IntakeStats::default();
    for event in events {
        let event = match event {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, "skipping close event");
                stats.rejected += 1;
                continue;
            }
        };
        stats.events += 1;
        engine.on_close(&event.symbol, event.timeframe, event.candle);
        if event.timeframe != Timeframe::M5 {
            continue;
        }

        stats.evaluations += 1;
        let evaluation = engine.evaluate_detailed(&event.symbol);
        match evaluation.verdict.signal() {
            Some(signal) => {
                sink.deliver(recipient, &signal.message());
                stats.signals += 1;
            }
            None => debug!(symbol = %event.symbol, verdict = ?evaluation.verdict, "no signal"),
        }
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DataError;
    use crate::domain::{Candle, TickSizeMap};
    use crate::engine::{EngineConfig, ManualClock};
    use crate::notify::MemorySink;
    use std::sync::Arc;

    #[test]
    fn counts_events_and_evaluations() {
        let mut engine = SignalEngine::new(
            EngineConfig::default(),
            TickSizeMap::new(),
            Arc::new(ManualClock::new(0)),
        )
        .unwrap();
        let candle = Candle::new(300, 1.0, 1.1, 0.9, 1.0, 10.0);
        let events: Vec<Result<CloseEvent, DataError>> = vec![
            Ok(CloseEvent::new("X", Timeframe::H1, candle)),
            Ok(CloseEvent::new("X", Timeframe::M5, candle)),
            Err(DataError::Other("garbled".into())),
            Ok(CloseEvent::new("X", Timeframe::M15, candle)),
        ];
        let mut sink = MemorySink::new();
        let stats = run_intake(&mut engine, events, &mut sink, "ops");
        assert_eq!(
            stats,
            IntakeStats {
                events: 3,
                evaluations: 1,
                signals: 0,
                rejected: 1,
            }
        );
        assert!(sink.delivered().is_empty());
    }
}
