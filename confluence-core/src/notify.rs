//! Notification sinks: where formatted signal messages go.
//!
//! Delivery is fire-and-forget from the engine's point of view: a sink logs
//! its own failures and never hands them back to the caller.

use std::io::Write;

use tracing::{info, warn};

pub trait NotificationSink: Send {
    /// Human-readable name (e.g., "stdout", "tracing").
    fn name(&self) -> &str;

    fn deliver(&mut self, recipient: &str, message: &str);
}

/// Emits each message as an `info` event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn name(&self) -> &str {
        "tracing"
    }

    fn deliver(&mut self, recipient: &str, message: &str) {
        info!(recipient, message, "notification");
    }
}

/// Writes each message followed by a blank line.
#[derive(Debug)]
pub struct WriterSink<W: Write + Send> {
    writer: W,
    name: String,
}

impl<W: Write + Send> WriterSink<W> {
    pub fn new(writer: W, name: impl Into<String>) -> Self {
        Self {
            writer,
            name: name.into(),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl WriterSink<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout(), "stdout")
    }
}

impl<W: Write + Send> NotificationSink for WriterSink<W> {
    fn name(&self) -> &str {
        &self.name
    }

    fn deliver(&mut self, recipient: &str, message: &str) {
        let result = writeln!(self.writer, "{message}\n").and_then(|_| self.writer.flush());
        if let Err(e) = result {
            warn!(sink = %self.name, recipient, error = %e, "notification delivery failed");
        }
    }
}

/// Keeps every delivered message, for tests and dry runs.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    delivered: Vec<(String, String)>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(recipient, message)` pairs in delivery order.
    pub fn delivered(&self) -> &[(String, String)] {
        &self.delivered
    }

    pub fn messages(&self) -> Vec<&str> {
        self.delivered.iter().map(|(_, m)| m.as_str()).collect()
    }
}

impl NotificationSink for MemorySink {
    fn name(&self) -> &str {
        "memory"
    }

    fn deliver(&mut self, recipient: &str, message: &str) {
        self.delivered.push((recipient.to_string(), message.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn memory_sink_records_in_order() {
        let mut sink = MemorySink::new();
        sink.deliver("ops", "first");
        sink.deliver("ops", "second");
        assert_eq!(sink.messages(), vec!["first", "second"]);
        assert_eq!(sink.delivered()[0].0, "ops");
    }

    #[test]
    fn writer_sink_separates_messages() {
        let mut sink = WriterSink::new(Vec::new(), "buffer");
        sink.deliver("ops", "LONG A");
        sink.deliver("ops", "LONG B");
        let out = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(out, "LONG A\n\nLONG B\n\n");
    }

    #[test]
    fn writer_sink_swallows_errors() {
        let mut sink = WriterSink::new(BrokenPipe, "broken");
        sink.deliver("ops", "dropped");
        assert_eq!(sink.name(), "broken");
    }

    #[test]
    fn tracing_sink_does_not_panic_without_subscriber() {
        TracingSink.deliver("ops", "hello");
    }
}
