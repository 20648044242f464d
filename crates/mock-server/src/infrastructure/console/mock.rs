//! Recording doubles for unit and integration tests.
//!
//! [`RecordingSink`] captures every console line instead of printing it.
//! [`EventCapture`] is a `tracing_subscriber` layer that keeps every trace
//! event, so tests can assert on what reached the log as well.

use std::fmt;
use std::sync::{Arc, Mutex};

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

use crate::application::status_reporter::LineSink;

/// A [`LineSink`] that keeps every written line in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    lines: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of all lines written so far.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().expect("lock poisoned").clone()
    }

    /// Number of lines containing `needle`.
    pub fn count_containing(&self, needle: &str) -> usize {
        self.lines
            .lock()
            .expect("lock poisoned")
            .iter()
            .filter(|l| l.contains(needle))
            .count()
    }

    /// Discards all recorded lines.
    pub fn clear(&self) {
        self.lines.lock().expect("lock poisoned").clear();
    }
}

impl LineSink for RecordingSink {
    fn write_line(&self, line: &str) {
        self.lines
            .lock()
            .expect("lock poisoned")
            .push(line.to_string());
    }
}

// ── Trace capture ─────────────────────────────────────────────────────────────

/// One trace event as seen by [`EventCapture`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedEvent {
    pub target: String,
    pub level: Level,
    pub message: String,
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
}

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        }
    }
}

/// A layer that records every event it sees.  Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct EventCapture {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl EventCapture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of all events recorded so far.
    pub fn events(&self) -> Vec<CapturedEvent> {
        self.events.lock().expect("lock poisoned").clone()
    }

    /// Events recorded on `target`.
    pub fn on_target(&self, target: &str) -> Vec<CapturedEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.target == target)
            .collect()
    }
}

impl<S: Subscriber> Layer<S> for EventCapture {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        self.events.lock().expect("lock poisoned").push(CapturedEvent {
            target: event.metadata().target().to_string(),
            level: *event.metadata().level(),
            message: visitor.message,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::layer::SubscriberExt;

    #[test]
    fn test_recording_sink_keeps_lines_in_order() {
        let sink = RecordingSink::new();
        sink.write_line("first");
        sink.write_line("second");
        assert_eq!(sink.lines(), vec!["first", "second"]);
    }

    #[test]
    fn test_count_containing_and_clear() {
        let sink = RecordingSink::new();
        sink.write_line("Accepted Certificate: CN=a");
        sink.write_line("Rejected Certificate: BadCertificateUntrusted CN=b");
        assert_eq!(sink.count_containing("Certificate"), 2);
        assert_eq!(sink.count_containing("Accepted"), 1);

        sink.clear();
        assert!(sink.lines().is_empty());
    }

    #[test]
    fn test_event_capture_records_target_level_and_message() {
        // Arrange
        let capture = EventCapture::new();
        let subscriber = tracing_subscriber::registry().with(capture.clone());

        // Act
        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(target: "security", subject = "CN=a", "rejected {}", "CN=a");
            tracing::info!("unrelated");
        });

        // Assert
        assert_eq!(
            capture.on_target("security"),
            vec![CapturedEvent {
                target: "security".to_string(),
                level: Level::WARN,
                message: "rejected CN=a".to_string(),
            }]
        );
        assert_eq!(capture.events().len(), 2);
    }
}
