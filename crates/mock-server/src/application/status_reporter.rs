//! StatusReporter: renders and writes one status line per session.
//!
//! The server mutates session diagnostics from its own tasks, so the line is
//! formatted while holding the session's diagnostics lock.  The guard is
//! released before the line reaches the sink: a slow terminal must never stall
//! the server's writers on the same session.

use std::sync::Arc;

use mock_core::{format_status_line, Session};

/// Destination for console lines.
///
/// Implementations must write each line as a unit; two concurrent callers may
/// not interleave their output.
pub trait LineSink: Send + Sync {
    fn write_line(&self, line: &str);
}

/// Formats session status lines and writes them to a [`LineSink`].
#[derive(Clone)]
pub struct StatusReporter {
    sink: Arc<dyn LineSink>,
}

impl StatusReporter {
    pub fn new(sink: Arc<dyn LineSink>) -> Self {
        Self { sink }
    }

    /// Formats the status line for `session` under its diagnostics lock.
    pub fn format(session: &Session, reason: &str, show_last_contact: bool) -> String {
        let diagnostics = session.lock_diagnostics();
        format_status_line(session.id(), &diagnostics, reason, show_last_contact)
    }

    /// Formats and writes the status line for `session`.
    pub fn report(&self, session: &Session, reason: &str, show_last_contact: bool) {
        let line = Self::format(session, reason, show_last_contact);
        self.sink.write_line(&line);
    }
}
