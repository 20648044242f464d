//! Operator console output.
//!
//! Plain status and decision lines go to stdout, one `writeln!` under the
//! stdout lock per line.  Structured diagnostics go through `tracing` to
//! stderr and never share a stream with these lines.

use std::io::Write;

use tracing::debug;

use crate::application::status_reporter::LineSink;

pub mod mock;

/// [`LineSink`] writing to the process's stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl LineSink for StdoutSink {
    fn write_line(&self, line: &str) {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        if let Err(e) = writeln!(out, "{line}").and_then(|()| out.flush()) {
            // A closed stdout must not take the monitor down with it.
            debug!(error = %e, "console write failed");
        }
    }
}
