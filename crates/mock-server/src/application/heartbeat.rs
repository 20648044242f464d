//! HeartbeatSupervisor: periodic status reports for every live session.
//!
//! The supervisor polls on a fixed interval.  On each poll it reports every
//! live session with the `-Status-` reason, but only once the quiet period has
//! passed since the last report of any kind, so a burst of lifecycle events is
//! never followed by a redundant heartbeat.
//!
//! ```text
//!           ┌──────── poll_interval ────────┐
//!           ▼                               │
//!  Idle ──► Polling ── quiet? ── no ────────┤
//!              │          │                 │
//!              │         yes ─► enumerate ─► claim ─► report ─┘
//!              │
//!              └─ server gone ─► Stopped
//! ```
//!
//! The supervisor holds only a weak reference to the server.  Once the server
//! is dropped the next poll observes it and the loop ends.  Enumeration
//! failures are logged and retried on the next poll; they never end the loop.

use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use mock_core::{HeartbeatState, Session, STATUS_REASON};
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::application::status_reporter::StatusReporter;

/// Default poll interval.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Default quiet period after the last report before a heartbeat may fire.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(6000);

/// Poll interval and quiet period of the heartbeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeartbeatTimings {
    pub poll_interval: Duration,
    pub quiet_period: Duration,
}

impl Default for HeartbeatTimings {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            quiet_period: DEFAULT_QUIET_PERIOD,
        }
    }
}

/// Failure to list the server's sessions.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EnumerationError {
    #[error("session table unavailable: {0}")]
    Unavailable(String),
}

/// Read access to the server's live sessions.
#[cfg_attr(test, mockall::automock)]
pub trait SessionSource: Send + Sync {
    fn live_sessions(&self) -> Result<Vec<Arc<Session>>, EnumerationError>;
}

/// What a single poll did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The server is gone; the loop ends.
    Stopped,
    /// The quiet period has not elapsed; nothing was written.
    Quiet,
    /// Sessions could not be listed; retried on the next poll.
    EnumerationFailed,
    /// This many sessions were reported.
    Reported(usize),
}

pub struct HeartbeatSupervisor {
    server: Weak<dyn SessionSource>,
    state: Arc<HeartbeatState>,
    reporter: StatusReporter,
    timings: HeartbeatTimings,
}

impl HeartbeatSupervisor {
    pub fn new<S: SessionSource + 'static>(
        server: &Arc<S>,
        state: Arc<HeartbeatState>,
        reporter: StatusReporter,
        timings: HeartbeatTimings,
    ) -> Self {
        let server: Weak<S> = Arc::downgrade(server);
        let server: Weak<dyn SessionSource> = server;
        Self {
            server,
            state,
            reporter,
            timings,
        }
    }

    /// Runs one poll as of `now`.
    pub fn tick(&self, now: Instant) -> TickOutcome {
        let Some(server) = self.server.upgrade() else {
            return TickOutcome::Stopped;
        };

        if !self.state.is_quiet(now, self.timings.quiet_period) {
            return TickOutcome::Quiet;
        }

        let sessions = match server.live_sessions() {
            Ok(sessions) => sessions,
            Err(e) => {
                warn!(error = %e, "heartbeat: failed to enumerate sessions");
                return TickOutcome::EnumerationFailed;
            }
        };
        drop(server);

        // A lifecycle event may have been reported while we were listing.
        if !self.state.claim_if_quiet(now, self.timings.quiet_period) {
            debug!("heartbeat: lifecycle event during poll; skipping report");
            return TickOutcome::Quiet;
        }

        for session in &sessions {
            self.reporter.report(session, STATUS_REASON, true);
        }
        TickOutcome::Reported(sessions.len())
    }

    /// Polls until the server is dropped.
    pub async fn run(self) {
        let mut ticker = tokio::time::interval(self.timings.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            poll_ms = self.timings.poll_interval.as_millis() as u64,
            quiet_ms = self.timings.quiet_period.as_millis() as u64,
            "heartbeat supervisor started"
        );

        loop {
            ticker.tick().await;
            match self.tick(Instant::now()) {
                TickOutcome::Stopped => {
                    info!("heartbeat supervisor stopped: server is gone");
                    break;
                }
                TickOutcome::Reported(count) => {
                    debug!(sessions = count, "heartbeat status reported");
                }
                TickOutcome::Quiet | TickOutcome::EnumerationFailed => {}
            }
        }
    }

    /// Spawns [`run`](Self::run) on the current Tokio runtime.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}
