//! LifecycleRelay: prints a status line for every session lifecycle event.
//!
//! The server raises three notifications (created, activated, closing) from
//! its own tasks, possibly for several sessions at once.  For each one the
//! relay first pushes the heartbeat's last-event instant forward, then reports
//! the session with the event name as reason.  Pushing the instant first means
//! a heartbeat poll that races with the event either sees the new instant and
//! stays quiet, or has already claimed its period and reports alongside it.

use std::sync::Arc;
use std::time::Instant;

use mock_core::{HeartbeatState, Session, SessionEventReason};

use crate::application::status_reporter::StatusReporter;

/// Handler invoked by the server for a lifecycle notification.
pub type SessionEventHandler = Box<dyn Fn(&Arc<Session>, SessionEventReason) + Send + Sync>;

/// Subscription surface of the server's session lifecycle notifications.
pub trait LifecycleNotifications {
    fn on_session_created(&self, handler: SessionEventHandler);
    fn on_session_activated(&self, handler: SessionEventHandler);
    fn on_session_closing(&self, handler: SessionEventHandler);
}

pub struct LifecycleRelay {
    heartbeat: Arc<HeartbeatState>,
    reporter: StatusReporter,
}

impl LifecycleRelay {
    pub fn new(heartbeat: Arc<HeartbeatState>, reporter: StatusReporter) -> Self {
        Self {
            heartbeat,
            reporter,
        }
    }

    pub fn on_created(&self, session: &Session) {
        self.on_event(session, SessionEventReason::Created);
    }

    pub fn on_activated(&self, session: &Session) {
        self.on_event(session, SessionEventReason::Activated);
    }

    pub fn on_closing(&self, session: &Session) {
        self.on_event(session, SessionEventReason::Closing);
    }

    pub fn on_event(&self, session: &Session, reason: SessionEventReason) {
        self.on_event_at(session, reason, Instant::now());
    }

    /// Marks the event at `now`, then reports the session.
    pub fn on_event_at(&self, session: &Session, reason: SessionEventReason, now: Instant) {
        self.heartbeat.mark_event(now);
        self.reporter.report(session, &reason.to_string(), false);
    }

    /// Subscribes the relay to all three notifications.  Called once at startup.
    pub fn register<N>(self: &Arc<Self>, server: &N)
    where
        N: LifecycleNotifications + ?Sized,
    {
        let relay = Arc::clone(self);
        server.on_session_created(Box::new(move |session: &Arc<Session>, _| {
            relay.on_created(session)
        }));

        let relay = Arc::clone(self);
        server.on_session_activated(Box::new(move |session: &Arc<Session>, _| {
            relay.on_activated(session)
        }));

        let relay = Arc::clone(self);
        server.on_session_closing(Box::new(move |session: &Arc<Session>, _| {
            relay.on_closing(session)
        }));
    }
}
