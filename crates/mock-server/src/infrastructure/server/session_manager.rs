//! SessionManager: the server's table of live sessions.
//!
//! Sessions progress through:
//!
//! ```text
//! create_session ──► Created ──► activate_session ──► Activated
//!                                                        │
//!                          close_session ──► Closing ──► (removed)
//! ```
//!
//! Every transition raises the matching lifecycle notification to the
//! handlers subscribed through [`LifecycleNotifications`].  Handlers run on the
//! caller's task, after the table lock has been released.

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use mock_core::{Session, SessionEventReason, SessionId, UserIdentity};
use tracing::debug;

use super::ServerError;
use crate::application::heartbeat::{EnumerationError, SessionSource};
use crate::application::lifecycle_relay::{LifecycleNotifications, SessionEventHandler};

/// Default limit on concurrently open sessions.
pub const DEFAULT_MAX_SESSIONS: usize = 100;

#[derive(Default)]
struct Subscribers {
    created: Vec<Arc<SessionEventHandler>>,
    activated: Vec<Arc<SessionEventHandler>>,
    closing: Vec<Arc<SessionEventHandler>>,
}

impl Subscribers {
    fn for_reason(&self, reason: SessionEventReason) -> &[Arc<SessionEventHandler>] {
        match reason {
            SessionEventReason::Created => &self.created,
            SessionEventReason::Activated => &self.activated,
            SessionEventReason::Closing => &self.closing,
        }
    }
}

pub struct SessionManager {
    max_sessions: usize,
    // Creation order is kept so status reports list sessions stably.
    sessions: RwLock<Vec<Arc<Session>>>,
    subscribers: RwLock<Subscribers>,
}

impl SessionManager {
    pub fn new(max_sessions: usize) -> Self {
        Self {
            max_sessions,
            sessions: RwLock::new(Vec::new()),
            subscribers: RwLock::new(Subscribers::default()),
        }
    }

    /// Number of open sessions.
    pub fn len(&self) -> usize {
        self.sessions.read().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Looks up an open session.
    pub fn get(&self, id: &SessionId) -> Option<Arc<Session>> {
        let sessions = self.sessions.read().ok()?;
        sessions.iter().find(|s| s.id() == id).cloned()
    }

    /// Opens a new session and raises `Created`.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::TooManySessions`] when the limit is reached.
    pub fn create_session(
        &self,
        session_name: &str,
        now: DateTime<Utc>,
    ) -> Result<Arc<Session>, ServerError> {
        let session = Arc::new(Session::new(SessionId::generate(), session_name, now));
        {
            let mut sessions = self.sessions.write().unwrap_or_else(|p| p.into_inner());
            if sessions.len() >= self.max_sessions {
                return Err(ServerError::TooManySessions {
                    limit: self.max_sessions,
                });
            }
            sessions.push(Arc::clone(&session));
        }
        debug!(session_id = %session.id(), name = session_name, "session created");
        self.raise(&session, SessionEventReason::Created);
        Ok(session)
    }

    /// Activates a session with the given identity and raises `Activated`.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::SessionNotFound`] for an unknown id.
    pub fn activate_session(
        &self,
        id: &SessionId,
        identity: Option<UserIdentity>,
        now: DateTime<Utc>,
    ) -> Result<(), ServerError> {
        let session = self
            .get(id)
            .ok_or_else(|| ServerError::SessionNotFound(id.clone()))?;
        session.set_identity(identity);
        session.touch(now);
        self.raise(&session, SessionEventReason::Activated);
        Ok(())
    }

    /// Records client activity on a session.
    pub fn touch_session(&self, id: &SessionId, now: DateTime<Utc>) -> Result<(), ServerError> {
        let session = self
            .get(id)
            .ok_or_else(|| ServerError::SessionNotFound(id.clone()))?;
        session.touch(now);
        Ok(())
    }

    /// Raises `Closing` and removes the session.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::SessionNotFound`] for an unknown id.
    pub fn close_session(&self, id: &SessionId) -> Result<(), ServerError> {
        let session = self
            .get(id)
            .ok_or_else(|| ServerError::SessionNotFound(id.clone()))?;
        self.raise(&session, SessionEventReason::Closing);
        self.sessions
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .retain(|s| s.id() != id);
        debug!(session_id = %id, "session closed");
        Ok(())
    }

    fn raise(&self, session: &Arc<Session>, reason: SessionEventReason) {
        // Clone the handler list so no lock is held while handlers run.
        let handlers: Vec<Arc<SessionEventHandler>> = match self.subscribers.read() {
            Ok(subs) => subs.for_reason(reason).to_vec(),
            Err(p) => p.into_inner().for_reason(reason).to_vec(),
        };
        for handler in handlers {
            (handler.as_ref())(session, reason);
        }
    }

    fn subscribe(&self, reason: SessionEventReason, handler: SessionEventHandler) {
        let mut subs = self.subscribers.write().unwrap_or_else(|p| p.into_inner());
        let list = match reason {
            SessionEventReason::Created => &mut subs.created,
            SessionEventReason::Activated => &mut subs.activated,
            SessionEventReason::Closing => &mut subs.closing,
        };
        list.push(Arc::new(handler));
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SESSIONS)
    }
}

impl SessionSource for SessionManager {
    fn live_sessions(&self) -> Result<Vec<Arc<Session>>, EnumerationError> {
        self.sessions
            .read()
            .map(|sessions| sessions.clone())
            .map_err(|_| EnumerationError::Unavailable("session table lock poisoned".into()))
    }
}

impl LifecycleNotifications for SessionManager {
    fn on_session_created(&self, handler: SessionEventHandler) {
        self.subscribe(SessionEventReason::Created, handler);
    }

    fn on_session_activated(&self, handler: SessionEventHandler) {
        self.subscribe(SessionEventReason::Activated, handler);
    }

    fn on_session_closing(&self, handler: SessionEventHandler) {
        self.subscribe(SessionEventReason::Closing, handler);
    }
}
