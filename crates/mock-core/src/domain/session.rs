//! Session entity as seen by the console.
//!
//! The external server owns every session and mutates its diagnostics from its
//! own tasks.  The console only ever holds a transient `Arc<Session>` and reads
//! the diagnostics through [`Session::lock_diagnostics`], which stands in for
//! the server's per-session diagnostics lock.

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of a server session, rendered as node-id text (e.g. `ns=1;g=...`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a GUID session node id in namespace 1.
    pub fn generate() -> Self {
        Self(format!("ns=1;g={}", Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity a client activated its session with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub display_name: String,
}

impl UserIdentity {
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
        }
    }
}

/// Mutable diagnostics of a session.  Always read under the diagnostics lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionDiagnostics {
    pub session_name: String,
    pub client_last_contact: DateTime<Utc>,
    pub identity: Option<UserIdentity>,
}

/// Lifecycle notification raised by the server for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionEventReason {
    Created,
    Activated,
    Closing,
}

impl fmt::Display for SessionEventReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SessionEventReason::Created => "Created",
            SessionEventReason::Activated => "Activated",
            SessionEventReason::Closing => "Closing",
        };
        f.write_str(label)
    }
}

/// A live server session.
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    diagnostics: Mutex<SessionDiagnostics>,
}

impl Session {
    /// Creates a session whose last contact is `created_at`.
    pub fn new(id: SessionId, session_name: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            diagnostics: Mutex::new(SessionDiagnostics {
                session_name: session_name.into(),
                client_last_contact: created_at,
                identity: None,
            }),
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Acquires the diagnostics lock.
    ///
    /// Callers must drop the guard before doing any I/O.  A poisoned lock is
    /// recovered.
    pub fn lock_diagnostics(&self) -> MutexGuard<'_, SessionDiagnostics> {
        self.diagnostics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Records client activity.  The last-contact time never moves backwards.
    pub fn touch(&self, now: DateTime<Utc>) {
        let mut diag = self.lock_diagnostics();
        if now > diag.client_last_contact {
            diag.client_last_contact = now;
        }
    }

    /// Sets the identity the client activated the session with.
    pub fn set_identity(&self, identity: Option<UserIdentity>) {
        self.lock_diagnostics().identity = identity;
    }

    /// Returns a copy of the diagnostics taken under the lock.
    pub fn snapshot(&self) -> SessionDiagnostics {
        self.lock_diagnostics().clone()
    }
}
