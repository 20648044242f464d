//! # mock-core
//!
//! Shared domain library for the OPCUA Mock operator console.
//!
//! The console wraps an external industrial-protocol server.  The protocol
//! engine itself lives elsewhere; this crate holds the few pieces of logic the
//! console actually owns:
//!
//! - **`domain::session`** – The read-side view of a server session: its id and
//!   the diagnostics fields guarded by the session's diagnostics lock.
//!
//! - **`domain::trust`** – The accept/reject policy applied when the external
//!   certificate validator reports an untrusted client certificate.
//!
//! - **`domain::status`** – Fixed-width status line formatting.
//!
//! - **`domain::heartbeat`** – The shared last-event timestamp that gates
//!   periodic heartbeat reports behind a quiet period.
//!
//! This crate has no async runtime, no sockets and no file system access.

pub mod domain;

pub use domain::heartbeat::HeartbeatState;
pub use domain::session::{
    Session, SessionDiagnostics, SessionEventReason, SessionId, UserIdentity,
};
pub use domain::status::{format_status_line, format_status_line_in, STATUS_REASON};
pub use domain::trust::{decide, TrustDecision, ValidationStatus};
