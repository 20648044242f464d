//! Server infrastructure: the collaborators the console supervises.
//!
//! # Sub-modules
//!
//! - **`session_manager`** – The server's session table.  Creates, activates
//!   and closes sessions, raises the lifecycle notifications and lists the
//!   live sessions for the heartbeat.
//!
//! - **`certificate_validator`** – Decides whether a client certificate is
//!   trusted and, when it is not, asks the registered handler whether to
//!   accept it anyway.
//!
//! - **`endpoint_host`** – Binds the configured endpoint URLs and runs a
//!   small line-oriented session protocol over TCP that drives the two
//!   modules above.

use std::net::SocketAddr;

use mock_core::{SessionId, ValidationStatus};
use thiserror::Error;

pub mod certificate_validator;
pub mod endpoint_host;
pub mod session_manager;

/// Error type for server operations.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid endpoint url {url}: {reason}")]
    InvalidEndpoint { url: String, reason: String },

    #[error("bind failed on {addr}: {source}")]
    BindFailed {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("no endpoints configured")]
    NoEndpoints,

    #[error("session not found: {0}")]
    SessionNotFound(SessionId),

    #[error("too many sessions (limit {limit})")]
    TooManySessions { limit: usize },

    #[error("certificate rejected: {0}")]
    CertificateRejected(ValidationStatus),

    #[error("line too long (limit {limit} bytes)")]
    LineTooLong { limit: usize },

    #[error("protocol error from {peer}: {reason}")]
    Protocol { peer: SocketAddr, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
