//! Domain entities for the OPCUA Mock console.
//!
//! Everything in here is pure: no OS calls, no network, no async runtime.
//! The application layer in `mock-server` wires these types to the external
//! server's notifications, the console and the tracing sink.

/// Heartbeat quiet-period gate shared by the supervisor and the event relay.
pub mod heartbeat;

/// Session identity and diagnostics as seen by the console.
pub mod session;

/// Fixed-width status line rendering.
pub mod status;

/// Certificate trust decision policy.
pub mod trust;
