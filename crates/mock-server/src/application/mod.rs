//! Application layer use cases for the console.
//!
//! Use cases in this layer orchestrate `mock_core` domain types and depend on
//! small traits ([`status_reporter::LineSink`], [`heartbeat::SessionSource`],
//! [`lifecycle_relay::LifecycleNotifications`]) rather than on the concrete
//! server, so each one can be unit-tested with in-memory doubles.
//!
//! # Sub-modules
//!
//! - **`trust_gate`** – Answers the certificate validator's "accept anyway?"
//!   question and reports the decision on the console and the `security`
//!   trace target.
//!
//! - **`status_reporter`** – Formats one aligned status line per session under
//!   the session's diagnostics lock and writes it to the console sink.
//!
//! - **`heartbeat`** – Background loop that reports every live session once
//!   the quiet period has passed without a lifecycle event.
//!
//! - **`lifecycle_relay`** – Handlers for the server's session created,
//!   activated and closing notifications.

pub mod heartbeat;
pub mod lifecycle_relay;
pub mod status_reporter;
pub mod trust_gate;
