//! Storage infrastructure: files the console reads at startup.
//!
//! - **`config`** – TOML application configuration (endpoints, trust list,
//!   heartbeat timings).  Defaults apply when the file does not exist.
//! - **`settings`** – JSON settings describing the nodes the address space
//!   is populated with.
//! - **`certificate`** – Presence and shape check of the application instance
//!   certificate, plus the private key password wrapper.
//!
//! Nothing here writes back to disk; all three are read-only after load.

pub mod certificate;
pub mod config;
pub mod settings;
