//! Infrastructure layer for the console.
//!
//! Contains the OS-facing adapters: the server's session table and
//! certificate validator, the loopback endpoint host, stdout output and
//! configuration files on disk.

pub mod console;
pub mod server;
pub mod storage;
