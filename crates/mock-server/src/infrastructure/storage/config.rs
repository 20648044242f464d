//! TOML-based application configuration.
//!
//! ```toml
//! [application]
//! name = "OPCUA Mock"
//! certificate_path = "pki/own/certs/opcua-mock.pem"
//!
//! [server]
//! endpoints = ["opc.tcp://0.0.0.0:62541/Quickstarts/ReferenceServer"]
//! max_sessions = 100
//!
//! [security]
//! auto_accept_untrusted_certificates = false
//! trusted_subjects = ["CN=UaExpert"]
//!
//! [heartbeat]
//! poll_interval_ms = 1000
//! quiet_period_ms = 6000
//! ```
//!
//! Every field has a default, so a partial file (or none at all) is valid.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::heartbeat::{HeartbeatTimings, DEFAULT_POLL_INTERVAL, DEFAULT_QUIET_PERIOD};
use crate::infrastructure::server::session_manager::DEFAULT_MAX_SESSIONS;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The content parsed but a value is unusable.
    #[error("invalid config value {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub application: ApplicationConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub security: SecurityConfig,
    #[serde(default)]
    pub heartbeat: HeartbeatConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApplicationConfig {
    #[serde(default = "default_application_name")]
    pub name: String,
    /// PEM file holding the application instance certificate.
    #[serde(default = "default_certificate_path")]
    pub certificate_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    /// `opc.tcp://host:port/path` URLs.  Duplicates are bound once.
    #[serde(default = "default_endpoints")]
    pub endpoints: Vec<String>,
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SecurityConfig {
    /// When set, the server accepts untrusted certificates itself and the
    /// console's trust gate is never consulted.
    #[serde(default)]
    pub auto_accept_untrusted_certificates: bool,
    /// Certificate subjects accepted without asking.
    #[serde(default)]
    pub trusted_subjects: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HeartbeatConfig {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_quiet_period_ms")]
    pub quiet_period_ms: u64,
}

impl HeartbeatConfig {
    pub fn timings(&self) -> HeartbeatTimings {
        HeartbeatTimings {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            quiet_period: Duration::from_millis(self.quiet_period_ms),
        }
    }
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_application_name() -> String {
    "OPCUA Mock".to_string()
}
fn default_certificate_path() -> PathBuf {
    PathBuf::from("pki/own/certs/opcua-mock.pem")
}
fn default_endpoints() -> Vec<String> {
    vec!["opc.tcp://0.0.0.0:62541/Quickstarts/ReferenceServer".to_string()]
}
fn default_max_sessions() -> usize {
    DEFAULT_MAX_SESSIONS
}
fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL.as_millis() as u64
}
fn default_quiet_period_ms() -> u64 {
    DEFAULT_QUIET_PERIOD.as_millis() as u64
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: default_application_name(),
            certificate_path: default_certificate_path(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            endpoints: default_endpoints(),
            max_sessions: default_max_sessions(),
        }
    }
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            quiet_period_ms: default_quiet_period_ms(),
        }
    }
}

impl AppConfig {
    /// Rejects values the server cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.endpoints.is_empty() {
            return Err(ConfigError::Invalid {
                field: "server.endpoints",
                reason: "at least one endpoint is required".to_string(),
            });
        }
        if self.server.max_sessions == 0 {
            return Err(ConfigError::Invalid {
                field: "server.max_sessions",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.heartbeat.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "heartbeat.poll_interval_ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

// ── Loading ───────────────────────────────────────────────────────────────────

/// Parses and validates configuration text.
///
/// # Errors
///
/// [`ConfigError::Parse`] for malformed TOML, [`ConfigError::Invalid`] for
/// unusable values.
pub fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    let cfg: AppConfig = toml::from_str(content)?;
    cfg.validate()?;
    Ok(cfg)
}

/// Loads `AppConfig` from `path`, returning `AppConfig::default()` if the file
/// does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and the errors of [`parse_config`] otherwise.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => parse_config(&content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
