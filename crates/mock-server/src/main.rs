//! OPCUA Mock operator console entry point.
//!
//! ```text
//! main()
//!  ├─ load config (TOML) and settings (JSON)
//!  ├─ check application certificate            fatal on failure
//!  ├─ CertificateValidator
//!  │    └─ CertificateTrustGate                only when the server does not
//!  │                                           auto-accept on its own
//!  ├─ SessionManager
//!  │    └─ LifecycleRelay (created / activated / closing)
//!  ├─ EndpointHost::start                      prints the endpoint URLs
//!  ├─ HeartbeatSupervisor                      Tokio task, weak server ref
//!  └─ wait for Ctrl-C
//! ```

use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::Context;
use clap::Parser;
use thiserror::Error;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use mock_core::HeartbeatState;
use mock_server::application::heartbeat::HeartbeatSupervisor;
use mock_server::application::lifecycle_relay::LifecycleRelay;
use mock_server::application::status_reporter::{LineSink, StatusReporter};
use mock_server::application::trust_gate::{CertificateTrustGate, TrustGateOptions};
use mock_server::infrastructure::console::StdoutSink;
use mock_server::infrastructure::server::certificate_validator::{
    CertificateValidationEvent, CertificateValidator,
};
use mock_server::infrastructure::server::endpoint_host::EndpointHost;
use mock_server::infrastructure::server::session_manager::SessionManager;
use mock_server::infrastructure::server::ServerError;
use mock_server::infrastructure::storage::certificate::{
    check_application_certificate, CertificateError, CertificatePassword,
};
use mock_server::infrastructure::storage::config::{load_config, ConfigError};
use mock_server::infrastructure::storage::settings::{load_settings, SettingsError};

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(
    name = "opcua-mock",
    about = "OPC UA mock server console: certificate trust prompts and session liveness",
    version
)]
struct Cli {
    /// Echo certificate decisions to the console.
    #[arg(long, env = "OPCUA_MOCK_LOG_CONSOLE")]
    log_console: bool,

    /// Accept certificates whose only fault is being untrusted.
    #[arg(long, env = "OPCUA_MOCK_AUTO_ACCEPT")]
    auto_accept: bool,

    /// Password of the application certificate's private key.
    #[arg(long, env = "OPCUA_MOCK_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Application config file (TOML).  Defaults apply when absent.
    #[arg(long, default_value = "opcua-mock.toml", env = "OPCUA_MOCK_CONFIG")]
    config: PathBuf,

    /// Address space settings file (JSON).
    #[arg(
        long,
        default_value = "Settings/Appsettings.json",
        env = "OPCUA_MOCK_SETTINGS"
    )]
    settings: PathBuf,
}

/// Failures that abort startup.
#[derive(Debug, Error)]
enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error("invalid application certificate: {0}")]
    InvalidApplicationCertificate(#[from] CertificateError),

    #[error("failed to start endpoints: {0}")]
    Endpoint(#[from] ServerError),
}

/// Log filter used when `RUST_LOG` is unset.  The console view drops to
/// warnings but keeps certificate decisions on the `security` target.
fn default_filter(log_console: bool) -> &'static str {
    if log_console {
        "warn,security=info"
    } else {
        "info"
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_filter(cli.log_console))),
        )
        .init();

    let config = load_config(&cli.config)
        .map_err(StartupError::from)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    info!(name = %config.application.name, "OPCUA Mock starting");

    let certificate = check_application_certificate(
        &config.application.certificate_path,
        cli.password.map(CertificatePassword::from),
    )
    .map_err(StartupError::from)
    .context("application instance certificate check failed")?;
    info!(
        path = %certificate.path.display(),
        has_password = certificate.password.is_some(),
        "application certificate loaded"
    );

    let settings = load_settings(&cli.settings)
        .map_err(StartupError::from)
        .with_context(|| format!("loading {}", cli.settings.display()))?;

    let sink: Arc<dyn LineSink> = Arc::new(StdoutSink);

    // ── Certificate trust ─────────────────────────────────────────────────────
    let validator = Arc::new(CertificateValidator::new(
        config.security.trusted_subjects.iter().cloned(),
        config.security.auto_accept_untrusted_certificates,
    ));
    if config.security.auto_accept_untrusted_certificates {
        warn!(target: "security", "server accepts untrusted certificates without asking");
    } else {
        let gate = Arc::new(CertificateTrustGate::new(
            TrustGateOptions {
                auto_accept: cli.auto_accept,
                log_console: cli.log_console,
            },
            Arc::clone(&sink),
        ));
        validator.set_validation_handler(Box::new(move |event: &mut CertificateValidationEvent| {
            gate.handle(event)
        }));
    }

    // ── Sessions and lifecycle ────────────────────────────────────────────────
    let sessions = Arc::new(SessionManager::new(config.server.max_sessions));
    let heartbeat = Arc::new(HeartbeatState::default());
    let reporter = StatusReporter::new(Arc::clone(&sink));

    let relay = Arc::new(LifecycleRelay::new(Arc::clone(&heartbeat), reporter.clone()));
    relay.register(&*sessions);

    // ── Endpoints ─────────────────────────────────────────────────────────────
    let running = Arc::new(AtomicBool::new(true));
    let host = EndpointHost::new(
        Arc::clone(&sessions),
        Arc::clone(&validator),
        settings.nodes_to_create,
    );
    let urls = host
        .start(&config.server.endpoints, Arc::clone(&running))
        .await
        .map_err(StartupError::from)
        .context("server failed to start")?;
    for url in &urls {
        sink.write_line(url);
    }

    // ── Heartbeat ─────────────────────────────────────────────────────────────
    let supervisor = HeartbeatSupervisor::new(
        &sessions,
        Arc::clone(&heartbeat),
        reporter,
        config.heartbeat.timings(),
    );
    let heartbeat_task = supervisor.spawn();

    // ── Ctrl-C handler ────────────────────────────────────────────────────────
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            running_clone.store(false, Ordering::Relaxed);
        }
    });

    info!("OPCUA Mock ready.  Press Ctrl-C to exit.");

    while running.load(Ordering::Relaxed) {
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    }

    heartbeat_task.abort();
    info!("OPCUA Mock stopped");
    Ok(())
}
