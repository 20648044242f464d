//! CertificateTrustGate: the console's answer to untrusted client certificates.
//!
//! The server's certificate validator calls [`CertificateTrustGate::handle`]
//! synchronously from its connection-setup path whenever validation fails.
//! The gate applies [`mock_core::decide`], writes the decision back into the
//! validation event and reports it:
//!
//! - one plain line on the console, when console logging was requested;
//! - one `tracing` event on the `security` target, always.
//!
//! Nothing here blocks beyond that single console write.

use std::sync::Arc;

use mock_core::{decide, TrustDecision, ValidationStatus};
use tracing::{info, warn};

use crate::application::status_reporter::LineSink;
use crate::infrastructure::server::certificate_validator::CertificateValidationEvent;

/// Command-line switches that shape the gate's behaviour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrustGateOptions {
    /// Accept certificates whose only failure is "untrusted".
    pub auto_accept: bool,
    /// Echo each decision on the console as well as the trace sink.
    pub log_console: bool,
}

pub struct CertificateTrustGate {
    options: TrustGateOptions,
    sink: Arc<dyn LineSink>,
}

impl CertificateTrustGate {
    pub fn new(options: TrustGateOptions, sink: Arc<dyn LineSink>) -> Self {
        Self { options, sink }
    }

    /// Decides on a certificate that failed validation with `status` and
    /// reports the decision exactly once per sink.
    pub fn evaluate(&self, subject: &str, status: ValidationStatus) -> TrustDecision {
        let decision = decide(subject, status, self.options.auto_accept);
        let line = decision.report_line();

        if self.options.log_console {
            self.sink.write_line(&line);
        }

        if decision.accepted {
            info!(target: "security", subject = %decision.subject, "{line}");
        } else {
            warn!(
                target: "security",
                subject = %decision.subject,
                status = %decision.status,
                "{line}"
            );
        }

        decision
    }

    /// Validator hook: decides and records the answer in `event.accept`.
    pub fn handle(&self, event: &mut CertificateValidationEvent) {
        let decision = self.evaluate(&event.certificate.subject, event.error);
        event.accept = decision.accepted;
    }
}
