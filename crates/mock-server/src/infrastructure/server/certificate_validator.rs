//! CertificateValidator: trust check for client certificates.
//!
//! Cryptographic checks (signature, chain, validity period, revocation) are
//! done by whoever hands the certificate in; their outcome arrives as the
//! `chain_result` argument of [`CertificateValidator::validate`].  On top of
//! that the validator applies the trust list:
//!
//! 1. A chain failure is reported with its own status.
//! 2. A subject on the trust list is accepted.
//! 3. Anything else is `BadCertificateUntrusted`, unless the server was
//!    configured to accept untrusted certificates on its own.
//!
//! Every failure is offered to the registered validation handler, which may
//! flip the event's `accept` flag.

use std::collections::HashSet;
use std::sync::RwLock;

use mock_core::ValidationStatus;
use tracing::debug;

/// A client application instance certificate, as far as the console cares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    pub subject: String,
}

impl Certificate {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
        }
    }
}

/// Raised for every certificate that failed validation.  The handler answers
/// through `accept`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateValidationEvent {
    pub certificate: Certificate,
    pub error: ValidationStatus,
    pub accept: bool,
}

impl CertificateValidationEvent {
    pub fn new(certificate: Certificate, error: ValidationStatus) -> Self {
        Self {
            certificate,
            error,
            accept: false,
        }
    }
}

pub type ValidationHandler = Box<dyn Fn(&mut CertificateValidationEvent) + Send + Sync>;

pub struct CertificateValidator {
    trusted_subjects: HashSet<String>,
    auto_accept_untrusted: bool,
    handler: RwLock<Option<ValidationHandler>>,
}

impl CertificateValidator {
    pub fn new<I, S>(trusted_subjects: I, auto_accept_untrusted: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            trusted_subjects: trusted_subjects.into_iter().map(Into::into).collect(),
            auto_accept_untrusted,
            handler: RwLock::new(None),
        }
    }

    /// Installs the handler consulted for failed validations, replacing any
    /// previous one.
    pub fn set_validation_handler(&self, handler: ValidationHandler) {
        *self.handler.write().unwrap_or_else(|p| p.into_inner()) = Some(handler);
    }

    pub fn has_validation_handler(&self) -> bool {
        self.handler
            .read()
            .map(|h| h.is_some())
            .unwrap_or(false)
    }

    /// Validates `certificate` given the outcome of the chain checks.
    ///
    /// # Errors
    ///
    /// Returns the failing [`ValidationStatus`] when the certificate is
    /// neither trusted nor accepted by the handler.
    pub fn validate(
        &self,
        certificate: &Certificate,
        chain_result: Result<(), ValidationStatus>,
    ) -> Result<(), ValidationStatus> {
        let error = match chain_result {
            Err(status) => status,
            Ok(()) if self.trusted_subjects.contains(&certificate.subject) => return Ok(()),
            Ok(()) if self.auto_accept_untrusted => {
                debug!(subject = %certificate.subject, "untrusted certificate accepted by server policy");
                return Ok(());
            }
            Ok(()) => ValidationStatus::BadCertificateUntrusted,
        };

        let mut event = CertificateValidationEvent::new(certificate.clone(), error);
        let guard = self.handler.read().unwrap_or_else(|p| p.into_inner());
        if let Some(handler) = guard.as_ref() {
            handler(&mut event);
        }

        if event.accept {
            Ok(())
        } else {
            Err(error)
        }
    }
}
