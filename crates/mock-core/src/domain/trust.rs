//! Certificate trust decision.
//!
//! The external validator checks signatures, chains, validity periods and
//! revocation on its own.  When a check fails it hands the console the failing
//! [`ValidationStatus`] and asks whether to accept anyway.  The only failure
//! the console is ever allowed to override is [`ValidationStatus::BadCertificateUntrusted`],
//! and only when auto-accept was requested on the command line.
//!
//! ```
//! use mock_core::{decide, ValidationStatus};
//!
//! let d = decide("CN=client", ValidationStatus::BadCertificateUntrusted, true);
//! assert!(d.accepted);
//!
//! let d = decide("CN=client", ValidationStatus::BadCertificateTimeInvalid, true);
//! assert!(!d.accepted);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Status reported by the certificate validation pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValidationStatus {
    BadCertificateUntrusted,
    BadCertificateInvalid,
    BadCertificateTimeInvalid,
    BadCertificateIssuerTimeInvalid,
    BadCertificateRevoked,
    BadCertificateIssuerRevoked,
    BadCertificateRevocationUnknown,
    BadCertificateUseNotAllowed,
    BadCertificateHostNameInvalid,
    BadCertificateUriInvalid,
    BadSecurityChecksFailed,
}

impl ValidationStatus {
    pub const ALL: [ValidationStatus; 11] = [
        ValidationStatus::BadCertificateUntrusted,
        ValidationStatus::BadCertificateInvalid,
        ValidationStatus::BadCertificateTimeInvalid,
        ValidationStatus::BadCertificateIssuerTimeInvalid,
        ValidationStatus::BadCertificateRevoked,
        ValidationStatus::BadCertificateIssuerRevoked,
        ValidationStatus::BadCertificateRevocationUnknown,
        ValidationStatus::BadCertificateUseNotAllowed,
        ValidationStatus::BadCertificateHostNameInvalid,
        ValidationStatus::BadCertificateUriInvalid,
        ValidationStatus::BadSecurityChecksFailed,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ValidationStatus::BadCertificateUntrusted => "BadCertificateUntrusted",
            ValidationStatus::BadCertificateInvalid => "BadCertificateInvalid",
            ValidationStatus::BadCertificateTimeInvalid => "BadCertificateTimeInvalid",
            ValidationStatus::BadCertificateIssuerTimeInvalid => "BadCertificateIssuerTimeInvalid",
            ValidationStatus::BadCertificateRevoked => "BadCertificateRevoked",
            ValidationStatus::BadCertificateIssuerRevoked => "BadCertificateIssuerRevoked",
            ValidationStatus::BadCertificateRevocationUnknown => "BadCertificateRevocationUnknown",
            ValidationStatus::BadCertificateUseNotAllowed => "BadCertificateUseNotAllowed",
            ValidationStatus::BadCertificateHostNameInvalid => "BadCertificateHostNameInvalid",
            ValidationStatus::BadCertificateUriInvalid => "BadCertificateUriInvalid",
            ValidationStatus::BadSecurityChecksFailed => "BadSecurityChecksFailed",
        }
    }
}

impl fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when a status name does not match any known variant.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown validation status: {0}")]
pub struct UnknownStatus(pub String);

impl std::str::FromStr for ValidationStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ValidationStatus::ALL
            .into_iter()
            .find(|status| status.name() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

/// Outcome of a single trust decision.  Created per validation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustDecision {
    pub subject: String,
    pub status: ValidationStatus,
    pub accepted: bool,
}

impl TrustDecision {
    /// The one human-readable line reported for this decision.
    pub fn report_line(&self) -> String {
        if self.accepted {
            format!("Accepted Certificate: {}", self.subject)
        } else {
            format!("Rejected Certificate: {} {}", self.status, self.subject)
        }
    }
}

/// Decides whether a certificate that failed validation is accepted anyway.
///
/// Accepts iff `status` is [`ValidationStatus::BadCertificateUntrusted`] and
/// `auto_accept` is set.  Pure: equal inputs always give equal decisions.
pub fn decide(subject: &str, status: ValidationStatus, auto_accept: bool) -> TrustDecision {
    let accepted = auto_accept && status == ValidationStatus::BadCertificateUntrusted;
    TrustDecision {
        subject: subject.to_string(),
        status,
        accepted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUBJECT: &str = "CN=UaExpert, O=Unified Automation";

    // ── Truth table ───────────────────────────────────────────────────────────

    #[test]
    fn test_untrusted_with_auto_accept_is_accepted() {
        let d = decide(SUBJECT, ValidationStatus::BadCertificateUntrusted, true);
        assert!(d.accepted);
    }

    #[test]
    fn test_untrusted_without_auto_accept_is_rejected() {
        let d = decide(SUBJECT, ValidationStatus::BadCertificateUntrusted, false);
        assert!(!d.accepted);
    }

    #[test]
    fn test_other_failure_with_auto_accept_is_rejected() {
        let d = decide(SUBJECT, ValidationStatus::BadCertificateInvalid, true);
        assert!(!d.accepted);
    }

    #[test]
    fn test_other_failure_without_auto_accept_is_rejected() {
        let d = decide(SUBJECT, ValidationStatus::BadCertificateInvalid, false);
        assert!(!d.accepted);
    }

    #[test]
    fn test_auto_accept_never_overrides_any_other_failure() {
        for status in ValidationStatus::ALL {
            if status == ValidationStatus::BadCertificateUntrusted {
                continue;
            }
            let d = decide(SUBJECT, status, true);
            assert!(!d.accepted, "{status} must stay rejected with auto-accept");
        }
    }

    // ── Idempotence ───────────────────────────────────────────────────────────

    #[test]
    fn test_decide_is_idempotent() {
        for status in ValidationStatus::ALL {
            for auto_accept in [false, true] {
                let first = decide(SUBJECT, status, auto_accept);
                let second = decide(SUBJECT, status, auto_accept);
                assert_eq!(first, second);
                assert_eq!(first.report_line(), second.report_line());
            }
        }
    }

    // ── Report lines ──────────────────────────────────────────────────────────

    #[test]
    fn test_accepted_report_line_names_subject() {
        let d = decide(SUBJECT, ValidationStatus::BadCertificateUntrusted, true);
        assert_eq!(d.report_line(), format!("Accepted Certificate: {SUBJECT}"));
    }

    #[test]
    fn test_rejected_report_line_names_status_and_subject() {
        let d = decide(SUBJECT, ValidationStatus::BadCertificateRevoked, true);
        assert_eq!(
            d.report_line(),
            format!("Rejected Certificate: BadCertificateRevoked {SUBJECT}")
        );
    }

    #[test]
    fn test_status_names_parse_back() {
        for status in ValidationStatus::ALL {
            assert_eq!(status.name().parse::<ValidationStatus>(), Ok(status));
        }
        assert!("Good".parse::<ValidationStatus>().is_err());
    }
}
