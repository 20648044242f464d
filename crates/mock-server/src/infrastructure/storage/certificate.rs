//! Application instance certificate check.
//!
//! The server refuses to start without its own certificate.  Only presence and
//! PEM framing are checked here; the key itself is the engine's business.

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

const PEM_BEGIN: &str = "-----BEGIN CERTIFICATE-----";
const PEM_END: &str = "-----END CERTIFICATE-----";

#[derive(Debug, Error)]
pub enum CertificateError {
    #[error("application certificate not found at {0}")]
    Missing(PathBuf),

    #[error("I/O error reading application certificate at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0} does not contain a PEM CERTIFICATE block")]
    NotPem(PathBuf),
}

/// Private key password.  Never printed.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct CertificatePassword(String);

impl From<String> for CertificatePassword {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Debug for CertificatePassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CertificatePassword(<redacted>)")
    }
}

/// A certificate that passed the startup check.
#[derive(Debug, Clone)]
pub struct ApplicationCertificate {
    pub path: PathBuf,
    pub password: Option<CertificatePassword>,
}

/// Verifies that `path` holds a PEM certificate.
///
/// # Errors
///
/// [`CertificateError::Missing`] when the file does not exist,
/// [`CertificateError::NotPem`] when no complete `CERTIFICATE` block is found.
pub fn check_application_certificate(
    path: &Path,
    password: Option<CertificatePassword>,
) -> Result<ApplicationCertificate, CertificateError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(CertificateError::Missing(path.to_path_buf()))
        }
        Err(e) => {
            return Err(CertificateError::Io {
                path: path.to_path_buf(),
                source: e,
            })
        }
    };

    let framed = content
        .find(PEM_BEGIN)
        .and_then(|start| content[start..].find(PEM_END))
        .is_some();
    if !framed {
        return Err(CertificateError::NotPem(path.to_path_buf()));
    }

    Ok(ApplicationCertificate {
        path: path.to_path_buf(),
        password,
    })
}
