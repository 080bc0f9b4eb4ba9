//! Validated TLS settings derived from the raw configuration fields.

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;

/// PEM files used to terminate TLS on the API listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsSettings {
    key: Utf8PathBuf,
    cert: Utf8PathBuf,
    client_ca: Option<Utf8PathBuf>,
}

impl TlsSettings {
    /// Builds settings from the optional configuration fields.
    ///
    /// Returns `Ok(None)` when TLS is disabled.
    ///
    /// # Errors
    ///
    /// Returns [`TlsConfigError::MissingKeyOrCert`] when TLS is enabled without
    /// both a private key and a certificate chain.
    pub fn resolve(
        enabled: bool,
        key: Option<&Utf8Path>,
        cert: Option<&Utf8Path>,
        client_ca: Option<&Utf8Path>,
    ) -> Result<Option<Self>, TlsConfigError> {
        if !enabled {
            return Ok(None);
        }
        let (Some(key), Some(cert)) = (key, cert) else {
            return Err(TlsConfigError::MissingKeyOrCert);
        };
        Ok(Some(Self {
            key: key.to_path_buf(),
            cert: cert.to_path_buf(),
            client_ca: client_ca.map(Utf8Path::to_path_buf),
        }))
    }

    /// Path to the PEM-encoded private key.
    #[must_use]
    pub fn key(&self) -> &Utf8Path {
        &self.key
    }

    /// Path to the PEM-encoded certificate chain.
    #[must_use]
    pub fn cert(&self) -> &Utf8Path {
        &self.cert
    }

    /// CA bundle used to verify client certificates; enables mTLS when set.
    #[must_use]
    pub fn client_ca(&self) -> Option<&Utf8Path> {
        self.client_ca.as_deref()
    }
}

/// Errors raised while validating TLS configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TlsConfigError {
    /// TLS was requested without both key and certificate.
    #[error("tls key and cert required for TLS")]
    MissingKeyOrCert,
}
