//! TLS termination for TCP listeners.

use std::fs::File;
use std::io::{self, BufReader};
use std::net::TcpStream;
use std::sync::Arc;

use camino::Utf8Path;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::server::WebPkiClientVerifier;
use rustls::{RootCertStore, ServerConfig, ServerConnection, StreamOwned};

use wgapi_config::TlsSettings;

use super::ConnectionStream;
use super::errors::TlsError;

/// Builds the server configuration, requiring client certificates when a
/// client CA bundle is configured.
///
/// # Errors
///
/// Returns [`TlsError`] when PEM material cannot be read or is rejected.
pub(crate) fn server_config(settings: &TlsSettings) -> Result<Arc<ServerConfig>, TlsError> {
    let chain = load_cert_chain(settings.cert())?;
    let key = load_private_key(settings.key())?;

    let builder = ServerConfig::builder();
    let config = match settings.client_ca() {
        Some(ca_path) => {
            let roots = load_root_store(ca_path)?;
            let verifier = WebPkiClientVerifier::builder(Arc::new(roots))
                .build()
                .map_err(|error| TlsError::Verifier {
                    path: ca_path.to_path_buf(),
                    message: error.to_string(),
                })?;
            builder
                .with_client_cert_verifier(verifier)
                .with_single_cert(chain, key)
        }
        None => builder.with_no_client_auth().with_single_cert(chain, key),
    }
    .map_err(|source| TlsError::Config { source })?;
    Ok(Arc::new(config))
}

/// Completes the server handshake on an accepted TCP stream.
pub(crate) fn accept(
    config: Arc<ServerConfig>,
    mut socket: TcpStream,
) -> io::Result<ConnectionStream> {
    let mut connection = ServerConnection::new(config).map_err(io::Error::other)?;
    while connection.is_handshaking() {
        connection.complete_io(&mut socket)?;
    }
    let stream = StreamOwned::new(connection, socket);
    Ok(ConnectionStream::Tls(Box::new(stream)))
}

fn open(path: &Utf8Path) -> Result<BufReader<File>, TlsError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| TlsError::Read {
            path: path.to_path_buf(),
            source,
        })
}

fn load_cert_chain(path: &Utf8Path) -> Result<Vec<CertificateDer<'static>>, TlsError> {
    let mut reader = open(path)?;
    let certificates = rustls_pemfile::certs(&mut reader)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| TlsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    if certificates.is_empty() {
        return Err(TlsError::NoCertificates {
            path: path.to_path_buf(),
        });
    }
    Ok(certificates)
}

fn load_private_key(path: &Utf8Path) -> Result<PrivateKeyDer<'static>, TlsError> {
    let mut reader = open(path)?;
    rustls_pemfile::private_key(&mut reader)
        .map_err(|source| TlsError::Read {
            path: path.to_path_buf(),
            source,
        })?
        .ok_or_else(|| TlsError::NoPrivateKey {
            path: path.to_path_buf(),
        })
}

fn load_root_store(path: &Utf8Path) -> Result<RootCertStore, TlsError> {
    let certificates = load_cert_chain(path)?;
    let mut roots = RootCertStore::empty();
    let (added, _ignored) = roots.add_parsable_certificates(certificates);
    if added == 0 {
        return Err(TlsError::NoRoots {
            path: path.to_path_buf(),
        });
    }
    Ok(roots)
}
