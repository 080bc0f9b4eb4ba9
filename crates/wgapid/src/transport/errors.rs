//! Error types for the API transport.

use std::io;
use std::net::SocketAddr;

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors surfaced while binding or running the API listener.
#[derive(Debug, Error)]
pub enum ListenerError {
    #[error("failed to resolve TCP address {host}:{port}: {source}")]
    Resolve {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },
    #[error("no TCP addresses resolved for {host}:{port}")]
    ResolveEmpty { host: String, port: u16 },
    #[error("failed to bind TCP listener at {addr}: {source}")]
    BindTcp {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
    #[error("failed to enable non-blocking listener: {source}")]
    NonBlocking {
        #[source]
        source: io::Error,
    },
    #[error("TLS is only supported on TCP listeners, not {endpoint}")]
    TlsOverUnix { endpoint: String },
    #[cfg(not(unix))]
    #[error("unix sockets are unsupported for endpoint {endpoint}")]
    UnsupportedUnix { endpoint: String },
    #[cfg(unix)]
    #[error("failed to bind unix listener at {path}: {source}")]
    BindUnix {
        path: String,
        #[source]
        source: io::Error,
    },
    #[cfg(unix)]
    #[error("existing unix socket {path} is already in use")]
    UnixInUse { path: String },
    #[cfg(unix)]
    #[error("unix socket path {path} is not a socket")]
    UnixNotSocket { path: String },
    #[cfg(unix)]
    #[error("failed to read metadata for unix socket {path}: {source}")]
    UnixMetadata {
        path: String,
        #[source]
        source: io::Error,
    },
    #[cfg(unix)]
    #[error("failed to connect to existing unix socket {path}: {source}")]
    UnixConnect {
        path: String,
        #[source]
        source: io::Error,
    },
    #[cfg(unix)]
    #[error("failed to remove stale unix socket {path}: {source}")]
    UnixCleanup {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("listener thread panicked")]
    ThreadPanic,
}

/// Errors raised while loading TLS material.
#[derive(Debug, Error)]
pub enum TlsError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("no certificates found in {path}")]
    NoCertificates { path: Utf8PathBuf },
    #[error("no private key found in {path}")]
    NoPrivateKey { path: Utf8PathBuf },
    #[error("no valid CA certificates found in {path}")]
    NoRoots { path: Utf8PathBuf },
    #[error("failed to build client verifier from {path}: {message}")]
    Verifier { path: Utf8PathBuf, message: String },
    #[error("invalid TLS certificate/key configuration: {source}")]
    Config {
        #[source]
        source: rustls::Error,
    },
}

/// Failures reading an HTTP request from a connection.
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("connection closed before a request was received")]
    Closed,
    #[error("request too large")]
    TooLarge,
    #[error("invalid request: {0}")]
    Malformed(String),
    #[error("failed to read request: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl HttpError {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed(message.into())
    }
}
