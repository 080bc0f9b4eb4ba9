use std::fmt;
use std::fs::DirBuilder;
use std::str::FromStr;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Address the API server binds.
///
/// Accepted textual forms:
///
/// - `host:port`, `[::1]:port` and `:port` (all interfaces);
/// - `tcp://host:port`;
/// - `unix:///path/to/socket`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "EndpointRepr")]
pub enum ListenEndpoint {
    /// Unix domain socket endpoint.
    Unix { path: Utf8PathBuf },
    /// TCP socket endpoint.
    Tcp { host: String, port: u16 },
}

/// Host substituted when the address is given as `:port`.
const ALL_INTERFACES: &str = "0.0.0.0";

impl ListenEndpoint {
    /// Builds a Unix domain socket endpoint.
    #[must_use]
    pub fn unix(path: impl Into<Utf8PathBuf>) -> Self {
        Self::Unix { path: path.into() }
    }

    /// Builds a TCP socket endpoint.
    #[must_use]
    pub fn tcp(host: impl Into<String>, port: u16) -> Self {
        Self::Tcp {
            host: host.into(),
            port,
        }
    }

    /// Returns the Unix socket path when the endpoint uses the Unix transport.
    #[must_use]
    pub fn unix_path(&self) -> Option<&Utf8Path> {
        match self {
            Self::Unix { path } => Some(path.as_ref()),
            Self::Tcp { .. } => None,
        }
    }

    /// Ensures a Unix socket's parent directory exists with restrictive
    /// permissions. TCP endpoints need no preparation.
    ///
    /// # Errors
    ///
    /// Returns [`SocketPreparationError`] when the socket path has no parent
    /// or the directory cannot be created.
    pub fn prepare_filesystem(&self) -> Result<(), SocketPreparationError> {
        let Some(path) = self.unix_path() else {
            return Ok(());
        };
        let Some(parent) = path.parent().filter(|parent| !parent.as_str().is_empty()) else {
            return Err(SocketPreparationError::MissingParent {
                path: path.to_path_buf(),
            });
        };

        let mut builder = DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(0o700);
        }

        if let Err(source) = builder.create(parent.as_std_path())
            && source.kind() != std::io::ErrorKind::AlreadyExists
        {
            return Err(SocketPreparationError::CreateDirectory {
                path: parent.to_path_buf(),
                source,
            });
        }

        Ok(())
    }

    fn parse_url(input: &str) -> Result<Self, ListenParseError> {
        let url = Url::parse(input)?;
        match url.scheme() {
            "unix" => {
                let path = url.path();
                if path.is_empty() {
                    return Err(ListenParseError::MissingUnixPath(input.to_owned()));
                }
                Ok(Self::unix(path))
            }
            "tcp" => {
                let host = url
                    .host_str()
                    .ok_or_else(|| ListenParseError::MissingHost(input.to_owned()))?;
                let port = url
                    .port()
                    .ok_or_else(|| ListenParseError::MissingPort(input.to_owned()))?;
                Ok(Self::tcp(host.trim_matches(['[', ']']), port))
            }
            other => Err(ListenParseError::UnsupportedScheme(other.to_owned())),
        }
    }

    fn parse_host_port(input: &str) -> Result<Self, ListenParseError> {
        let Some((host, port)) = input.rsplit_once(':') else {
            return Err(ListenParseError::MissingPort(input.to_owned()));
        };
        let port = port
            .parse::<u16>()
            .map_err(|_| ListenParseError::InvalidPort(input.to_owned()))?;
        let host = host.trim_matches(['[', ']']);
        if host.is_empty() {
            return Ok(Self::tcp(ALL_INTERFACES, port));
        }
        Ok(Self::tcp(host, port))
    }
}

impl fmt::Display for ListenEndpoint {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unix { path } => write!(formatter, "unix://{path}"),
            Self::Tcp { host, port } if host.contains(':') => {
                write!(formatter, "tcp://[{host}]:{port}")
            }
            Self::Tcp { host, port } => write!(formatter, "tcp://{host}:{port}"),
        }
    }
}

impl FromStr for ListenEndpoint {
    type Err = ListenParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ListenParseError::Empty);
        }
        if trimmed.contains("://") {
            Self::parse_url(trimmed)
        } else {
            Self::parse_host_port(trimmed)
        }
    }
}

impl From<ListenEndpoint> for String {
    fn from(endpoint: ListenEndpoint) -> Self {
        endpoint.to_string()
    }
}

/// Either the textual form or the table form used in configuration files:
/// `listen = { transport = "tcp", host = "127.0.0.1", port = 8080 }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum EndpointRepr {
    Text(String),
    Table(EndpointTable),
}

#[derive(Deserialize)]
#[serde(tag = "transport", rename_all = "snake_case")]
enum EndpointTable {
    Unix { path: Utf8PathBuf },
    Tcp { host: String, port: u16 },
}

impl TryFrom<EndpointRepr> for ListenEndpoint {
    type Error = ListenParseError;

    fn try_from(repr: EndpointRepr) -> Result<Self, Self::Error> {
        match repr {
            EndpointRepr::Text(text) => text.parse(),
            EndpointRepr::Table(EndpointTable::Unix { path }) => Ok(Self::unix(path)),
            EndpointRepr::Table(EndpointTable::Tcp { host, port }) => Ok(Self::tcp(host, port)),
        }
    }
}

/// Errors encountered while parsing a [`ListenEndpoint`] from text.
#[derive(Debug, Error)]
pub enum ListenParseError {
    /// The address was blank.
    #[error("listen address is empty")]
    Empty,
    /// Scheme was not recognised.
    #[error("unsupported listen scheme '{0}'")]
    UnsupportedScheme(String),
    /// TCP host name was missing.
    #[error("missing TCP host in '{0}'")]
    MissingHost(String),
    /// TCP port was missing from the address.
    #[error("missing TCP port in '{0}'")]
    MissingPort(String),
    /// TCP port was not a number between 0 and 65535.
    #[error("invalid TCP port in '{0}'")]
    InvalidPort(String),
    /// Unix socket path was absent.
    #[error("missing Unix socket path in '{0}'")]
    MissingUnixPath(String),
    /// URL failed to parse.
    #[error(transparent)]
    Url(#[from] url::ParseError),
}

/// Errors raised when preparing socket directories.
#[derive(Debug, Error)]
pub enum SocketPreparationError {
    /// Parent directory is missing when creating a Unix socket path.
    #[error("socket path '{path}' has no parent directory")]
    MissingParent { path: Utf8PathBuf },
    /// Failed to create or adjust socket directories.
    #[error("failed to create socket directory '{path}': {source}")]
    CreateDirectory {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("localhost:8080", ListenEndpoint::tcp("localhost", 8080))]
    #[case(":9000", ListenEndpoint::tcp("0.0.0.0", 9000))]
    #[case("[::1]:8080", ListenEndpoint::tcp("::1", 8080))]
    #[case("tcp://127.0.0.1:9000", ListenEndpoint::tcp("127.0.0.1", 9000))]
    #[case("unix:///run/wg-api.sock", ListenEndpoint::unix("/run/wg-api.sock"))]
    fn parses_listen_forms(#[case] input: &str, #[case] expected: ListenEndpoint) {
        let parsed: ListenEndpoint = input.parse().expect("listen address should parse");
        assert_eq!(parsed, expected);
    }

    #[rstest]
    #[case("")]
    #[case("localhost")]
    #[case("localhost:http")]
    #[case("udp://localhost:53")]
    fn rejects_malformed_listen_forms(#[case] input: &str) {
        assert!(input.parse::<ListenEndpoint>().is_err(), "{input} should fail");
    }

    #[test]
    fn display_round_trips_through_parse() {
        let endpoint = ListenEndpoint::tcp("::1", 8080);
        assert_eq!(endpoint.to_string(), "tcp://[::1]:8080");
        let reparsed: ListenEndpoint = endpoint.to_string().parse().expect("reparse");
        assert_eq!(reparsed, endpoint);
    }

    #[test]
    fn prepare_filesystem_creates_socket_parent() {
        let dir = tempfile::tempdir().expect("temp dir");
        let socket = dir.path().join("nested").join("wg-api.sock");
        let endpoint = ListenEndpoint::unix(socket.to_str().expect("utf8 path"));
        endpoint.prepare_filesystem().expect("prepare socket directory");
        assert!(socket.parent().is_some_and(std::path::Path::is_dir));
    }

    #[test]
    fn prepare_filesystem_rejects_bare_socket_name() {
        let endpoint = ListenEndpoint::unix("wg-api.sock");
        let error = endpoint
            .prepare_filesystem()
            .expect_err("bare socket name has no parent");
        assert!(matches!(error, SocketPreparationError::MissingParent { .. }));
    }
}
