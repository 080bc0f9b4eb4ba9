use crate::listen::ListenEndpoint;

/// Host the daemon binds when no listen address is configured.
pub const DEFAULT_LISTEN_HOST: &str = "localhost";

/// Port the daemon binds when no listen address is configured.
pub const DEFAULT_LISTEN_PORT: u16 = 8080;

/// Default log filter expression used by the daemon.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default log filter expression used by the daemon.
#[must_use]
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the daemon.
#[must_use]
pub fn default_log_format() -> crate::LogFormat {
    crate::LogFormat::Json
}

/// Listen endpoint used when none is configured: `localhost:8080`.
///
/// The API can reconfigure the WireGuard interface, so the default only
/// accepts loopback connections.
#[must_use]
pub fn default_listen_endpoint() -> ListenEndpoint {
    ListenEndpoint::tcp(DEFAULT_LISTEN_HOST, DEFAULT_LISTEN_PORT)
}
