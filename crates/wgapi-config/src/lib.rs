//! Layered configuration for the WG-API daemon.
//!
//! Values are resolved through `ortho_config` in increasing order of
//! precedence: built-in defaults, a TOML file named by `--config-path` or
//! `WGAPI_CONFIG_PATH`, `WGAPI_*` environment variables, and finally command
//! line flags.
//!
//! ```toml
//! device = "wg0"
//! listen = "localhost:8080"
//! tokens = ["s3cret"]
//! log_format = "compact"
//! ```

mod defaults;
mod listen;
mod tls;

use camino::Utf8PathBuf;
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

pub use defaults::{
    DEFAULT_LISTEN_HOST, DEFAULT_LISTEN_PORT, DEFAULT_LOG_FILTER, default_listen_endpoint,
    default_log_filter, default_log_filter_string, default_log_format,
};
pub use listen::{ListenEndpoint, ListenParseError, SocketPreparationError};
pub use tls::{TlsConfigError, TlsSettings};

/// Supported logging output formats.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// Structured JSON suitable for ingestion by logging stacks.
    #[default]
    Json,
    /// Human-readable single line output.
    Compact,
}

/// Errors encountered while parsing a [`LogFormat`] from text.
pub type LogFormatParseError = strum::ParseError;

/// Resolved daemon configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "WGAPI")]
pub struct Config {
    /// Name of the WireGuard interface to manage.
    #[serde(default)]
    pub device: String,
    /// Address the API server binds.
    #[serde(default = "default_listen_endpoint")]
    pub listen: ListenEndpoint,
    /// Terminate TLS on the listener.
    #[serde(default)]
    pub tls: bool,
    /// PEM private key used when TLS is enabled.
    #[serde(default)]
    pub tls_key: Option<Utf8PathBuf>,
    /// PEM certificate chain used when TLS is enabled.
    #[serde(default)]
    pub tls_cert: Option<Utf8PathBuf>,
    /// CA bundle for verifying client certificates (mutual TLS).
    #[serde(default)]
    pub tls_client_ca: Option<Utf8PathBuf>,
    /// Opaque tokens accepted in the `Authorization: Token <value>` header.
    #[serde(default)]
    #[ortho_config(merge_strategy = "append")]
    pub tokens: Vec<String>,
    /// Tracing filter expression.
    #[serde(default = "default_log_filter_string")]
    pub log_filter: String,
    /// Log output format.
    #[serde(default = "default_log_format")]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            device: String::new(),
            listen: default_listen_endpoint(),
            tls: false,
            tls_key: None,
            tls_cert: None,
            tls_client_ca: None,
            tokens: Vec::new(),
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
        }
    }
}

impl Config {
    /// Name of the managed interface.
    #[must_use]
    pub fn device(&self) -> &str {
        self.device.trim()
    }

    /// Listener address.
    #[must_use]
    pub fn listen(&self) -> &ListenEndpoint {
        &self.listen
    }

    /// Configured authentication tokens, trimmed, with blanks removed.
    #[must_use]
    pub fn auth_tokens(&self) -> Vec<String> {
        self.tokens
            .iter()
            .flat_map(|token| token.split(','))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(str::to_owned)
            .collect()
    }

    /// Tracing filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Log output format.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Validated TLS settings, or `None` when TLS is disabled.
    ///
    /// # Errors
    ///
    /// Returns [`TlsConfigError`] when TLS is enabled without key and cert.
    pub fn tls_settings(&self) -> Result<Option<TlsSettings>, TlsConfigError> {
        TlsSettings::resolve(
            self.tls,
            self.tls_key.as_deref(),
            self.tls_cert.as_deref(),
            self.tls_client_ca.as_deref(),
        )
    }
}
