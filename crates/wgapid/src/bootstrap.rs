//! Daemon bootstrap orchestration.

use std::ffi::OsString;
use std::sync::Arc;

use ortho_config::{OrthoConfig, OrthoError};
use thiserror::Error;

use wgapi_config::{Config, SocketPreparationError, TlsConfigError};

use crate::health::HealthReporter;
use crate::provider::{InterfaceControl, ProviderError};
use crate::rpc::Dispatcher;
use crate::telemetry::{self, TelemetryError, TelemetryHandle};

/// Trait abstracting configuration loading for testability.
pub trait ConfigLoader: Send + Sync {
    /// Loads the daemon configuration.
    fn load(&self) -> Result<Config, Arc<OrthoError>>;
}

/// Loader that resolves every configuration layer from the given command line.
#[derive(Debug, Clone)]
pub struct SystemConfigLoader {
    arguments: Vec<OsString>,
}

impl SystemConfigLoader {
    /// Builds a loader over `arguments`, program name first.
    #[must_use]
    pub fn new(arguments: Vec<OsString>) -> Self {
        Self { arguments }
    }
}

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load_from_iter(self.arguments.iter().cloned())
    }
}

/// Loader that hands out a configuration resolved elsewhere.
#[derive(Debug, Clone)]
pub struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    /// Wraps an already resolved configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(self.config.clone())
    }
}

/// Errors surfaced during bootstrap.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Configuration {
        /// Underlying loader error.
        #[source]
        source: Arc<OrthoError>,
    },
    /// Telemetry initialisation failed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
    /// No interface name was configured.
    #[error("device name is required")]
    MissingDevice,
    /// TLS was requested with incomplete settings.
    #[error(transparent)]
    Tls(#[from] TlsConfigError),
    /// The configured interface is absent.
    #[error("device {name:?} does not exist")]
    DeviceNotFound {
        /// Configured interface name.
        name: String,
    },
    /// The provider failed while probing the interface.
    #[error("could not get WireGuard device: {source}")]
    Provider {
        /// Underlying provider error.
        #[source]
        source: ProviderError,
    },
    /// Socket preparation failed.
    #[error("failed to prepare listen socket: {source}")]
    Socket {
        /// Filesystem error reported while preparing the socket directory.
        #[source]
        source: SocketPreparationError,
    },
}

impl From<ProviderError> for BootstrapError {
    fn from(source: ProviderError) -> Self {
        match source {
            ProviderError::DeviceNotFound { name } => Self::DeviceNotFound { name },
            other => Self::Provider { source: other },
        }
    }
}

/// Result of a successful bootstrap invocation.
pub struct Daemon<P> {
    config: Config,
    provider: P,
    telemetry: TelemetryHandle,
    reporter: Arc<dyn HealthReporter>,
}

impl<P> std::fmt::Debug for Daemon<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Daemon")
            .field("config", &self.config)
            .field("telemetry", &self.telemetry)
            .finish_non_exhaustive()
    }
}

impl<P> Daemon<P> {
    /// Accessor for the resolved configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Accessor for the telemetry handle, primarily useful for testing.
    #[must_use]
    pub fn telemetry(&self) -> TelemetryHandle {
        self.telemetry
    }

    /// Reporter shared with the listener lifecycle.
    #[must_use]
    pub fn reporter(&self) -> Arc<dyn HealthReporter> {
        Arc::clone(&self.reporter)
    }

    /// Consumes the daemon, building the dispatcher bound to the configured
    /// interface.
    #[must_use]
    pub fn into_dispatcher(self) -> Dispatcher<P>
    where
        P: InterfaceControl,
    {
        Dispatcher::new(self.config.device(), self.provider)
    }
}

/// Bootstraps the daemon using the supplied collaborators.
///
/// The sequence loads configuration, installs telemetry, checks the interface
/// name and TLS settings, probes the interface through `provider`, and
/// prepares the socket directory for Unix listeners.
///
/// # Errors
///
/// Returns the first [`BootstrapError`] encountered; the reporter observes it
/// before it is returned.
pub fn bootstrap_with<P>(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
    provider: P,
) -> Result<Daemon<P>, BootstrapError>
where
    P: InterfaceControl,
{
    reporter.bootstrap_starting();

    let config = match loader.load() {
        Ok(config) => config,
        Err(source) => {
            let error = BootstrapError::Configuration { source };
            reporter.bootstrap_failed(&error);
            return Err(error);
        }
    };

    let telemetry = match telemetry::initialise(&config) {
        Ok(handle) => handle,
        Err(source) => {
            let error = BootstrapError::Telemetry { source };
            reporter.bootstrap_failed(&error);
            return Err(error);
        }
    };

    if let Err(error) = check_config(&config, &provider) {
        reporter.bootstrap_failed(&error);
        return Err(error);
    }

    reporter.bootstrap_succeeded(&config);
    Ok(Daemon {
        config,
        provider,
        telemetry,
        reporter,
    })
}

fn check_config<P: InterfaceControl>(config: &Config, provider: &P) -> Result<(), BootstrapError> {
    let device = config.device();
    if device.is_empty() {
        return Err(BootstrapError::MissingDevice);
    }
    config.tls_settings()?;
    provider.device(device)?;
    config
        .listen()
        .prepare_filesystem()
        .map_err(|source| BootstrapError::Socket { source })
}
