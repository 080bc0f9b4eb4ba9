//! Supervises daemon launch sequencing and runtime orchestration.

use std::ffi::OsString;
use std::sync::Arc;

use tracing::{info, warn};

use crate::bootstrap::{BootstrapError, ConfigLoader, SystemConfigLoader, bootstrap_with};
use crate::health::{HealthReporter, StructuredHealthReporter};
use crate::provider::{InterfaceControl, WgToolProvider};
use crate::transport::{HttpConnectionHandler, SocketListener, tls_server_config};

use super::errors::LaunchError;
use super::shutdown::{ShutdownSignal, SystemShutdownSignal};
use super::{DRAIN_TIMEOUT, PROCESS_TARGET};

/// Collaborators required to launch the daemon runtime.
pub(crate) struct LaunchPlan<L, P, S> {
    pub(crate) loader: L,
    pub(crate) reporter: Arc<dyn HealthReporter>,
    pub(crate) provider: P,
    pub(crate) shutdown: S,
}

/// Runs the daemon using the production collaborators, resolving
/// configuration from `config_arguments` (program name first).
///
/// # Errors
///
/// Returns [`LaunchError`] when bootstrap, TLS setup, binding, or signal
/// installation fails.
pub fn run_daemon(config_arguments: Vec<OsString>) -> Result<(), LaunchError> {
    run_daemon_with(LaunchPlan {
        loader: SystemConfigLoader::new(config_arguments),
        reporter: Arc::new(StructuredHealthReporter::new()),
        provider: WgToolProvider::new(),
        shutdown: SystemShutdownSignal,
    })
}

/// Runs the daemon with injected collaborators.
pub(crate) fn run_daemon_with<L, P, S>(plan: LaunchPlan<L, P, S>) -> Result<(), LaunchError>
where
    L: ConfigLoader,
    P: InterfaceControl + 'static,
    S: ShutdownSignal,
{
    let LaunchPlan {
        loader,
        reporter,
        provider,
        shutdown,
    } = plan;

    let daemon = bootstrap_with(&loader, Arc::clone(&reporter), provider)?;
    let config = daemon.config().clone();
    info!(
        target: PROCESS_TARGET,
        device = %config.device(),
        listen = %config.listen(),
        "starting daemon runtime"
    );

    let tls = match config.tls_settings().map_err(BootstrapError::from)? {
        Some(settings) => Some(tls_server_config(&settings)?),
        None => None,
    };
    let mut listener = SocketListener::bind(config.listen())?;
    if let Some(server_config) = &tls {
        listener = listener.with_tls(Arc::clone(server_config))?;
    }

    let handler = Arc::new(HttpConnectionHandler::new(
        Arc::new(daemon.into_dispatcher()),
        config.auth_tokens(),
    ));
    let listener_handle = listener.start(handler)?;
    reporter.listener_ready(config.listen(), tls.is_some());

    let waited = shutdown.wait();
    listener_handle.shutdown();
    let pending = listener_handle.drain(DRAIN_TIMEOUT);
    if pending > 0 {
        warn!(
            target: PROCESS_TARGET,
            pending,
            "connections still running after drain timeout"
        );
    }
    listener_handle.join()?;
    reporter.listener_stopped(config.listen());
    waited?;

    info!(
        target: PROCESS_TARGET,
        "shutdown sequence completed"
    );
    Ok(())
}
