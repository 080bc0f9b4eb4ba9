//! Structured health reporting for daemon lifecycle events.

use std::sync::Arc;

use wgapi_config::{Config, ListenEndpoint};

use crate::bootstrap::BootstrapError;

const HEALTH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::health");

/// Observer trait used to surface lifecycle events to telemetry sinks.
pub trait HealthReporter: Send + Sync {
    /// Invoked before configuration loading begins.
    fn bootstrap_starting(&self);

    /// Invoked after bootstrap completes successfully.
    fn bootstrap_succeeded(&self, config: &Config);

    /// Invoked when bootstrap fails.
    fn bootstrap_failed(&self, error: &BootstrapError);

    /// Invoked once the listener accepts connections.
    fn listener_ready(&self, endpoint: &ListenEndpoint, tls: bool);

    /// Invoked after the listener has drained and stopped.
    fn listener_stopped(&self, endpoint: &ListenEndpoint);
}

impl<T> HealthReporter for Arc<T>
where
    T: HealthReporter + ?Sized,
{
    fn bootstrap_starting(&self) {
        (**self).bootstrap_starting();
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        (**self).bootstrap_succeeded(config);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        (**self).bootstrap_failed(error);
    }

    fn listener_ready(&self, endpoint: &ListenEndpoint, tls: bool) {
        (**self).listener_ready(endpoint, tls);
    }

    fn listener_stopped(&self, endpoint: &ListenEndpoint) {
        (**self).listener_stopped(endpoint);
    }
}

/// Default reporter that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// Builds a new reporter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn bootstrap_starting(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_starting",
            "starting daemon bootstrap"
        );
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_succeeded",
            device = %config.device(),
            listen = %config.listen(),
            tls = config.tls,
            auth = !config.auth_tokens().is_empty(),
            log_filter = %config.log_filter(),
            log_format = %config.log_format(),
            "daemon bootstrap completed"
        );
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "bootstrap_failed",
            error = %error,
            "daemon bootstrap failed"
        );
    }

    fn listener_ready(&self, endpoint: &ListenEndpoint, tls: bool) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "listener_ready",
            listen = %endpoint,
            tls,
            "API server listening"
        );
    }

    fn listener_stopped(&self, endpoint: &ListenEndpoint) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "listener_stopped",
            listen = %endpoint,
            "API server stopped"
        );
    }
}
