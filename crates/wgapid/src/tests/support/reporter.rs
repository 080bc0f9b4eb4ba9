//! Test double for [`HealthReporter`] that records structured events for assertions.
//!
//! The recorder captures the lifecycle telemetry emitted during bootstrap and
//! listener start-up so behaviour tests can validate observable events.

use std::sync::Mutex;

use wgapi_config::{Config, ListenEndpoint};

use crate::bootstrap::BootstrapError;
use crate::health::HealthReporter;

/// Structured health events tracked during scenarios.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HealthEvent {
    /// Bootstrap started.
    BootstrapStarting,
    /// Bootstrap completed successfully.
    BootstrapSucceeded,
    /// Bootstrap failed with an error description.
    BootstrapFailed(String),
    /// Listener is accepting connections.
    ListenerReady { tls: bool },
    /// Listener stopped.
    ListenerStopped,
}

/// Records health events for assertions.
#[derive(Default)]
pub struct RecordingHealthReporter {
    events: Mutex<Vec<HealthEvent>>,
}

impl RecordingHealthReporter {
    /// Captures a copy of the recorded events.
    pub fn events(&self) -> Vec<HealthEvent> {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .clone()
    }

    /// Returns the recorded failure message, if bootstrap failed.
    pub fn failure(&self) -> Option<String> {
        self.events().into_iter().find_map(|event| match event {
            HealthEvent::BootstrapFailed(message) => Some(message),
            _ => None,
        })
    }

    fn record(&self, event: HealthEvent) {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .push(event);
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn bootstrap_starting(&self) {
        self.record(HealthEvent::BootstrapStarting);
    }

    fn bootstrap_succeeded(&self, _config: &Config) {
        self.record(HealthEvent::BootstrapSucceeded);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        self.record(HealthEvent::BootstrapFailed(error.to_string()));
    }

    fn listener_ready(&self, _endpoint: &ListenEndpoint, tls: bool) {
        self.record(HealthEvent::ListenerReady { tls });
    }

    fn listener_stopped(&self, _endpoint: &ListenEndpoint) {
        self.record(HealthEvent::ListenerStopped);
    }
}
