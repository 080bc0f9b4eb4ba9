//! BDD test world holding the loader, reporter, provider and bootstrap
//! outcome shared by step functions.
//!
use std::cell::RefCell;
use std::sync::Arc;

use crate::bootstrap::{BootstrapError, ConfigLoader, Daemon, bootstrap_with};
use crate::provider::MemoryProvider;

use super::config_loader::{FailingConfigLoader, TEST_DEVICE, TestConfigLoader};
use super::reporter::RecordingHealthReporter;

/// Scenario world shared across BDD steps.
pub struct TestWorld {
    loader: Box<dyn ConfigLoader>,
    socket_path: Option<String>,
    pub reporter: Arc<RecordingHealthReporter>,
    pub provider: Arc<MemoryProvider>,
    daemon: Option<Daemon<Arc<MemoryProvider>>>,
    bootstrap_error: Option<BootstrapError>,
}

impl TestWorld {
    /// Builds a world with a successful configuration loader.
    #[must_use]
    pub fn new() -> Self {
        let loader = TestConfigLoader::new();
        Self {
            socket_path: Some(loader.socket_path()),
            loader: Box::new(loader),
            reporter: Arc::new(RecordingHealthReporter::default()),
            provider: Arc::new(MemoryProvider::new(TEST_DEVICE)),
            daemon: None,
            bootstrap_error: None,
        }
    }

    /// Installs a loader that always fails.
    pub fn use_failing_loader(&mut self) {
        self.loader = Box::new(FailingConfigLoader);
        self.socket_path = None;
        self.reset_results();
    }

    /// Installs a loader that succeeds.
    pub fn use_loader(&mut self, loader: TestConfigLoader) {
        self.socket_path = Some(loader.socket_path());
        self.loader = Box::new(loader);
        self.reset_results();
    }

    /// Runs the bootstrap sequence once.
    pub fn bootstrap(&mut self) {
        if self.daemon.is_some() || self.bootstrap_error.is_some() {
            return;
        }

        let provider = Arc::clone(&self.provider);
        match bootstrap_with(&*self.loader, self.reporter.clone(), provider) {
            Ok(daemon) => {
                self.daemon = Some(daemon);
            }
            Err(error) => {
                self.bootstrap_error = Some(error);
            }
        }
    }

    /// Returns whether bootstrap produced an error.
    #[must_use]
    pub fn bootstrap_error(&self) -> Option<&BootstrapError> {
        self.bootstrap_error.as_ref()
    }

    /// Returns the daemon handle when bootstrap succeeded.
    #[must_use]
    pub fn daemon(&self) -> Option<&Daemon<Arc<MemoryProvider>>> {
        self.daemon.as_ref()
    }

    /// Takes ownership of the daemon handle.
    pub fn take_daemon(&mut self) -> Option<Daemon<Arc<MemoryProvider>>> {
        self.daemon.take()
    }

    /// Socket path configured by the active loader.
    #[must_use]
    pub fn socket_path(&self) -> Option<&str> {
        self.socket_path.as_deref()
    }

    fn reset_results(&mut self) {
        self.daemon = None;
        self.bootstrap_error = None;
    }
}

impl Default for TestWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Default test world fixture.
#[must_use]
pub fn world() -> RefCell<TestWorld> {
    RefCell::new(TestWorld::new())
}
