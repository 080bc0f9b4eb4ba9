//! Test configuration loaders for scenarios covering success and failure paths.
//!
use std::ffi::OsString;
use std::sync::{Arc, Mutex};

use ortho_config::{OrthoConfig, OrthoError};
use tempfile::TempDir;
use wgapi_config::{Config, ListenEndpoint};

use crate::bootstrap::ConfigLoader;

/// Interface name every test loader configures.
pub const TEST_DEVICE: &str = "wg0";

/// Loader that provisions a Unix socket path under a temporary directory.
pub struct TestConfigLoader {
    socket_dir: Arc<Mutex<TempDir>>,
    device: String,
    tls: bool,
}

impl TestConfigLoader {
    #[must_use]
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temporary directory for socket");
        Self {
            socket_dir: Arc::new(Mutex::new(dir)),
            device: TEST_DEVICE.to_owned(),
            tls: false,
        }
    }

    /// Configures a different interface name.
    #[must_use]
    pub fn with_device(mut self, device: &str) -> Self {
        device.clone_into(&mut self.device);
        self
    }

    /// Enables TLS without key or certificate paths.
    #[must_use]
    pub fn with_incomplete_tls(mut self) -> Self {
        self.tls = true;
        self
    }

    /// Path of the socket the loaded configuration listens on.
    pub fn socket_path(&self) -> String {
        let dir = self
            .socket_dir
            .lock()
            .expect("temporary directory mutex poisoned");
        let path = dir.path().join("run").join("wgapid.sock");
        path.to_str()
            .expect("temporary socket path was not valid UTF-8")
            .to_owned()
    }
}

impl Default for TestConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader for TestConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(Config {
            device: self.device.clone(),
            listen: ListenEndpoint::unix(self.socket_path()),
            tls: self.tls,
            ..Config::default()
        })
    }
}

/// Loader that intentionally fails by passing invalid CLI arguments.
pub struct FailingConfigLoader;

impl ConfigLoader for FailingConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        let args = vec![
            OsString::from("wgapid"),
            OsString::from("--listen"),
            OsString::from("ftp://invalid"),
        ];
        Config::load_from_iter(args)
    }
}
