//! Interface control providers.
//!
//! The dispatcher reads and mutates the WireGuard peer table only through
//! [`InterfaceControl`]. Production uses [`WgToolProvider`], which drives the
//! `wg(8)` utility; tests use the in-memory provider or `mockall` doubles.

mod key;
#[cfg(any(test, feature = "test-support"))]
mod memory;
mod model;
mod wg_tool;

use std::io;
use std::sync::Arc;

use thiserror::Error;

pub use self::key::{ENCODED_KEY_LEN, KEY_LEN, Key, KeyError};
#[cfg(any(test, feature = "test-support"))]
pub use self::memory::MemoryProvider;
pub use self::model::{Device, DeviceKind, PeerChange, PeerConfig, PeerState};
pub use self::wg_tool::WgToolProvider;

/// Narrow capability the dispatcher needs from the network interface.
///
/// Calls are synchronous round trips. Implementations must be safe to share
/// across connection threads; callers add no locking, retries or timeouts.
pub trait InterfaceControl: Send + Sync {
    /// Reads a fresh snapshot of the named interface.
    fn device(&self, name: &str) -> Result<Device, ProviderError>;

    /// Applies a single peer change to the named interface.
    fn configure_peer(&self, name: &str, change: &PeerChange) -> Result<(), ProviderError>;

    /// Lists the names of all WireGuard interfaces on the host.
    fn devices(&self) -> Result<Vec<String>, ProviderError>;
}

impl<T> InterfaceControl for Arc<T>
where
    T: InterfaceControl + ?Sized,
{
    fn device(&self, name: &str) -> Result<Device, ProviderError> {
        (**self).device(name)
    }

    fn configure_peer(&self, name: &str, change: &PeerChange) -> Result<(), ProviderError> {
        (**self).configure_peer(name, change)
    }

    fn devices(&self) -> Result<Vec<String>, ProviderError> {
        (**self).devices()
    }
}

/// Failures reported by interface control providers.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The named interface does not exist.
    #[error("device {name:?} does not exist")]
    DeviceNotFound {
        /// Requested interface name.
        name: String,
    },
    /// The control program could not be started.
    #[error("failed to run {program}: {source}")]
    Spawn {
        /// Program that failed to start.
        program: String,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The control program exited unsuccessfully.
    #[error("{program} exited with {status}: {stderr}")]
    Command {
        /// Program that failed.
        program: String,
        /// Exit status description.
        status: String,
        /// Captured standard error, trimmed.
        stderr: String,
    },
    /// The control program produced output that could not be understood.
    #[error("unexpected output from {program}: {message}")]
    Output {
        /// Program that produced the output.
        program: String,
        /// Description of the problem.
        message: String,
    },
    /// The interface rejected the change.
    #[error("{message}")]
    Rejected {
        /// Reason reported by the interface.
        message: String,
    },
}

impl ProviderError {
    /// Creates a device-not-found error.
    pub fn device_not_found(name: impl Into<String>) -> Self {
        Self::DeviceNotFound { name: name.into() }
    }

    /// Creates a rejection error.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }
}
