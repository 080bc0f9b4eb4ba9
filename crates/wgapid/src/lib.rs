//! WireGuard peer-management API daemon.
//!
//! The daemon exposes a single WireGuard interface over JSON-RPC 2.0 carried
//! by HTTP/1.1 `POST` requests. Five methods are served: `GetDeviceInfo`,
//! `ListPeers`, `GetPeer`, `AddPeer` and `RemovePeer`.
//!
//! Requests flow through the transport (framing, optional TLS, referer
//! blocking, token authentication and request logging) into the
//! [`rpc::Dispatcher`], which validates parameters, calls the
//! [`provider::InterfaceControl`] implementation, and translates the result
//! into wire types from `wgapi-types`.
//!
//! The bootstrap sequence loads configuration, installs structured telemetry,
//! and probes the configured interface before the listener binds. Health
//! reporting hooks emit structured events at each lifecycle stage.

mod bootstrap;
mod cli;
mod health;
mod process;
pub mod provider;
pub mod rpc;
mod telemetry;
mod transport;

pub use bootstrap::{
    BootstrapError, ConfigLoader, Daemon, StaticConfigLoader, SystemConfigLoader, bootstrap_with,
};
pub use cli::{Helper, Invocation, parse_invocation};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use process::{LaunchError, run_daemon};
pub use telemetry::{TelemetryError, TelemetryHandle};
pub use transport::{HttpError, ListenerError, TlsError};

#[cfg(test)]
mod tests;
