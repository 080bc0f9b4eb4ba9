//! Domain snapshots reported by interface control providers.

use std::fmt;
use std::net::SocketAddr;
use std::time::{Duration, SystemTime};

use ipnet::IpNet;

use super::key::Key;

/// Implementation backing a WireGuard interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceKind {
    /// In-kernel WireGuard module.
    LinuxKernel,
    /// Userspace implementation such as `wireguard-go`.
    Userspace,
    /// Anything else.
    Unknown,
}

impl DeviceKind {
    /// Label reported on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LinuxKernel => "Linux kernel",
            Self::Userspace => "userspace",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of a WireGuard interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    /// Interface name.
    pub name: String,
    /// Implementation flavour.
    pub kind: DeviceKind,
    /// Interface public key.
    pub public_key: Key,
    /// UDP listen port.
    pub listen_port: u16,
    /// Firewall mark; zero when unset.
    pub firewall_mark: u32,
    /// Configured peers in interface order.
    pub peers: Vec<PeerState>,
}

/// Snapshot of a peer as reported by the interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerState {
    /// Identity of the peer.
    pub public_key: Key,
    /// Preshared key, when configured.
    pub preshared_key: Option<Key>,
    /// Last known endpoint.
    pub endpoint: Option<SocketAddr>,
    /// Keep-alive interval; zero disables it.
    pub persistent_keepalive: Duration,
    /// Time of the most recent handshake.
    pub last_handshake: Option<SystemTime>,
    /// Bytes received.
    pub receive_bytes: u64,
    /// Bytes transmitted.
    pub transmit_bytes: u64,
    /// Routed address ranges.
    pub allowed_ips: Vec<IpNet>,
    /// Handshake protocol version.
    pub protocol_version: u32,
}

impl PeerState {
    /// A freshly configured peer with no traffic.
    #[must_use]
    pub const fn new(public_key: Key) -> Self {
        Self {
            public_key,
            preshared_key: None,
            endpoint: None,
            persistent_keepalive: Duration::ZERO,
            last_handshake: None,
            receive_bytes: 0,
            transmit_bytes: 0,
            allowed_ips: Vec::new(),
            protocol_version: 1,
        }
    }
}

/// Desired configuration for a peer.
///
/// Optional fields left as `None` keep the interface's current value. A
/// non-empty `allowed_ips` replaces the existing set; an empty one keeps it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerConfig {
    /// Identity of the peer; the match key for updates.
    pub public_key: Key,
    /// Preshared key to install.
    pub preshared_key: Option<Key>,
    /// Endpoint to contact.
    pub endpoint: Option<SocketAddr>,
    /// Keep-alive interval.
    pub persistent_keepalive: Option<Duration>,
    /// Routed address ranges.
    pub allowed_ips: Vec<IpNet>,
}

/// A single mutation of the peer table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerChange {
    /// Insert the peer, or update it in place when the key already exists.
    Upsert(PeerConfig),
    /// Remove the peer with the given key.
    Remove(Key),
}

impl PeerChange {
    /// Key of the peer the change targets.
    #[must_use]
    pub const fn public_key(&self) -> &Key {
        match self {
            Self::Upsert(config) => &config.public_key,
            Self::Remove(key) => key,
        }
    }
}
