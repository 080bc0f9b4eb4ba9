//! Wire-level shapes for the WG-API JSON-RPC protocol.
//!
//! These types describe the `params` and `result` members exchanged with the
//! daemon. Field names are part of the protocol contract: clients depend on
//! them verbatim, so renames here are breaking changes.
//!
//! ```json
//! {"jsonrpc":"2.0","method":"GetPeer","params":{"public_key":"..."},"id":1}
//! ```

use serde::{Deserialize, Serialize};

/// JSON-RPC protocol version tag carried by every envelope.
pub const JSONRPC_VERSION: &str = "2.0";

/// MIME type expected from clients and returned by the daemon.
pub const CONTENT_TYPE: &str = "application/json";

/// Method names understood by the daemon.
pub mod methods {
    /// Returns the configured interface snapshot.
    pub const GET_DEVICE_INFO: &str = "GetDeviceInfo";
    /// Lists every peer known to the interface.
    pub const LIST_PEERS: &str = "ListPeers";
    /// Looks up a single peer by public key.
    pub const GET_PEER: &str = "GetPeer";
    /// Inserts or updates a peer.
    pub const ADD_PEER: &str = "AddPeer";
    /// Removes a peer by public key.
    pub const REMOVE_PEER: &str = "RemovePeer";
}

/// Snapshot of the managed interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    /// Interface name, for example `wg0`.
    pub name: String,
    /// Implementation flavour, for example `Linux kernel` or `userspace`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Interface public key in base64.
    pub public_key: String,
    /// UDP port the interface listens on.
    pub listen_port: u16,
    /// Firewall mark applied to outgoing packets; omitted when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firewall_mark: Option<u32>,
    /// Number of configured peers.
    pub num_peers: usize,
}

/// Wire view of a peer.
///
/// The preshared key itself is never exposed; only its presence is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Peer {
    /// Peer public key in base64.
    pub public_key: String,
    /// Whether a preshared key is configured for the peer.
    pub has_preshared_key: bool,
    /// Last known `ip:port` of the peer, or empty when unknown.
    pub endpoint: String,
    /// Keep-alive interval such as `25s`; omitted when disabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persistent_keep_alive: Option<String>,
    /// RFC 3339 timestamp of the most recent handshake.
    pub last_handshake: String,
    /// Bytes received from the peer.
    pub receive_bytes: u64,
    /// Bytes sent to the peer.
    pub transmit_bytes: u64,
    /// Address ranges routed to the peer, in CIDR notation.
    pub allowed_ips: Vec<String>,
    /// Handshake protocol version.
    pub protocol_version: u32,
}

/// Parameters for `GetDeviceInfo`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetDeviceInfoRequest {}

/// Result of `GetDeviceInfo`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetDeviceInfoResponse {
    /// The interface snapshot.
    pub device: Device,
}

/// Parameters for `ListPeers`.
///
/// Pagination values are validated but not yet applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListPeersRequest {
    /// Maximum number of peers to return.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    /// Number of peers to skip.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
}

/// Result of `ListPeers`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListPeersResponse {
    /// Every peer known to the interface.
    pub peers: Vec<Peer>,
}

/// Parameters for `GetPeer`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetPeerRequest {
    /// Public key of the peer to look up.
    #[serde(default)]
    pub public_key: Option<String>,
}

/// Result of `GetPeer`; `peer` is absent when no peer matches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetPeerResponse {
    /// The matching peer, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peer: Option<Peer>,
}

/// Parameters for `AddPeer`.
///
/// Submitting a key that already exists updates that peer in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddPeerRequest {
    /// Public key identifying the peer.
    #[serde(default)]
    pub public_key: Option<String>,
    /// Optional preshared key in base64.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preshared_key: Option<String>,
    /// Optional `host:port` endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Optional keep-alive interval such as `25s`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persistent_keep_alive: Option<String>,
    /// Address ranges routed to the peer, in CIDR notation.
    ///
    /// When given, they replace the peer's current ranges. When empty or
    /// omitted, an existing peer keeps its ranges.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_ips: Vec<String>,
    /// Run validation only; apply nothing.
    #[serde(default)]
    pub validate_only: bool,
}

/// Result of `AddPeer`.
///
/// `ok` is `false` only for validate-only requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddPeerResponse {
    /// Whether the change was applied.
    pub ok: bool,
}

/// Parameters for `RemovePeer`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemovePeerRequest {
    /// Public key of the peer to remove.
    #[serde(default)]
    pub public_key: Option<String>,
    /// Run validation only; apply nothing.
    #[serde(default)]
    pub validate_only: bool,
}

/// Result of `RemovePeer`.
///
/// `ok` is `false` only for validate-only requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemovePeerResponse {
    /// Whether the change was applied.
    pub ok: bool,
}
