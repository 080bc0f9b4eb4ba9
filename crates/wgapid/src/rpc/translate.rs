//! Domain snapshots to wire shapes.

use std::time::{Duration, SystemTime};

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use wgapi_types as wire;

use super::duration;
use crate::provider::{Device, PeerState};

/// Timestamp reported for peers that have never completed a handshake.
pub(crate) const NEVER: &str = "0001-01-01T00:00:00Z";

/// Wire view of an interface snapshot.
#[must_use]
pub fn device(device: &Device) -> wire::Device {
    wire::Device {
        name: device.name.clone(),
        kind: device.kind.as_str().to_owned(),
        public_key: device.public_key.to_base64(),
        listen_port: device.listen_port,
        firewall_mark: (device.firewall_mark != 0).then_some(device.firewall_mark),
        num_peers: device.peers.len(),
    }
}

/// Wire view of a peer. The preshared key is reduced to a presence flag.
#[must_use]
pub fn peer(peer: &PeerState) -> wire::Peer {
    wire::Peer {
        public_key: peer.public_key.to_base64(),
        has_preshared_key: peer.preshared_key.is_some(),
        endpoint: peer
            .endpoint
            .map(|address| address.to_string())
            .unwrap_or_default(),
        persistent_keep_alive: keepalive(peer.persistent_keepalive),
        last_handshake: handshake(peer.last_handshake),
        receive_bytes: peer.receive_bytes,
        transmit_bytes: peer.transmit_bytes,
        allowed_ips: peer.allowed_ips.iter().map(ToString::to_string).collect(),
        protocol_version: peer.protocol_version,
    }
}

fn keepalive(interval: Duration) -> Option<String> {
    (!interval.is_zero()).then(|| duration::format(interval))
}

fn handshake(at: Option<SystemTime>) -> String {
    at.and_then(|time| OffsetDateTime::from(time).format(&Rfc3339).ok())
        .unwrap_or_else(|| NEVER.to_owned())
}
