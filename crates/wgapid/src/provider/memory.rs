//! In-memory interface used by tests and integration harnesses.

use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{
    Device, DeviceKind, InterfaceControl, KEY_LEN, Key, PeerChange, PeerConfig, PeerState,
    ProviderError,
};

/// Interface whose peer table lives in process memory.
#[derive(Debug)]
pub struct MemoryProvider {
    device: Mutex<Device>,
}

impl MemoryProvider {
    /// Creates an empty userspace interface called `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            device: Mutex::new(Device {
                name: name.into(),
                kind: DeviceKind::Userspace,
                public_key: Key::from_bytes([1; KEY_LEN]),
                listen_port: 51820,
                firewall_mark: 0,
                peers: Vec::new(),
            }),
        }
    }

    /// Seeds the peer table.
    #[must_use]
    pub fn with_peers(self, peers: Vec<PeerState>) -> Self {
        self.lock().peers = peers;
        self
    }

    /// Copy of the current interface state.
    #[must_use]
    pub fn snapshot(&self) -> Device {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Device> {
        self.device.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl InterfaceControl for MemoryProvider {
    fn device(&self, name: &str) -> Result<Device, ProviderError> {
        let device = self.lock();
        if device.name != name {
            return Err(ProviderError::device_not_found(name));
        }
        Ok(device.clone())
    }

    fn configure_peer(&self, name: &str, change: &PeerChange) -> Result<(), ProviderError> {
        let mut device = self.lock();
        if device.name != name {
            return Err(ProviderError::device_not_found(name));
        }
        match change {
            PeerChange::Upsert(config) => upsert(&mut device.peers, config),
            PeerChange::Remove(key) => device.peers.retain(|peer| peer.public_key != *key),
        }
        Ok(())
    }

    fn devices(&self) -> Result<Vec<String>, ProviderError> {
        Ok(vec![self.lock().name.clone()])
    }
}

fn upsert(peers: &mut Vec<PeerState>, config: &PeerConfig) {
    let index = match peers
        .iter()
        .position(|peer| peer.public_key == config.public_key)
    {
        Some(index) => index,
        None => {
            peers.push(PeerState::new(config.public_key));
            peers.len() - 1
        }
    };
    let Some(peer) = peers.get_mut(index) else {
        return;
    };
    if let Some(key) = config.preshared_key {
        peer.preshared_key = Some(key);
    }
    if let Some(endpoint) = config.endpoint {
        peer.endpoint = Some(endpoint);
    }
    if let Some(keepalive) = config.persistent_keepalive {
        peer.persistent_keepalive = keepalive;
    }
    if !config.allowed_ips.is_empty() {
        peer.allowed_ips.clone_from(&config.allowed_ips);
    }
}
