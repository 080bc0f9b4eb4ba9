//! Method names understood by the dispatcher.

use wgapi_types::methods;

/// Known RPC methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Interface snapshot.
    GetDeviceInfo,
    /// Full peer list.
    ListPeers,
    /// Single peer lookup.
    GetPeer,
    /// Peer insert or update.
    AddPeer,
    /// Peer removal.
    RemovePeer,
}

impl Method {
    /// Every method, in the order they are documented.
    pub const ALL: [Self; 5] = [
        Self::GetDeviceInfo,
        Self::ListPeers,
        Self::GetPeer,
        Self::AddPeer,
        Self::RemovePeer,
    ];

    /// Parses a method name. Matching is exact and case-sensitive.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|method| method.as_str() == value)
    }

    /// Returns the canonical method name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GetDeviceInfo => methods::GET_DEVICE_INFO,
            Self::ListPeers => methods::LIST_PEERS,
            Self::GetPeer => methods::GET_PEER,
            Self::AddPeer => methods::ADD_PEER,
            Self::RemovePeer => methods::REMOVE_PEER,
        }
    }

    /// Whether the method changes the interface.
    pub const fn is_mutation(self) -> bool {
        matches!(self, Self::AddPeer | Self::RemovePeer)
    }
}
