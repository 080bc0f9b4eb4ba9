//! Wire-to-domain validation rules.
//!
//! Every rule is a pure function that either returns a normalised value or a
//! [`ValidationError`] naming the offending field. Checks run presence first,
//! then length, then decoding, then range.

use std::net::{SocketAddr, ToSocketAddrs};
use std::time::Duration;

use ipnet::IpNet;
use thiserror::Error;

use wgapi_types::{AddPeerRequest, ListPeersRequest};

use super::duration::{self, DurationError};
use super::errors::RpcError;
use crate::provider::{ENCODED_KEY_LEN, Key, KeyError, PeerConfig};

/// Largest keep-alive interval the interface accepts, in seconds.
pub const MAX_KEEPALIVE_SECS: u64 = u16::MAX as u64;

const PUBLIC_KEY: &str = "public key";
const PRESHARED_KEY: &str = "preshared key";

/// A parameter that failed validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field was missing or empty.
    #[error("{field} is required")]
    Missing {
        /// Field label.
        field: &'static str,
    },
    /// A key had the wrong encoded length.
    #[error("malformed {field}")]
    Malformed {
        /// Field label.
        field: &'static str,
    },
    /// A key failed to decode.
    #[error("invalid {field}: {source}")]
    Key {
        /// Field label.
        field: &'static str,
        /// Decoding failure.
        #[source]
        source: KeyError,
    },
    /// The endpoint did not resolve to a socket address.
    #[error("invalid endpoint: {reason}")]
    Endpoint {
        /// Resolution failure.
        reason: String,
    },
    /// The keep-alive interval was unusable.
    #[error("invalid keepalive: {reason}")]
    Keepalive {
        /// Parse or range failure.
        reason: String,
    },
    /// An allowed-IP entry was not a CIDR range.
    #[error("range {entry:?} is not valid: {reason}")]
    Range {
        /// The rejected entry, verbatim.
        entry: String,
        /// Parse failure.
        reason: String,
    },
    /// A pagination value was negative.
    #[error("{field} must be positive integer")]
    Negative {
        /// Field name.
        field: &'static str,
    },
}

impl From<ValidationError> for RpcError {
    fn from(error: ValidationError) -> Self {
        Self::invalid_params(error.to_string())
    }
}

/// Validates a required public key.
///
/// # Errors
///
/// Returns [`ValidationError`] when the key is missing, not 44 characters,
/// or does not decode to 32 bytes.
pub fn public_key(value: Option<&str>) -> Result<Key, ValidationError> {
    match value {
        None | Some("") => Err(ValidationError::Missing { field: PUBLIC_KEY }),
        Some(text) => key(PUBLIC_KEY, text),
    }
}

/// Validates an optional preshared key. An empty string counts as absent.
///
/// # Errors
///
/// Returns [`ValidationError`] when a supplied key is malformed.
pub fn preshared_key(value: Option<&str>) -> Result<Option<Key>, ValidationError> {
    match value {
        None | Some("") => Ok(None),
        Some(text) => key(PRESHARED_KEY, text).map(Some),
    }
}

fn key(field: &'static str, text: &str) -> Result<Key, ValidationError> {
    if text.len() != ENCODED_KEY_LEN {
        return Err(ValidationError::Malformed { field });
    }
    Key::from_base64(text).map_err(|source| ValidationError::Key { field, source })
}

/// Resolves an optional `host:port` endpoint to its first socket address.
///
/// # Errors
///
/// Returns [`ValidationError::Endpoint`] when the text does not resolve.
pub fn endpoint(value: Option<&str>) -> Result<Option<SocketAddr>, ValidationError> {
    let Some(text) = value.filter(|text| !text.is_empty()) else {
        return Ok(None);
    };
    let mut addresses = text
        .to_socket_addrs()
        .map_err(|error| ValidationError::Endpoint {
            reason: error.to_string(),
        })?;
    addresses
        .next()
        .map(Some)
        .ok_or_else(|| ValidationError::Endpoint {
            reason: format!("no addresses found for {text:?}"),
        })
}

/// Parses an optional keep-alive interval, truncated to whole seconds.
///
/// # Errors
///
/// Returns [`ValidationError::Keepalive`] for malformed, negative or
/// out-of-range intervals.
pub fn keepalive(value: Option<&str>) -> Result<Option<Duration>, ValidationError> {
    let Some(text) = value.filter(|text| !text.is_empty()) else {
        return Ok(None);
    };
    let interval = duration::parse(text).map_err(|error: DurationError| {
        ValidationError::Keepalive {
            reason: error.to_string(),
        }
    })?;
    let seconds = interval.as_secs();
    if seconds > MAX_KEEPALIVE_SECS {
        return Err(ValidationError::Keepalive {
            reason: format!("{text:?} exceeds {MAX_KEEPALIVE_SECS} seconds"),
        });
    }
    Ok(Some(Duration::from_secs(seconds)))
}

/// Parses allowed-IP ranges, masking host bits. The first bad entry fails
/// the whole list.
///
/// # Errors
///
/// Returns [`ValidationError::Range`] naming the first invalid entry.
pub fn allowed_ips(entries: &[String]) -> Result<Vec<IpNet>, ValidationError> {
    entries
        .iter()
        .map(|entry| {
            entry
                .parse::<IpNet>()
                .map(|range| range.trunc())
                .map_err(|error| ValidationError::Range {
                    entry: entry.clone(),
                    reason: error.to_string(),
                })
        })
        .collect()
}

/// Checks that pagination values are non-negative.
///
/// # Errors
///
/// Returns [`ValidationError::Negative`] for the first negative value.
pub fn pagination(request: &ListPeersRequest) -> Result<(), ValidationError> {
    if request.limit.is_some_and(|limit| limit < 0) {
        return Err(ValidationError::Negative { field: "limit" });
    }
    if request.offset.is_some_and(|offset| offset < 0) {
        return Err(ValidationError::Negative { field: "offset" });
    }
    Ok(())
}

/// Turns an `AddPeer` request into a peer configuration.
///
/// # Errors
///
/// Returns the first [`ValidationError`] in field order.
pub fn add_peer(request: &AddPeerRequest) -> Result<PeerConfig, ValidationError> {
    Ok(PeerConfig {
        public_key: public_key(request.public_key.as_deref())?,
        preshared_key: preshared_key(request.preshared_key.as_deref())?,
        endpoint: endpoint(request.endpoint.as_deref())?,
        persistent_keepalive: keepalive(request.persistent_keep_alive.as_deref())?,
        allowed_ips: allowed_ips(&request.allowed_ips)?,
    })
}
