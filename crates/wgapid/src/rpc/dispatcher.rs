//! Request routing and per-method handlers.
//!
//! A [`Dispatcher`] owns the managed interface name and a provider. Each call
//! to [`Dispatcher::handle`] runs the full pipeline (decode, route, validate,
//! execute) and returns one response value. Failures before execution never
//! reach the provider.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info};

use wgapi_types::{
    AddPeerRequest, AddPeerResponse, GetDeviceInfoRequest, GetDeviceInfoResponse, GetPeerRequest,
    GetPeerResponse, ListPeersRequest, ListPeersResponse, RemovePeerRequest, RemovePeerResponse,
};

use super::envelope::{self, RpcRequest, RpcResponse};
use super::errors::{RpcError, ServerCode};
use super::method::Method;
use super::{translate, validation};
use crate::provider::{Device, InterfaceControl, PeerChange, ProviderError};

/// Tracing target for RPC dispatch.
pub(crate) const RPC_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::rpc");

/// Routes JSON-RPC requests to the managed interface.
#[derive(Debug)]
pub struct Dispatcher<P> {
    device: String,
    provider: P,
}

impl<P: InterfaceControl> Dispatcher<P> {
    /// Creates a dispatcher for the named interface.
    pub fn new(device: impl Into<String>, provider: P) -> Self {
        Self {
            device: device.into(),
            provider,
        }
    }

    /// Decodes, dispatches and answers one request body.
    pub fn handle(&self, body: &[u8]) -> RpcResponse {
        let request = match envelope::decode(body) {
            Ok(request) => request,
            Err(error) => {
                debug!(target: RPC_TARGET, error = %error, "rejected request envelope");
                return error.into_response();
            }
        };
        let id = request.id.clone();
        match self.dispatch(request) {
            Ok(result) => RpcResponse::success(id, result),
            Err(error) => {
                debug!(
                    target: RPC_TARGET,
                    kind = ?error.kind(),
                    code = error.code(),
                    message = error.message(),
                    "request failed"
                );
                RpcResponse::failure(id, error)
            }
        }
    }

    /// Routes a decoded request and returns its result value.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError`] for unknown methods, invalid parameters and
    /// provider failures.
    pub fn dispatch(&self, request: RpcRequest) -> Result<Value, RpcError> {
        let Some(method) = Method::parse(&request.method) else {
            debug!(target: RPC_TARGET, method = %request.method, "unknown method");
            return Err(RpcError::method_not_found());
        };
        debug!(
            target: RPC_TARGET,
            method = method.as_str(),
            mutation = method.is_mutation(),
            "dispatching request"
        );

        let params = request.params;
        match method {
            Method::GetDeviceInfo => {
                decode_params::<GetDeviceInfoRequest>(params)?;
                to_value(&self.get_device_info()?)
            }
            Method::ListPeers => to_value(&self.list_peers(&decode_params(params)?)?),
            Method::GetPeer => to_value(&self.get_peer(&decode_params(params)?)?),
            Method::AddPeer => to_value(&self.add_peer(&decode_params(params)?)?),
            Method::RemovePeer => to_value(&self.remove_peer(&decode_params(params)?)?),
        }
    }

    fn get_device_info(&self) -> Result<GetDeviceInfoResponse, RpcError> {
        let device = self.read_device()?;
        Ok(GetDeviceInfoResponse {
            device: translate::device(&device),
        })
    }

    fn list_peers(&self, request: &ListPeersRequest) -> Result<ListPeersResponse, RpcError> {
        validation::pagination(request)?;
        let device = self.read_device()?;
        Ok(ListPeersResponse {
            peers: device.peers.iter().map(translate::peer).collect(),
        })
    }

    fn get_peer(&self, request: &GetPeerRequest) -> Result<GetPeerResponse, RpcError> {
        let key = validation::public_key(request.public_key.as_deref())?;
        let device = self.read_device()?;
        Ok(GetPeerResponse {
            peer: device
                .peers
                .iter()
                .find(|peer| peer.public_key == key)
                .map(translate::peer),
        })
    }

    fn add_peer(&self, request: &AddPeerRequest) -> Result<AddPeerResponse, RpcError> {
        let config = validation::add_peer(request)?;
        if request.validate_only {
            return Ok(AddPeerResponse { ok: false });
        }
        self.apply(&PeerChange::Upsert(config))?;
        Ok(AddPeerResponse { ok: true })
    }

    fn remove_peer(&self, request: &RemovePeerRequest) -> Result<RemovePeerResponse, RpcError> {
        let key = validation::public_key(request.public_key.as_deref())?;
        if request.validate_only {
            return Ok(RemovePeerResponse { ok: false });
        }
        self.apply(&PeerChange::Remove(key))?;
        Ok(RemovePeerResponse { ok: true })
    }

    fn read_device(&self) -> Result<Device, RpcError> {
        self.provider
            .device(&self.device)
            .map_err(|error| provider_error("could not get WireGuard device", &error))
    }

    fn apply(&self, change: &PeerChange) -> Result<(), RpcError> {
        self.provider
            .configure_peer(&self.device, change)
            .map_err(|error| provider_error("could not configure WireGuard device", &error))?;
        info!(
            target: RPC_TARGET,
            device = %self.device,
            peer = %change.public_key(),
            removed = matches!(change, PeerChange::Remove(_)),
            "peer configuration applied"
        );
        Ok(())
    }
}

fn provider_error(context: &str, error: &ProviderError) -> RpcError {
    RpcError::server(ServerCode::PROVIDER, format!("{context}: {error}"))
}

/// Decodes method parameters. Absent or `null` params yield the default.
fn decode_params<T>(params: Option<Value>) -> Result<T, RpcError>
where
    T: DeserializeOwned + Default,
{
    match params {
        None => Ok(T::default()),
        Some(value @ Value::Object(_)) => serde_json::from_value(value)
            .map_err(|error| RpcError::invalid_params(format!("invalid params: {error}"))),
        Some(_) => Err(RpcError::invalid_params("params must be an object")),
    }
}

fn to_value<T: Serialize>(result: &T) -> Result<Value, RpcError> {
    serde_json::to_value(result)
        .map_err(|error| RpcError::internal(format!("failed to encode result: {error}")))
}
