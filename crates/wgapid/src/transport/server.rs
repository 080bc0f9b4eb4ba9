//! HTTP connection handler wiring the middleware chain to the dispatcher.

use std::io::Write;
use std::sync::Arc;

use tracing::{debug, warn};

use super::endpoint::RpcEndpoint;
use super::errors::HttpError;
use super::http::{self, Response, StatusCode};
use super::middleware::{Chain, Handler, RefererBlock, RequestLogger, TokenAuth};
use super::{ConnectionHandler, ConnectionStream, TRANSPORT_TARGET};
use crate::provider::InterfaceControl;
use crate::rpc::Dispatcher;

/// Serves one HTTP request per connection through the middleware chain.
pub(crate) struct HttpConnectionHandler {
    chain: Chain,
}

impl HttpConnectionHandler {
    /// Builds the standard chain: referer block, token auth (when tokens are
    /// configured), request logging, then the JSON-RPC endpoint.
    pub(crate) fn new<P>(dispatcher: Arc<Dispatcher<P>>, tokens: Vec<String>) -> Self
    where
        P: InterfaceControl + 'static,
    {
        let mut chain = Chain::new(RpcEndpoint::new(dispatcher)).with(RefererBlock);
        if !tokens.is_empty() {
            chain = chain.with(TokenAuth::new(tokens));
        }
        Self {
            chain: chain.with(RequestLogger),
        }
    }
}

impl ConnectionHandler for HttpConnectionHandler {
    fn handle(&self, mut stream: ConnectionStream) {
        let remote_addr = stream.peer_addr();
        let response = match http::read_request(&mut stream, &remote_addr) {
            Ok(request) => self.chain.handle(&request),
            Err(HttpError::Closed) => {
                stream.close();
                return;
            }
            Err(HttpError::TooLarge) => {
                Response::error(StatusCode::PayloadTooLarge, "request too large")
            }
            Err(error @ HttpError::Malformed(_)) => {
                debug!(
                    target: TRANSPORT_TARGET,
                    remote_addr = %remote_addr,
                    error = %error,
                    "malformed request"
                );
                Response::error(StatusCode::BadRequest, error.to_string())
            }
            Err(error @ HttpError::Io { .. }) => {
                warn!(
                    target: TRANSPORT_TARGET,
                    remote_addr = %remote_addr,
                    error = %error,
                    "connection read error"
                );
                stream.close();
                return;
            }
        };

        if let Err(error) = stream
            .write_all(&response.to_bytes())
            .and_then(|()| stream.flush())
        {
            warn!(
                target: TRANSPORT_TARGET,
                remote_addr = %remote_addr,
                error = %error,
                "failed to write response"
            );
        }
        stream.close();
    }
}
