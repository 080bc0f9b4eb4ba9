//! HTTP transport for the JSON-RPC API.
//!
//! The transport binds the configured endpoint, optionally terminates TLS,
//! reads one HTTP request per connection, and passes it through the
//! middleware chain to the JSON-RPC endpoint. Connections are served on their
//! own threads.

mod endpoint;
mod errors;
mod handler;
mod http;
mod listener;
mod middleware;
mod server;
#[cfg(test)]
mod test_utils;
mod tls;

pub use self::errors::{HttpError, ListenerError, TlsError};
pub(crate) use self::handler::{ConnectionHandler, ConnectionStream};
pub(crate) use self::listener::{ListenerHandle, SocketListener};
pub(crate) use self::server::HttpConnectionHandler;
#[cfg(test)]
pub(crate) use self::test_utils::{CountingHandler, post_json, send_request};
pub(crate) use self::tls::server_config as tls_server_config;

const TRANSPORT_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");
