//! JSON-RPC 2.0 core: envelopes, error codes, routing and validation.
//!
//! The transport hands raw request bodies to [`Dispatcher::handle`] and
//! writes back the encoded [`RpcResponse`]. Nothing in this module performs
//! IO beyond the provider calls made by the dispatcher.

mod dispatcher;
pub mod duration;
mod envelope;
mod errors;
mod method;
mod translate;
pub mod validation;

pub use dispatcher::Dispatcher;
pub use envelope::{DecodeError, RpcRequest, RpcResponse, decode, encode};
pub use errors::{
    ErrorKind, INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST, InvalidServerCode,
    METHOD_NOT_FOUND, PARSE_ERROR, RpcError, ServerCode,
};
pub use method::Method;
