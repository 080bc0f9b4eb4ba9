//! Error catalogue for the JSON-RPC surface.
//!
//! Codes are part of the wire contract: clients branch on them, so the
//! values below never change. Messages are informational only.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Payload was not well-formed JSON.
pub const PARSE_ERROR: i64 = -32700;
/// Payload was JSON but not a valid request object.
pub const INVALID_REQUEST: i64 = -32600;
/// Method name is not registered.
pub const METHOD_NOT_FOUND: i64 = -32601;
/// Parameters failed validation.
pub const INVALID_PARAMS: i64 = -32602;
/// Unexpected local failure.
pub const INTERNAL_ERROR: i64 = -32603;

/// Code in the implementation-defined server error range.
///
/// Only values in `-32099..=-32000` can be constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ServerCode(i64);

impl ServerCode {
    /// Lowest code in the reserved range.
    pub const MIN: i64 = -32099;
    /// Highest code in the reserved range.
    pub const MAX: i64 = -32000;
    /// Code reported when the interface control provider fails.
    pub const PROVIDER: Self = Self(Self::MAX);

    /// Validates `code` against the reserved range.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidServerCode`] when `code` lies outside
    /// `-32099..=-32000`.
    pub const fn new(code: i64) -> Result<Self, InvalidServerCode> {
        if code >= Self::MIN && code <= Self::MAX {
            Ok(Self(code))
        } else {
            Err(InvalidServerCode { code })
        }
    }

    /// Numeric value of the code.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

/// Raised when a server error code falls outside the reserved range.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("server error code {code} is outside the reserved range -32099..=-32000")]
pub struct InvalidServerCode {
    /// The rejected code.
    pub code: i64,
}

/// Classification of a protocol error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed JSON payload.
    Parse,
    /// Well-formed JSON that is not a valid request.
    InvalidRequest,
    /// Unknown method name.
    MethodNotFound,
    /// Parameters rejected by validation.
    InvalidParams,
    /// Unexpected local failure.
    Internal,
    /// Interface control provider failure.
    Server(ServerCode),
}

impl ErrorKind {
    /// Wire code for the kind.
    #[must_use]
    pub const fn code(self) -> i64 {
        match self {
            Self::Parse => PARSE_ERROR,
            Self::InvalidRequest => INVALID_REQUEST,
            Self::MethodNotFound => METHOD_NOT_FOUND,
            Self::InvalidParams => INVALID_PARAMS,
            Self::Internal => INTERNAL_ERROR,
            Self::Server(code) => code.get(),
        }
    }
}

/// Error member of a JSON-RPC response.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("rpc error {code}: {message}", code = .kind.code())]
pub struct RpcError {
    kind: ErrorKind,
    message: String,
    data: Option<Value>,
}

impl RpcError {
    fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            data: None,
        }
    }

    /// Creates a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Parse, message)
    }

    /// Creates an invalid request error.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidRequest, message)
    }

    /// Creates the method-not-found error.
    #[must_use]
    pub fn method_not_found() -> Self {
        Self::new(ErrorKind::MethodNotFound, "method not found")
    }

    /// Creates an invalid params error.
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidParams, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Creates a server error with a code from the reserved range.
    pub fn server(code: ServerCode, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Server(code), message)
    }

    /// Attaches an opaque data payload.
    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Error classification.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Wire code.
    #[must_use]
    pub const fn code(&self) -> i64 {
        self.kind.code()
    }

    /// Human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Optional data payload.
    #[must_use]
    pub const fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }
}

#[derive(Serialize)]
struct WireError<'a> {
    code: i64,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a Value>,
}

impl Serialize for RpcError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        WireError {
            code: self.code(),
            message: &self.message,
            data: self.data.as_ref(),
        }
        .serialize(serializer)
    }
}
