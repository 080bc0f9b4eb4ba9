//! JSON-RPC 2.0 envelope decoding and encoding.
//!
//! A response is a value: it can only be built with a result or with an
//! error, never both, so there is nothing to write twice.

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use wgapi_types::JSONRPC_VERSION;

use super::errors::RpcError;

/// Emitted if a response ever fails to serialise.
const ENCODE_FALLBACK: &[u8] =
    br#"{"jsonrpc":"2.0","error":{"code":-32603,"message":"failed to encode response"},"id":null}"#;

/// Decoded request envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct RpcRequest {
    /// Correlation id, `null` when absent.
    pub id: Value,
    /// Method name as sent by the client.
    pub method: String,
    /// Raw parameters; `None` when absent or `null`.
    pub params: Option<Value>,
}

/// Failures raised while decoding an envelope.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The payload was not well-formed JSON.
    #[error("{message}")]
    Parse {
        /// Parser diagnostic.
        message: String,
        /// Underlying parser error.
        #[source]
        source: serde_json::Error,
    },
    /// The payload was JSON but not a request object.
    #[error("{message}")]
    Invalid {
        /// Correlation id, when one could be read.
        id: Value,
        /// Description of the violation.
        message: String,
    },
}

impl DecodeError {
    fn invalid(id: Value, message: impl Into<String>) -> Self {
        Self::Invalid {
            id,
            message: message.into(),
        }
    }

    /// Converts the failure into the matching error response.
    #[must_use]
    pub fn into_response(self) -> RpcResponse {
        match self {
            Self::Parse { message, .. } => {
                RpcResponse::failure(Value::Null, RpcError::parse(message))
            }
            Self::Invalid { id, message } => {
                RpcResponse::failure(id, RpcError::invalid_request(message))
            }
        }
    }
}

/// Decodes a request envelope from raw bytes.
///
/// # Errors
///
/// Returns [`DecodeError::Parse`] for malformed JSON and
/// [`DecodeError::Invalid`] when the document is not a request object.
pub fn decode(bytes: &[u8]) -> Result<RpcRequest, DecodeError> {
    let document: Value = serde_json::from_slice(bytes).map_err(|source| DecodeError::Parse {
        message: source.to_string(),
        source,
    })?;
    let Value::Object(mut object) = document else {
        return Err(DecodeError::invalid(Value::Null, "request must be a JSON object"));
    };

    let id = read_id(&mut object)?;
    match object.get("jsonrpc") {
        None => {}
        Some(Value::String(version)) if version == JSONRPC_VERSION => {}
        Some(_) => {
            return Err(DecodeError::invalid(id, "jsonrpc version must be \"2.0\""));
        }
    }
    let method = match object.remove("method") {
        Some(Value::String(method)) => method,
        Some(_) => return Err(DecodeError::invalid(id, "method must be a string")),
        None => return Err(DecodeError::invalid(id, "method is required")),
    };
    let params = match object.remove("params") {
        None | Some(Value::Null) => None,
        Some(params) => Some(params),
    };

    Ok(RpcRequest { id, method, params })
}

fn read_id(object: &mut Map<String, Value>) -> Result<Value, DecodeError> {
    match object.remove("id") {
        None => Ok(Value::Null),
        Some(Value::Array(_) | Value::Object(_)) => Err(DecodeError::invalid(
            Value::Null,
            "id must be a string, number or null",
        )),
        Some(id) => Ok(id),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
enum Outcome {
    Result(Value),
    Error(RpcError),
}

/// Response envelope holding exactly one of `result` or `error`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RpcResponse {
    jsonrpc: &'static str,
    #[serde(flatten)]
    outcome: Outcome,
    id: Value,
}

impl RpcResponse {
    /// Builds a successful response.
    #[must_use]
    pub const fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            outcome: Outcome::Result(result),
            id,
        }
    }

    /// Builds an error response.
    #[must_use]
    pub const fn failure(id: Value, error: RpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            outcome: Outcome::Error(error),
            id,
        }
    }

    /// Correlation id echoed from the request.
    #[must_use]
    pub const fn id(&self) -> &Value {
        &self.id
    }

    /// Result payload of a successful response.
    #[must_use]
    pub const fn result(&self) -> Option<&Value> {
        match &self.outcome {
            Outcome::Result(value) => Some(value),
            Outcome::Error(_) => None,
        }
    }

    /// Error of a failed response.
    #[must_use]
    pub const fn error(&self) -> Option<&RpcError> {
        match &self.outcome {
            Outcome::Result(_) => None,
            Outcome::Error(error) => Some(error),
        }
    }
}

/// Encodes a response as JSON bytes.
#[must_use]
pub fn encode(response: &RpcResponse) -> Vec<u8> {
    serde_json::to_vec(response).unwrap_or_else(|_| ENCODE_FALLBACK.to_vec())
}
