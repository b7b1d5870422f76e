//! JSON-RPC 2.0 request and response envelopes.

use contract::{ClientError, RequestId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Protocol version carried in every envelope.
pub const JSONRPC_VERSION: &str = "2.0";

/// `{jsonrpc, method, params, id}` as sent on the wire.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcRequest<'a> {
    pub jsonrpc: &'static str,
    pub method: &'a str,
    pub params: Value,
    pub id: RequestId,
}

impl<'a> JsonRpcRequest<'a> {
    pub fn new(method: &'a str, params: Value, id: RequestId) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            method,
            params,
            id,
        }
    }
}

/// The `error` member of a response envelope.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct JsonRpcErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub data: Option<Value>,
}

/// `{jsonrpc, result?, error?, id}` as received from the server.
///
/// A `null` result is indistinguishable from an absent one and is treated as
/// missing.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<JsonRpcErrorObject>,
    #[serde(default)]
    pub id: Option<Value>,
}

impl JsonRpcResponse {
    /// Unwraps the envelope of the response to request `expected`.
    ///
    /// An `error` member wins over everything else. Otherwise the envelope
    /// must carry a result and echo the request id.
    pub fn into_result(self, expected: RequestId) -> Result<Value, ClientError> {
        if let Some(error) = self.error {
            return Err(ClientError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        if let Some(version) = self.jsonrpc.as_deref() {
            if version != JSONRPC_VERSION {
                return Err(ClientError::malformed(format!(
                    "unsupported JSON-RPC version '{version}'"
                )));
            }
        }

        let result = self
            .result
            .ok_or_else(|| ClientError::malformed("invalid JSON-RPC response: missing result"))?;

        match self.id {
            Some(Value::Number(n)) if n.as_u64() == Some(expected.as_u64()) => Ok(result),
            Some(other) => Err(ClientError::malformed(format!(
                "response id {other} does not match request id {expected}"
            ))),
            None => Err(ClientError::malformed("invalid JSON-RPC response: missing id")),
        }
    }
}
