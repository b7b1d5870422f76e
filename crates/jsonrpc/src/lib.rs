//! OperRouter JSON-RPC transport.
//!
//! Implements [`contract::OperRouterClient`] by issuing one JSON-RPC 2.0
//! request/response exchange per operation, `POST`ed to a single endpoint.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Envelope framing, request-id correlation, timeouts, and
//! HTTP status handling live here. Callers see only
//! [`contract::OperRouterClient`].
//!
//! ## Wire contract
//!
//! Request: `{"jsonrpc": "2.0", "method": <name>, "params": {...}, "id": <n>}`.
//! Response: `{"jsonrpc": "2.0", "result"?: ..., "error"?: {code, message, data?}, "id": <n>}`.
//!
//! Core methods are flat (`ping`, `get_metadata`); resource methods are
//! dot-qualified (`datasource.query`, `llm.chat`). See [`methods`].
//!
//! Configuration payloads and chat roles are forwarded exactly as the caller
//! supplied them; the server validates symbolic names.

mod client;
pub mod envelope;
mod replies;

pub use client::{methods, JsonRpcClient};
pub use envelope::{JsonRpcErrorObject, JsonRpcRequest, JsonRpcResponse, JSONRPC_VERSION};
