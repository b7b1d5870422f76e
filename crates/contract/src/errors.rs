//! Error type shared by every transport.
//!
//! [`ClientError`] covers infrastructure faults only: the exchange with the
//! server could not be completed or its answer could not be understood. When
//! the remote operation itself fails (unknown datasource, bad credentials) the
//! call still succeeds and returns a result with `success == false`.
//!
//! ## Taxonomy
//!
//! | Kind | Variants |
//! |------|----------|
//! | Transport | [`ClientError::Transport`], [`ClientError::HttpStatus`], [`ClientError::GrpcStatus`] |
//! | Protocol | [`ClientError::Rpc`], [`ClientError::MalformedResponse`] |
//! | Timeout | [`ClientError::Timeout`] |
//! | Local | [`ClientError::Configuration`], [`ClientError::Module`] |
//!
//! None of these are retried by the client.

use std::time::Duration;

use thiserror::Error;

/// An infrastructure or protocol fault raised by a transport client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request could not be sent or the response body could not be read
    /// (connection refused, reset, DNS failure).
    #[error("Transport failure: {message}")]
    Transport {
        /// Description of the underlying I/O problem.
        message: String,
    },

    /// The HTTP exchange completed with a non-success status.
    #[error("HTTP {status}: {reason}")]
    HttpStatus {
        /// Numeric status code.
        status: u16,
        /// Canonical reason phrase (may be empty).
        reason: String,
    },

    /// A gRPC-Web exchange ended with a non-OK `grpc-status`.
    #[error("gRPC status {code}: {message}")]
    GrpcStatus {
        /// gRPC status code (`0` is OK and never appears here).
        code: u32,
        /// Value of `grpc-message`, possibly empty.
        message: String,
    },

    /// The server answered with a JSON-RPC error envelope.
    #[error("JSON-RPC Error {code}: {message}")]
    Rpc {
        /// JSON-RPC error code.
        code: i64,
        /// JSON-RPC error message.
        message: String,
    },

    /// The response could not be interpreted: bad envelope, mismatched id,
    /// undecodable body, or a required field missing.
    #[error("Malformed response: {message}")]
    MalformedResponse {
        /// What was wrong with the response.
        message: String,
    },

    /// No response arrived within the configured bound; the request was aborted.
    #[error("Request timed out after {}ms", .after.as_millis())]
    Timeout {
        /// The configured per-call timeout.
        after: Duration,
    },

    /// The client was constructed with unusable settings.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration problem.
        message: String,
    },

    /// The WASM module could not be loaded or a call into it failed.
    #[error("WASM module error: {message}")]
    Module {
        /// Description of the module failure.
        message: String,
    },
}

impl ClientError {
    /// Shorthand for [`ClientError::MalformedResponse`].
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a [`ClientError::Timeout`].
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
