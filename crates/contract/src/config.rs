//! Per-client settings, fixed at construction.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use http::header::{HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};

use crate::ClientError;

/// Timeout applied to each call when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(30_000);

/// Immutable settings for one transport client.
///
/// The HTTP transports use `headers`; only the WASM transport reads
/// `wasm_module`. Transports take the config by value and never change it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Unchecked")]
pub struct ClientConfig {
    endpoint: String,
    #[serde(rename = "timeout_ms", with = "millis", default = "default_timeout")]
    timeout: Duration,
    #[serde(default)]
    headers: BTreeMap<String, String>,
    #[serde(default)]
    wasm_module: Option<PathBuf>,
}

fn default_timeout() -> Duration {
    DEFAULT_TIMEOUT
}

/// Deserialisation shape; routed through [`ClientConfig::new`] for validation.
#[derive(Deserialize)]
struct Unchecked {
    endpoint: String,
    #[serde(rename = "timeout_ms", with = "millis", default = "default_timeout")]
    timeout: Duration,
    #[serde(default)]
    headers: BTreeMap<String, String>,
    #[serde(default)]
    wasm_module: Option<PathBuf>,
}

impl TryFrom<Unchecked> for ClientConfig {
    type Error = ClientError;

    fn try_from(raw: Unchecked) -> Result<Self, Self::Error> {
        let mut config = Self::new(raw.endpoint)?.with_timeout(raw.timeout);
        config.headers = raw.headers;
        config.wasm_module = raw.wasm_module;
        Ok(config)
    }
}

impl ClientConfig {
    /// Creates a config for `endpoint`, dropping one trailing `/`.
    pub fn new(endpoint: impl Into<String>) -> Result<Self, ClientError> {
        let mut endpoint = endpoint.into();
        if endpoint.ends_with('/') {
            endpoint.pop();
        }
        if endpoint.is_empty() {
            return Err(ClientError::Configuration {
                message: "endpoint must not be empty".into(),
            });
        }
        Ok(Self {
            endpoint,
            timeout: DEFAULT_TIMEOUT,
            headers: BTreeMap::new(),
            wasm_module: None,
        })
    }

    /// Sets the per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Adds a static header sent with every HTTP request.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Sets the path of the WASM module loaded by the WASM transport.
    pub fn with_wasm_module(mut self, path: impl Into<PathBuf>) -> Self {
        self.wasm_module = Some(path.into());
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    pub fn wasm_module(&self) -> Option<&Path> {
        self.wasm_module.as_deref()
    }

    /// The configured headers as HTTP name/value pairs.
    ///
    /// Fails with [`ClientError::Configuration`] on a name or value HTTP
    /// cannot carry.
    pub fn header_pairs(&self) -> Result<Vec<(HeaderName, HeaderValue)>, ClientError> {
        self.headers
            .iter()
            .map(|(name, value)| {
                let header = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                    ClientError::Configuration {
                        message: format!("invalid header name '{name}': {e}"),
                    }
                })?;
                let value = HeaderValue::from_str(value).map_err(|e| ClientError::Configuration {
                    message: format!("invalid value for header '{name}': {e}"),
                })?;
                Ok((header, value))
            })
            .collect()
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
