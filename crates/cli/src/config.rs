//! Layered CLI configuration.
//!
//! Later layers override earlier ones:
//! 1. built-in defaults
//! 2. `operrouter.toml` in the working directory, or the file given by `--config`
//! 3. `OPERROUTER_*` environment variables (`__` separates nested keys).
//!    Under `HEADERS__` a `_` stands for `-`, so `OPERROUTER_HEADERS__X_API_KEY`
//!    sets the `x-api-key` header.
//! 4. command-line flags

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::ValueEnum;
use contract::{ClientConfig, ClientError, DEFAULT_TIMEOUT};
use figment::providers::{Env, Format, Serialized, Toml};
use figment::value::{Uncased, UncasedStr};
use figment::Figment;
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_FILE: &str = "operrouter.toml";
pub const ENV_PREFIX: &str = "OPERROUTER_";
pub const DEFAULT_ENDPOINT: &str = "http://localhost:8080";

/// Which transport client the CLI constructs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum TransportKind {
    #[default]
    Jsonrpc,
    GrpcWeb,
    Wasm,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliConfig {
    pub transport: TransportKind,
    pub endpoint: String,
    pub timeout_ms: u64,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wasm_module: Option<PathBuf>,
    pub log_format: LogFormat,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            transport: TransportKind::default(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_ms: DEFAULT_TIMEOUT.as_millis() as u64,
            headers: BTreeMap::new(),
            wasm_module: None,
            log_format: LogFormat::default(),
        }
    }
}

/// Values given as flags; `None` leaves the lower layers in place.
#[derive(Debug, Default, Serialize)]
pub struct Overrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transport: Option<TransportKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wasm_module: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_format: Option<LogFormat>,
}

/// Maps an environment key (prefix already stripped) to its config path.
fn env_key(key: &UncasedStr) -> Uncased<'_> {
    let path = key.as_str().replace("__", ".");
    match path.split_once('.') {
        Some((section, header)) if section.eq_ignore_ascii_case("headers") => {
            format!("headers.{}", header.replace('_', "-").to_ascii_lowercase()).into()
        }
        _ => path.into(),
    }
}

impl CliConfig {
    pub fn figment(file: Option<&Path>, overrides: &Overrides) -> Figment {
        let file = file.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
        Figment::from(Serialized::defaults(CliConfig::default()))
            .merge(Toml::file(file))
            .merge(Env::prefixed(ENV_PREFIX).map(env_key))
            .merge(Serialized::defaults(overrides))
    }

    pub fn load(file: Option<&Path>, overrides: &Overrides) -> Result<Self, figment::Error> {
        Self::figment(file, overrides).extract()
    }

    /// The transport-level settings derived from this configuration.
    pub fn client_config(&self) -> Result<ClientConfig, ClientError> {
        let mut config = ClientConfig::new(&self.endpoint)?
            .with_timeout(Duration::from_millis(self.timeout_ms));
        for (name, value) in &self.headers {
            config = config.with_header(name, value);
        }
        if let Some(path) = &self.wasm_module {
            config = config.with_wasm_module(path);
        }
        Ok(config)
    }
}
