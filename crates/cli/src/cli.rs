//! Command-line surface: one subcommand per client operation.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use contract::{ChatMessage, DomainValue};

use crate::config::{LogFormat, Overrides, TransportKind};

#[derive(Debug, Parser)]
#[command(name = "operrouter", version, about = "Call an OperRouter service from the command line")]
pub struct Cli {
    /// Configuration file (defaults to ./operrouter.toml when present).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, value_enum)]
    pub transport: Option<TransportKind>,

    /// Service endpoint, e.g. http://localhost:8080.
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    /// Per-call timeout in milliseconds.
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    /// Core WASM module for the `wasm` transport.
    #[arg(long, global = true)]
    pub wasm_module: Option<PathBuf>,

    #[arg(long, global = true, value_enum)]
    pub log_format: Option<LogFormat>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            transport: self.transport,
            endpoint: self.endpoint.clone(),
            timeout_ms: self.timeout_ms,
            wasm_module: self.wasm_module.clone(),
            log_format: self.log_format,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Check that the service answers.
    Ping,
    /// Print the service name and version.
    Metadata,
    /// Validate a JSON configuration document.
    ValidateConfig { file: PathBuf },
    /// Ask the service to load a configuration file from its own filesystem.
    LoadConfig { path: String },
    #[command(subcommand)]
    Datasource(DatasourceCommand),
    #[command(subcommand)]
    Llm(LlmCommand),
}

#[derive(Debug, Subcommand)]
pub enum DatasourceCommand {
    Create(CreateDatasource),
    /// Run a statement that returns rows.
    Query { name: String, query: String },
    /// Run a statement that returns no rows.
    Execute { name: String, query: String },
    /// Insert one row given as a JSON object.
    Insert { name: String, data: String },
    Ping { name: String },
    Close { name: String },
}

#[derive(Debug, Args)]
pub struct CreateDatasource {
    pub name: String,
    /// postgres, mysql, redis, mongodb, kafka
    #[arg(long)]
    pub driver: String,
    #[arg(long, default_value = "localhost")]
    pub host: String,
    #[arg(long)]
    pub port: u16,
    #[arg(long)]
    pub database: Option<String>,
    #[arg(long, requires = "password")]
    pub username: Option<String>,
    #[arg(long, requires = "username")]
    pub password: Option<String>,
    /// Driver-specific setting as key=value; repeatable.
    #[arg(long = "extra", value_parser = parse_key_value)]
    pub extra: Vec<(String, DomainValue)>,
}

#[derive(Debug, Subcommand)]
pub enum LlmCommand {
    Create(CreateLlm),
    Generate { name: String, prompt: String },
    /// Send a conversation; each message is role:content.
    Chat {
        name: String,
        #[arg(long = "message", value_parser = parse_chat_message, required = true)]
        messages: Vec<ChatMessage>,
    },
    Embed { name: String, text: String },
    Ping { name: String },
    Close { name: String },
}

#[derive(Debug, Args)]
pub struct CreateLlm {
    pub name: String,
    /// openai, ollama, anthropic, local
    #[arg(long)]
    pub provider: String,
    #[arg(long)]
    pub model: String,
    #[arg(long)]
    pub api_key: Option<String>,
    #[arg(long)]
    pub base_url: Option<String>,
    #[arg(long = "extra", value_parser = parse_key_value)]
    pub extra: Vec<(String, DomainValue)>,
}

/// `key=value`; the value is read as a JSON scalar when it parses as one
/// and as plain text otherwise.
fn parse_key_value(raw: &str) -> Result<(String, DomainValue), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))?;
    if key.is_empty() {
        return Err(format!("missing key in '{raw}'"));
    }
    let value = match serde_json::from_str::<serde_json::Value>(value) {
        Ok(json) if !json.is_object() && !json.is_array() => DomainValue::from(json),
        _ => DomainValue::from(value),
    };
    Ok((key.to_string(), value))
}

fn parse_chat_message(raw: &str) -> Result<ChatMessage, String> {
    let (role, content) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected role:content, got '{raw}'"))?;
    Ok(ChatMessage::new(role.trim(), content))
}
