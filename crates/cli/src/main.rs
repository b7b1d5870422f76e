//! OperRouter CLI entry point.
//!
//! This binary is the composition root. Responsibilities:
//!
//! 1. **Load configuration**: `operrouter.toml` (or `--config`), then
//!    `OPERROUTER_*` environment variables, then flags. See [`config`].
//! 2. **Wire observability**: `tracing-subscriber` with a pretty or JSON
//!    layer on stderr, plus an OpenTelemetry OTLP exporter when
//!    `OTEL_EXPORTER_OTLP_ENDPOINT` is set. See [`telemetry`].
//! 3. **Select the transport**: construct a `JsonRpcClient`, `GrpcWebClient`
//!    or `WasmClient` from the configuration and hand it to the command
//!    runner as a `dyn OperRouterClient`.
//! 4. **Run one command** and print its result as JSON on stdout. A result
//!    with `success: false` exits with status 1.

use std::process::ExitCode;

use anyhow::{ensure, Context};
use clap::Parser;
use contract::OperRouterClient;
use grpc_web::GrpcWebClient;
use jsonrpc::JsonRpcClient;
use tracing::{debug, error};
use wasm_bridge::WasmClient;

mod cli;
mod commands;
mod config;
mod telemetry;

use crate::cli::Cli;
use crate::config::{CliConfig, TransportKind};

async fn connect(config: &CliConfig) -> anyhow::Result<Box<dyn OperRouterClient>> {
    let client_config = config
        .client_config()
        .context("invalid client configuration")?;
    let client: Box<dyn OperRouterClient> = match config.transport {
        TransportKind::Jsonrpc => Box::new(JsonRpcClient::new(client_config)?),
        TransportKind::GrpcWeb => Box::new(GrpcWebClient::new(client_config)?),
        TransportKind::Wasm => Box::new(WasmClient::new(client_config).await?),
    };
    Ok(client)
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    if let Some(path) = &cli.config {
        ensure!(path.exists(), "configuration file {} not found", path.display());
    }
    let config = CliConfig::load(cli.config.as_deref(), &cli.overrides())
        .context("cannot load configuration")?;

    let telemetry = telemetry::init(config.log_format)?;
    debug!(transport = ?config.transport, endpoint = %config.endpoint, "configuration loaded");

    let outcome = match connect(&config).await {
        Ok(client) => commands::run(client.as_ref(), cli.command, &mut std::io::stdout()).await,
        Err(e) => Err(e),
    };
    if let Err(e) = &outcome {
        error!(error = %e, "command failed");
    }

    telemetry.shutdown();
    Ok(if outcome? {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
