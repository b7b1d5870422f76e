//! WASM-bridged transport for the OperRouter client contract.
//!
//! [`ModuleHost`] runs the OperRouter core module under `wasmtime`;
//! [`WasmClient`] answers metadata and configuration validation from it and
//! forwards every other operation to the JSON-RPC endpoint.

mod client;
mod host;

pub use client::WasmClient;
pub use host::ModuleHost;
