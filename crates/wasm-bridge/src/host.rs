//! Host side of the OperRouter core WASM module.
//!
//! The module is a plain core module with no imports. It exports:
//!
//! - `memory`
//! - `get_metadata() -> i64`
//! - optionally `alloc(len: i32) -> i32` together with
//!   `validate_config(ptr: i32, len: i32) -> i64`
//!
//! Every `i64` result packs the location of a UTF-8 JSON reply in linear
//! memory as `(ptr << 32) | len`.
//!
//! Module code runs on an async store metered with fuel. Every
//! [`YIELD_INTERVAL`] units the call yields back to the executor, so a slow or
//! spinning export never holds a runtime thread and the caller can bound it
//! with a timer.

use std::path::Path;

use contract::{ClientError, Metadata, OperationResult};
use serde::Deserialize;
use wasmtime::{Config, Engine, Linker, Memory, Module, Store, TypedFunc};

/// Fuel consumed between two yields of a running export.
pub const YIELD_INTERVAL: u64 = 10_000;

const MEMORY: &str = "memory";
const GET_METADATA: &str = "get_metadata";
const ALLOC: &str = "alloc";
const VALIDATE_CONFIG: &str = "validate_config";

struct Validator {
    alloc: TypedFunc<i32, i32>,
    validate: TypedFunc<(i32, i32), i64>,
}

/// Reply document of `validate_config`; modules report the diagnostic under
/// either `message` or `error`.
#[derive(Deserialize)]
struct ValidateReply {
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

fn module_error(message: impl Into<String>) -> ClientError {
    ClientError::Module {
        message: message.into(),
    }
}

/// A live instance of the module together with its store.
pub struct ModuleHost {
    store: Store<()>,
    memory: Memory,
    get_metadata: TypedFunc<(), i64>,
    validator: Option<Validator>,
}

fn engine() -> Result<Engine, ClientError> {
    let mut config = Config::new();
    config.async_support(true);
    config.consume_fuel(true);
    Engine::new(&config).map_err(|e| module_error(format!("cannot configure engine: {e}")))
}

impl ModuleHost {
    /// Compiles and instantiates the module stored at `path`.
    pub async fn load(path: &Path) -> Result<Self, ClientError> {
        let engine = engine()?;
        let module = Module::from_file(&engine, path)
            .map_err(|e| module_error(format!("cannot load '{}': {e}", path.display())))?;
        Self::instantiate(&engine, &module).await
    }

    /// Compiles and instantiates a module from binary or text bytes.
    pub async fn from_bytes(bytes: impl AsRef<[u8]>) -> Result<Self, ClientError> {
        let engine = engine()?;
        let module = Module::new(&engine, bytes)
            .map_err(|e| module_error(format!("cannot compile module: {e}")))?;
        Self::instantiate(&engine, &module).await
    }

    async fn instantiate(engine: &Engine, module: &Module) -> Result<Self, ClientError> {
        let linker = Linker::<()>::new(engine);
        let mut store = Store::new(engine, ());
        // Fuel only paces the yields; the caller's timeout bounds the call.
        store
            .set_fuel(u64::MAX)
            .and_then(|()| store.fuel_async_yield_interval(Some(YIELD_INTERVAL)))
            .map_err(|e| module_error(format!("cannot meter store: {e}")))?;
        let instance = linker
            .instantiate_async(&mut store, module)
            .await
            .map_err(|e| module_error(format!("cannot instantiate module: {e}")))?;

        let memory = instance
            .get_memory(&mut store, MEMORY)
            .ok_or_else(|| module_error(format!("module does not export `{MEMORY}`")))?;
        let get_metadata = instance
            .get_typed_func::<(), i64>(&mut store, GET_METADATA)
            .map_err(|e| module_error(format!("`{GET_METADATA}` export: {e}")))?;

        let alloc = instance.get_typed_func::<i32, i32>(&mut store, ALLOC);
        let validate = instance.get_typed_func::<(i32, i32), i64>(&mut store, VALIDATE_CONFIG);
        let validator = match (alloc, validate) {
            (Ok(alloc), Ok(validate)) => Some(Validator { alloc, validate }),
            _ => None,
        };

        Ok(Self {
            store,
            memory,
            get_metadata,
            validator,
        })
    }

    /// Whether the module answers `validate_config` itself.
    pub fn validates_config(&self) -> bool {
        self.validator.is_some()
    }

    pub async fn metadata(&mut self) -> Result<Metadata, ClientError> {
        let packed = self
            .get_metadata
            .call_async(&mut self.store, ())
            .await
            .map_err(|e| module_error(format!("`{GET_METADATA}` failed: {e}")))?;
        let reply = self.read_reply(packed)?;
        serde_json::from_slice(&reply)
            .map_err(|e| ClientError::malformed(format!("invalid metadata document: {e}")))
    }

    /// Hands `config` (JSON text) to the module's validator.
    pub async fn validate_config(&mut self, config: &str) -> Result<OperationResult, ClientError> {
        let Some(validator) = &self.validator else {
            return Err(module_error(format!("module does not export `{VALIDATE_CONFIG}`")));
        };

        let len = i32::try_from(config.len())
            .map_err(|_| module_error("configuration document exceeds module address space"))?;
        let ptr = validator
            .alloc
            .call_async(&mut self.store, len)
            .await
            .map_err(|e| module_error(format!("`{ALLOC}` failed: {e}")))?;
        self.memory
            .write(&mut self.store, ptr as u32 as usize, config.as_bytes())
            .map_err(|e| module_error(format!("cannot write configuration at {ptr}: {e}")))?;
        let packed = validator
            .validate
            .call_async(&mut self.store, (ptr, len))
            .await
            .map_err(|e| module_error(format!("`{VALIDATE_CONFIG}` failed: {e}")))?;

        let reply = self.read_reply(packed)?;
        let reply: ValidateReply = serde_json::from_slice(&reply)
            .map_err(|e| ClientError::malformed(format!("invalid validation reply: {e}")))?;
        Ok(OperationResult::new(
            reply.success,
            reply.message.or(reply.error).unwrap_or_default(),
        ))
    }

    /// Copies the reply out of linear memory once its whole range is known to fit.
    fn read_reply(&self, packed: i64) -> Result<Vec<u8>, ClientError> {
        let packed = packed as u64;
        let ptr = (packed >> 32) as usize;
        let len = (packed & 0xFFFF_FFFF) as usize;

        let data = self.memory.data(&self.store);
        ptr.checked_add(len)
            .and_then(|end| data.get(ptr..end))
            .map(<[u8]>::to_vec)
            .ok_or_else(|| {
                module_error(format!(
                    "reply of {len} bytes at {ptr} lies outside the {} bytes of linear memory",
                    data.len()
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wat_string(text: &str) -> String {
        text.replace('"', "\\\"")
    }

    /// A module whose `get_metadata` returns `doc`, stored at offset 16.
    fn metadata_module(doc: &str) -> String {
        format!(
            r#"(module
                 (memory (export "memory") 1)
                 (data (i32.const 16) "{}")
                 (func (export "get_metadata") (result i64)
                   (i64.or (i64.shl (i64.const 16) (i64.const 32)) (i64.const {}))))"#,
            wat_string(doc),
            doc.len()
        )
    }

    #[tokio::test]
    async fn test_metadata_is_read_from_linear_memory() {
        let doc = r#"{"name":"operrouter-core","version":"0.3.0","description":"embedded"}"#;
        let mut host = ModuleHost::from_bytes(metadata_module(doc)).await.unwrap();

        let metadata = host.metadata().await.unwrap();
        assert_eq!(metadata.name, "operrouter-core");
        assert_eq!(metadata.version, "0.3.0");
        assert_eq!(metadata.description.as_deref(), Some("embedded"));
        assert!(!host.validates_config());
    }

    #[tokio::test]
    async fn test_invalid_metadata_document_is_malformed() {
        let mut host = ModuleHost::from_bytes(metadata_module("not json")).await.unwrap();
        assert!(matches!(
            host.metadata().await,
            Err(ClientError::MalformedResponse { .. })
        ));
    }

    #[tokio::test]
    async fn test_reply_outside_memory_is_module_error() {
        let wat = r#"(module
            (memory (export "memory") 1)
            (func (export "get_metadata") (result i64)
              (i64.or (i64.shl (i64.const 70000) (i64.const 32)) (i64.const 8))))"#;
        let mut host = ModuleHost::from_bytes(wat).await.unwrap();
        assert!(matches!(host.metadata().await, Err(ClientError::Module { .. })));
    }

    #[tokio::test]
    async fn test_reply_length_beyond_memory_is_module_error() {
        let wat = r#"(module
            (memory (export "memory") 1)
            (func (export "get_metadata") (result i64) (i64.const 0xFFFFFFFF)))"#;
        let mut host = ModuleHost::from_bytes(wat).await.unwrap();
        let Err(ClientError::Module { message }) = host.metadata().await else {
            panic!("expected a module error");
        };
        assert!(message.contains("4294967295 bytes"), "{message}");
    }

    #[tokio::test]
    async fn test_missing_exports_are_module_errors() {
        let no_memory = r#"(module (func (export "get_metadata") (result i64) (i64.const 0)))"#;
        assert!(matches!(
            ModuleHost::from_bytes(no_memory).await,
            Err(ClientError::Module { .. })
        ));

        let no_metadata = r#"(module (memory (export "memory") 1))"#;
        assert!(matches!(
            ModuleHost::from_bytes(no_metadata).await,
            Err(ClientError::Module { .. })
        ));
    }

    #[tokio::test]
    async fn test_unparseable_bytes_are_module_error() {
        assert!(matches!(
            ModuleHost::from_bytes(b"\0asm garbage").await,
            Err(ClientError::Module { .. })
        ));
    }

    #[tokio::test]
    async fn test_validate_without_export_is_module_error() {
        let mut host = ModuleHost::from_bytes(metadata_module("{}")).await.unwrap();
        assert!(matches!(
            host.validate_config("{}").await,
            Err(ClientError::Module { .. })
        ));
    }
}
