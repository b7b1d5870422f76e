//! [`WasmClient`]: module-local metadata and validation, JSON-RPC for everything else.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use contract::{
    json_object, ChatMessage, ClientConfig, ClientError, ConfigMap, DataSourceConfig,
    EmbeddingResult, LlmConfig, Metadata, OperRouterClient, OperationResult, QueryResult,
    ResourceName, Row, TextResult,
};
use jsonrpc::JsonRpcClient;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::host::ModuleHost;

/// OperRouter client backed by a locally hosted core WASM module.
///
/// `get_metadata` is always answered by the module, and `validate_config`
/// when the module exports a validator. All other operations go to the
/// endpoint over JSON-RPC exactly as [`JsonRpcClient`] sends them.
///
/// Module calls are bounded by the configured timeout just like the remote
/// ones; a call that overruns is abandoned with [`ClientError::Timeout`].
pub struct WasmClient {
    host: Mutex<ModuleHost>,
    timeout: Duration,
    inner: JsonRpcClient,
}

impl WasmClient {
    /// Loads the module named by `config.wasm_module()`.
    pub async fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let path = config
            .wasm_module()
            .ok_or_else(|| ClientError::Configuration {
                message: "the WASM transport requires a wasm_module path".to_string(),
            })?;
        let host = ModuleHost::load(path).await?;
        info!(module = %path.display(), "loaded WASM module");
        Self::with_host(config, host)
    }

    /// Wraps an already instantiated module.
    pub fn with_host(config: ClientConfig, host: ModuleHost) -> Result<Self, ClientError> {
        Ok(Self {
            host: Mutex::new(host),
            timeout: config.timeout(),
            inner: JsonRpcClient::new(config)?,
        })
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, ClientError>>,
    ) -> Result<T, ClientError> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                warn!(timeout_ms = self.timeout.as_millis() as u64, "module call timed out");
                Err(ClientError::Timeout {
                    after: self.timeout,
                })
            }
        }
    }
}

#[async_trait]
impl OperRouterClient for WasmClient {
    async fn ping(&self) -> Result<OperationResult, ClientError> {
        self.inner.ping().await
    }

    #[instrument(level = "debug", skip_all)]
    async fn validate_config(&self, config: &ConfigMap) -> Result<OperationResult, ClientError> {
        let local = self
            .bounded(async {
                let mut host = self.host.lock().await;
                if !host.validates_config() {
                    return Ok(None);
                }
                let document = json_object(config).to_string();
                host.validate_config(&document).await.map(Some)
            })
            .await?;
        if let Some(result) = local {
            return Ok(result);
        }

        debug!("module has no validator, forwarding");
        self.inner.validate_config(config).await
    }

    async fn load_config(&self, path: &str) -> Result<OperationResult, ClientError> {
        self.inner.load_config(path).await
    }

    #[instrument(level = "debug", skip_all)]
    async fn get_metadata(&self) -> Result<Metadata, ClientError> {
        self.bounded(async { self.host.lock().await.metadata().await })
            .await
    }

    async fn create_datasource(
        &self,
        name: &ResourceName,
        config: &DataSourceConfig,
    ) -> Result<OperationResult, ClientError> {
        self.inner.create_datasource(name, config).await
    }

    async fn query_datasource(
        &self,
        name: &ResourceName,
        query: &str,
    ) -> Result<QueryResult, ClientError> {
        self.inner.query_datasource(name, query).await
    }

    async fn execute_datasource(
        &self,
        name: &ResourceName,
        query: &str,
    ) -> Result<OperationResult, ClientError> {
        self.inner.execute_datasource(name, query).await
    }

    async fn insert_datasource(
        &self,
        name: &ResourceName,
        data: &Row,
    ) -> Result<OperationResult, ClientError> {
        self.inner.insert_datasource(name, data).await
    }

    async fn ping_datasource(&self, name: &ResourceName) -> Result<OperationResult, ClientError> {
        self.inner.ping_datasource(name).await
    }

    async fn close_datasource(&self, name: &ResourceName) -> Result<OperationResult, ClientError> {
        self.inner.close_datasource(name).await
    }

    async fn create_llm(
        &self,
        name: &ResourceName,
        config: &LlmConfig,
    ) -> Result<OperationResult, ClientError> {
        self.inner.create_llm(name, config).await
    }

    async fn generate_llm(
        &self,
        name: &ResourceName,
        prompt: &str,
    ) -> Result<TextResult, ClientError> {
        self.inner.generate_llm(name, prompt).await
    }

    async fn chat_llm(
        &self,
        name: &ResourceName,
        messages: &[ChatMessage],
    ) -> Result<TextResult, ClientError> {
        self.inner.chat_llm(name, messages).await
    }

    async fn embedding_llm(
        &self,
        name: &ResourceName,
        text: &str,
    ) -> Result<EmbeddingResult, ClientError> {
        self.inner.embedding_llm(name, text).await
    }

    async fn ping_llm(&self, name: &ResourceName) -> Result<OperationResult, ClientError> {
        self.inner.ping_llm(name).await
    }

    async fn close_llm(&self, name: &ResourceName) -> Result<OperationResult, ClientError> {
        self.inner.close_llm(name).await
    }
}
