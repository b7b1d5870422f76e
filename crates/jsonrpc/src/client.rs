//! [`JsonRpcClient`]: one JSON-RPC exchange per operation over a single POST endpoint.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use contract::{
    ChatMessage, ClientConfig, ClientError, ConfigMap, DataSourceConfig, EmbeddingResult,
    LlmConfig, Metadata, OperRouterClient, OperationResult, QueryResult, RequestId, ResourceName,
    Row, TextResult,
};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, instrument, warn};

use crate::envelope::{JsonRpcRequest, JsonRpcResponse};
use crate::replies::{EmbeddingReply, QueryReply, StatusReply, TextReply};

/// Method names of the JSON-RPC catalogue.
pub mod methods {
    pub const PING: &str = "ping";
    pub const VALIDATE_CONFIG: &str = "validate_config";
    pub const LOAD_CONFIG: &str = "load_config";
    pub const GET_METADATA: &str = "get_metadata";
    pub const DATASOURCE_CREATE: &str = "datasource.create";
    pub const DATASOURCE_QUERY: &str = "datasource.query";
    pub const DATASOURCE_EXECUTE: &str = "datasource.execute";
    pub const DATASOURCE_INSERT: &str = "datasource.insert";
    pub const DATASOURCE_PING: &str = "datasource.ping";
    pub const DATASOURCE_CLOSE: &str = "datasource.close";
    pub const LLM_CREATE: &str = "llm.create";
    pub const LLM_GENERATE: &str = "llm.generate";
    pub const LLM_CHAT: &str = "llm.chat";
    pub const LLM_EMBEDDING: &str = "llm.embedding";
    pub const LLM_PING: &str = "llm.ping";
    pub const LLM_CLOSE: &str = "llm.close";

    /// Every method, in catalogue order.
    pub const ALL: [&str; 16] = [
        PING,
        VALIDATE_CONFIG,
        LOAD_CONFIG,
        GET_METADATA,
        DATASOURCE_CREATE,
        DATASOURCE_QUERY,
        DATASOURCE_EXECUTE,
        DATASOURCE_INSERT,
        DATASOURCE_PING,
        DATASOURCE_CLOSE,
        LLM_CREATE,
        LLM_GENERATE,
        LLM_CHAT,
        LLM_EMBEDDING,
        LLM_PING,
        LLM_CLOSE,
    ];
}

/// Builds the `reqwest` header set: JSON content type plus the configured headers.
fn default_headers(config: &ClientConfig) -> Result<HeaderMap, ClientError> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    for (name, value) in config.header_pairs()? {
        headers.insert(name, value);
    }
    Ok(headers)
}

/// OperRouter client speaking JSON-RPC 2.0 over HTTP.
///
/// Request ids come from a per-instance counter: the first call gets id 1 and
/// every later call, concurrent or not, gets a strictly larger one. Each
/// response is checked against the id of the request that produced it.
#[derive(Debug)]
pub struct JsonRpcClient {
    http: reqwest::Client,
    config: ClientConfig,
    next_id: AtomicU64,
}

impl JsonRpcClient {
    /// Builds a client. Fails only on unusable header settings.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .default_headers(default_headers(&config)?)
            .build()
            .map_err(|e| ClientError::Configuration {
                message: format!("cannot build HTTP client: {e}"),
            })?;

        Ok(Self {
            http,
            config,
            next_id: AtomicU64::new(0),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn next_request_id(&self) -> RequestId {
        RequestId::new(self.next_id.fetch_add(1, Ordering::Relaxed) + 1)
    }

    /// Performs one call and decodes its `result` member into `T`.
    ///
    /// The configured timeout bounds the whole exchange; on expiry the
    /// in-flight request is dropped.
    #[instrument(level = "debug", skip(self, params), fields(endpoint = %self.config.endpoint()))]
    pub async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, ClientError> {
        let id = self.next_request_id();
        let request = JsonRpcRequest::new(method, params, id);
        let timeout = self.config.timeout();

        debug!(%id, "sending JSON-RPC request");
        let result = match tokio::time::timeout(timeout, self.exchange(&request)).await {
            Ok(result) => result,
            Err(_) => Err(ClientError::Timeout { after: timeout }),
        };

        let value = result.inspect_err(|e| warn!(%id, error = %e, "JSON-RPC call failed"))?;
        serde_json::from_value(value)
            .map_err(|e| ClientError::malformed(format!("unexpected result for '{method}': {e}")))
    }

    async fn exchange(&self, request: &JsonRpcRequest<'_>) -> Result<Value, ClientError> {
        let response = self
            .http
            .post(self.config.endpoint())
            .json(request)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::HttpStatus {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        let body = response.bytes().await.map_err(transport_error)?;
        let envelope: JsonRpcResponse = serde_json::from_slice(&body)
            .map_err(|e| ClientError::malformed(format!("invalid JSON-RPC envelope: {e}")))?;
        envelope.into_result(request.id)
    }
}

fn transport_error(error: reqwest::Error) -> ClientError {
    ClientError::Transport {
        message: error.to_string(),
    }
}

#[async_trait]
impl OperRouterClient for JsonRpcClient {
    async fn ping(&self) -> Result<OperationResult, ClientError> {
        self.call::<StatusReply>(methods::PING, json!({}))
            .await?
            .into_result()
    }

    async fn validate_config(&self, config: &ConfigMap) -> Result<OperationResult, ClientError> {
        self.call::<StatusReply>(methods::VALIDATE_CONFIG, json!({ "config": config }))
            .await?
            .into_result()
    }

    async fn load_config(&self, path: &str) -> Result<OperationResult, ClientError> {
        self.call::<StatusReply>(methods::LOAD_CONFIG, json!({ "path": path }))
            .await?
            .into_result()
    }

    async fn get_metadata(&self) -> Result<Metadata, ClientError> {
        self.call(methods::GET_METADATA, json!({})).await
    }

    async fn create_datasource(
        &self,
        name: &ResourceName,
        config: &DataSourceConfig,
    ) -> Result<OperationResult, ClientError> {
        self.call::<StatusReply>(
            methods::DATASOURCE_CREATE,
            json!({ "name": name, "config": config }),
        )
        .await?
        .into_result()
    }

    async fn query_datasource(
        &self,
        name: &ResourceName,
        query: &str,
    ) -> Result<QueryResult, ClientError> {
        self.call::<QueryReply>(
            methods::DATASOURCE_QUERY,
            json!({ "name": name, "query": query }),
        )
        .await?
        .into_result()
    }

    async fn execute_datasource(
        &self,
        name: &ResourceName,
        query: &str,
    ) -> Result<OperationResult, ClientError> {
        self.call::<StatusReply>(
            methods::DATASOURCE_EXECUTE,
            json!({ "name": name, "query": query }),
        )
        .await?
        .into_result()
    }

    async fn insert_datasource(
        &self,
        name: &ResourceName,
        data: &Row,
    ) -> Result<OperationResult, ClientError> {
        self.call::<StatusReply>(
            methods::DATASOURCE_INSERT,
            json!({ "name": name, "data": data }),
        )
        .await?
        .into_result()
    }

    async fn ping_datasource(&self, name: &ResourceName) -> Result<OperationResult, ClientError> {
        self.call::<StatusReply>(methods::DATASOURCE_PING, json!({ "name": name }))
            .await?
            .into_health()
    }

    async fn close_datasource(&self, name: &ResourceName) -> Result<OperationResult, ClientError> {
        self.call::<StatusReply>(methods::DATASOURCE_CLOSE, json!({ "name": name }))
            .await?
            .into_result()
    }

    async fn create_llm(
        &self,
        name: &ResourceName,
        config: &LlmConfig,
    ) -> Result<OperationResult, ClientError> {
        self.call::<StatusReply>(methods::LLM_CREATE, json!({ "name": name, "config": config }))
            .await?
            .into_result()
    }

    async fn generate_llm(
        &self,
        name: &ResourceName,
        prompt: &str,
    ) -> Result<TextResult, ClientError> {
        self.call::<TextReply>(methods::LLM_GENERATE, json!({ "name": name, "prompt": prompt }))
            .await?
            .into_result()
    }

    async fn chat_llm(
        &self,
        name: &ResourceName,
        messages: &[ChatMessage],
    ) -> Result<TextResult, ClientError> {
        self.call::<TextReply>(methods::LLM_CHAT, json!({ "name": name, "messages": messages }))
            .await?
            .into_result()
    }

    async fn embedding_llm(
        &self,
        name: &ResourceName,
        text: &str,
    ) -> Result<EmbeddingResult, ClientError> {
        self.call::<EmbeddingReply>(methods::LLM_EMBEDDING, json!({ "name": name, "text": text }))
            .await?
            .into_result()
    }

    async fn ping_llm(&self, name: &ResourceName) -> Result<OperationResult, ClientError> {
        self.call::<StatusReply>(methods::LLM_PING, json!({ "name": name }))
            .await?
            .into_health()
    }

    async fn close_llm(&self, name: &ResourceName) -> Result<OperationResult, ClientError> {
        self.call::<StatusReply>(methods::LLM_CLOSE, json!({ "name": name }))
            .await?
            .into_result()
    }
}
