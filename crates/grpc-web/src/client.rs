//! [`GrpcWebClient`]: unary gRPC-Web calls against the `operrouter.v1.OperRouter` service.

use std::time::Duration;

use async_trait::async_trait;
use contract::{
    json_object, map_driver, map_provider, map_role, ChatMessage, ClientConfig, ClientError,
    ConfigMap, DataSourceConfig, EmbeddingResult, LlmConfig, Metadata, OperRouterClient,
    OperationResult, QueryResult, ResourceName, Row, TextResult,
};
use prost::Message;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use tracing::{debug, instrument, warn};

use crate::codec;
use crate::framing::{decode_frames, encode_message};
use crate::proto::{self, rpc, SERVICE};

const GRPC_WEB_PROTO: &str = "application/grpc-web+proto";
const GRPC_STATUS: &str = "grpc-status";
const GRPC_MESSAGE: &str = "grpc-message";

/// Largest value the `grpc-timeout` header accepts per unit.
const MAX_TIMEOUT_DIGITS: u128 = 99_999_999;

fn default_headers(config: &ClientConfig) -> Result<HeaderMap, ClientError> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(GRPC_WEB_PROTO));
    headers.insert(ACCEPT, HeaderValue::from_static(GRPC_WEB_PROTO));
    headers.insert("x-grpc-web", HeaderValue::from_static("1"));
    for (name, value) in config.header_pairs()? {
        headers.insert(name, value);
    }
    Ok(headers)
}

/// Renders a deadline as a `grpc-timeout` header value.
fn grpc_timeout(timeout: Duration) -> String {
    let millis = timeout.as_millis();
    if millis <= MAX_TIMEOUT_DIGITS {
        format!("{millis}m")
    } else {
        format!("{}S", (timeout.as_secs() as u128).min(MAX_TIMEOUT_DIGITS))
    }
}

/// OperRouter client speaking gRPC-Web (binary protobuf framing) over HTTP.
///
/// Symbolic configuration values are translated to their numeric wire codes
/// before sending; a name outside the known set travels as `0`.
#[derive(Debug)]
pub struct GrpcWebClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl GrpcWebClient {
    /// Builds a client. Fails only on unusable header settings.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .default_headers(default_headers(&config)?)
            .build()
            .map_err(|e| ClientError::Configuration {
                message: format!("cannot build HTTP client: {e}"),
            })?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Performs one unary call and decodes its reply message.
    #[instrument(level = "debug", skip(self, request), fields(endpoint = %self.config.endpoint()))]
    pub async fn unary<Req, Resp>(&self, method: &str, request: &Req) -> Result<Resp, ClientError>
    where
        Req: Message,
        Resp: Message + Default,
    {
        let timeout = self.config.timeout();
        debug!("sending gRPC-Web request");
        let result = match tokio::time::timeout(timeout, self.exchange(method, request)).await {
            Ok(result) => result,
            Err(_) => Err(ClientError::Timeout { after: timeout }),
        };
        result.inspect_err(|e| warn!(error = %e, "gRPC-Web call failed"))
    }

    async fn exchange<Req, Resp>(&self, method: &str, request: &Req) -> Result<Resp, ClientError>
    where
        Req: Message,
        Resp: Message + Default,
    {
        let url = format!("{}/{SERVICE}/{method}", self.config.endpoint());
        let response = self
            .http
            .post(url)
            .header("grpc-timeout", grpc_timeout(self.config.timeout()))
            .body(encode_message(request))
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

        // Trailers-only responses carry the status in the headers.
        let header_status = header_text(response.headers(), GRPC_STATUS);
        let header_message = header_text(response.headers(), GRPC_MESSAGE);

        let body = response.bytes().await.map_err(transport_error)?;
        let frames = decode_frames(&body)
            .map_err(|e| ClientError::malformed(format!("invalid gRPC-Web body: {e}")))?;

        let code = frames
            .trailer(GRPC_STATUS)
            .map(str::to_string)
            .or(header_status)
            .ok_or_else(|| ClientError::malformed("response carries no grpc-status"))?;
        let code: u32 = code
            .parse()
            .map_err(|_| ClientError::malformed(format!("invalid grpc-status '{code}'")))?;
        if code != 0 {
            let message = frames
                .trailer(GRPC_MESSAGE)
                .map(str::to_string)
                .or(header_message)
                .unwrap_or_default();
            return Err(ClientError::GrpcStatus { code, message });
        }

        let payload = frames
            .message
            .ok_or_else(|| ClientError::malformed(format!("{method} reply carries no message")))?;
        Resp::decode(payload.as_slice())
            .map_err(|e| ClientError::malformed(format!("cannot decode {method} reply: {e}")))
    }

    async fn status(&self, method: &str, request: &impl Message) -> Result<OperationResult, ClientError> {
        let reply: proto::StatusResponse = self.unary(method, request).await?;
        Ok(OperationResult::new(reply.success, reply.error))
    }

    async fn health(&self, method: &str, name: &ResourceName) -> Result<OperationResult, ClientError> {
        let reply: proto::HealthResponse = self.unary(method, &name_request(name)).await?;
        Ok(OperationResult::new(reply.healthy, reply.error))
    }

    async fn text(&self, method: &str, request: &impl Message) -> Result<TextResult, ClientError> {
        let reply: proto::TextResponse = self.unary(method, request).await?;
        Ok(TextResult::new(reply.success, reply.text, reply.error))
    }
}

fn header_text(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn transport_error(error: reqwest::Error) -> ClientError {
    ClientError::Transport {
        message: error.to_string(),
    }
}

fn name_request(name: &ResourceName) -> proto::NameRequest {
    proto::NameRequest {
        name: name.as_str().to_string(),
    }
}

fn datasource_config(config: &DataSourceConfig) -> proto::DataSourceConfig {
    proto::DataSourceConfig {
        r#type: map_driver(&config.driver),
        url: config.connection_locator(),
        extra: codec::stringify(&config.extra),
    }
}

fn llm_config(config: &LlmConfig) -> proto::LlmConfig {
    proto::LlmConfig {
        provider: map_provider(&config.provider),
        model: config.model.clone(),
        api_key: config.api_key.clone(),
        base_url: config.base_url.clone(),
        extra: codec::stringify(&config.extra),
    }
}

fn chat_message(message: &ChatMessage) -> proto::ChatMessage {
    proto::ChatMessage {
        role: map_role(&message.role),
        content: message.content.clone(),
    }
}

/// The configuration document travels as JSON text.
fn validate_config_request(config: &ConfigMap) -> proto::ValidateConfigRequest {
    proto::ValidateConfigRequest {
        config: json_object(config).to_string(),
    }
}

#[async_trait]
impl OperRouterClient for GrpcWebClient {
    async fn ping(&self) -> Result<OperationResult, ClientError> {
        self.status(rpc::PING, &proto::PingRequest {}).await
    }

    async fn validate_config(&self, config: &ConfigMap) -> Result<OperationResult, ClientError> {
        self.status(rpc::VALIDATE_CONFIG, &validate_config_request(config))
            .await
    }

    async fn load_config(&self, path: &str) -> Result<OperationResult, ClientError> {
        let request = proto::LoadConfigRequest {
            path: path.to_string(),
        };
        self.status(rpc::LOAD_CONFIG, &request).await
    }

    async fn get_metadata(&self) -> Result<Metadata, ClientError> {
        let reply: proto::GetMetadataResponse =
            self.unary(rpc::GET_METADATA, &proto::GetMetadataRequest {}).await?;
        let metadata = reply.metadata.ok_or_else(|| {
            if reply.error.is_empty() {
                ClientError::malformed("GetMetadata reply carries no metadata")
            } else {
                ClientError::malformed(format!("GetMetadata reply carries no metadata: {}", reply.error))
            }
        })?;
        Ok(Metadata {
            name: metadata.name,
            version: metadata.version,
            description: metadata.description,
        })
    }

    async fn create_datasource(
        &self,
        name: &ResourceName,
        config: &DataSourceConfig,
    ) -> Result<OperationResult, ClientError> {
        let request = proto::CreateDataSourceRequest {
            name: name.as_str().to_string(),
            config: Some(datasource_config(config)),
        };
        self.status(rpc::CREATE_DATASOURCE, &request).await
    }

    async fn query_datasource(
        &self,
        name: &ResourceName,
        query: &str,
    ) -> Result<QueryResult, ClientError> {
        let request = proto::StatementRequest {
            name: name.as_str().to_string(),
            query: query.to_string(),
        };
        let reply: proto::QueryDataSourceResponse =
            self.unary(rpc::QUERY_DATASOURCE, &request).await?;
        let rows = reply.rows.into_iter().map(codec::decode_row).collect();
        Ok(QueryResult::new(reply.success, rows, reply.error))
    }

    async fn execute_datasource(
        &self,
        name: &ResourceName,
        query: &str,
    ) -> Result<OperationResult, ClientError> {
        let request = proto::StatementRequest {
            name: name.as_str().to_string(),
            query: query.to_string(),
        };
        self.status(rpc::EXECUTE_DATASOURCE, &request).await
    }

    async fn insert_datasource(
        &self,
        name: &ResourceName,
        data: &Row,
    ) -> Result<OperationResult, ClientError> {
        let request = proto::InsertDataSourceRequest {
            name: name.as_str().to_string(),
            data: Some(codec::encode_row(data)),
        };
        self.status(rpc::INSERT_DATASOURCE, &request).await
    }

    async fn ping_datasource(&self, name: &ResourceName) -> Result<OperationResult, ClientError> {
        self.health(rpc::PING_DATASOURCE, name).await
    }

    async fn close_datasource(&self, name: &ResourceName) -> Result<OperationResult, ClientError> {
        self.status(rpc::CLOSE_DATASOURCE, &name_request(name)).await
    }

    async fn create_llm(
        &self,
        name: &ResourceName,
        config: &LlmConfig,
    ) -> Result<OperationResult, ClientError> {
        let request = proto::CreateLlmRequest {
            name: name.as_str().to_string(),
            config: Some(llm_config(config)),
        };
        self.status(rpc::CREATE_LLM, &request).await
    }

    async fn generate_llm(
        &self,
        name: &ResourceName,
        prompt: &str,
    ) -> Result<TextResult, ClientError> {
        let request = proto::GenerateLlmRequest {
            name: name.as_str().to_string(),
            prompt: prompt.to_string(),
        };
        self.text(rpc::GENERATE_LLM, &request).await
    }

    async fn chat_llm(
        &self,
        name: &ResourceName,
        messages: &[ChatMessage],
    ) -> Result<TextResult, ClientError> {
        let request = proto::ChatLlmRequest {
            name: name.as_str().to_string(),
            messages: messages.iter().map(chat_message).collect(),
        };
        self.text(rpc::CHAT_LLM, &request).await
    }

    async fn embedding_llm(
        &self,
        name: &ResourceName,
        text: &str,
    ) -> Result<EmbeddingResult, ClientError> {
        let request = proto::EmbeddingLlmRequest {
            name: name.as_str().to_string(),
            text: text.to_string(),
        };
        let reply: proto::EmbeddingResponse = self.unary(rpc::EMBEDDING_LLM, &request).await?;
        Ok(EmbeddingResult::new(reply.success, reply.embedding, reply.error))
    }

    async fn ping_llm(&self, name: &ResourceName) -> Result<OperationResult, ClientError> {
        self.health(rpc::PING_LLM, name).await
    }

    async fn close_llm(&self, name: &ResourceName) -> Result<OperationResult, ClientError> {
        self.status(rpc::CLOSE_LLM, &name_request(name)).await
    }
}
