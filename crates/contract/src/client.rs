//! The operation set every transport client implements.

use async_trait::async_trait;

use crate::{
    ChatMessage, ClientError, ConfigMap, DataSourceConfig, EmbeddingResult, LlmConfig, Metadata,
    OperationResult, QueryResult, ResourceName, Row, TextResult,
};

/// Transport-agnostic OperRouter client.
///
/// Each method is one stateless request/response exchange. `Err` means the
/// exchange itself failed (see [`ClientError`]); a remote operation that ran
/// and failed comes back as `Ok` with `success == false`.
///
/// Query text, prompts, and chat content are forwarded verbatim; the server
/// owns parsing and injection defence.
///
/// The trait is object safe so applications can hold a
/// `Box<dyn OperRouterClient>` and pick the transport at runtime.
#[async_trait]
pub trait OperRouterClient: Send + Sync {
    /// Checks that the service is reachable.
    async fn ping(&self) -> Result<OperationResult, ClientError>;

    /// Asks the service to validate a configuration document without loading it.
    async fn validate_config(&self, config: &ConfigMap) -> Result<OperationResult, ClientError>;

    /// Asks the service to load configuration from a server-side path.
    async fn load_config(&self, path: &str) -> Result<OperationResult, ClientError>;

    /// Returns the service's name and version.
    async fn get_metadata(&self) -> Result<Metadata, ClientError>;

    async fn create_datasource(
        &self,
        name: &ResourceName,
        config: &DataSourceConfig,
    ) -> Result<OperationResult, ClientError>;

    /// Runs a read query and returns its rows.
    async fn query_datasource(
        &self,
        name: &ResourceName,
        query: &str,
    ) -> Result<QueryResult, ClientError>;

    /// Runs a statement that returns no rows.
    async fn execute_datasource(
        &self,
        name: &ResourceName,
        query: &str,
    ) -> Result<OperationResult, ClientError>;

    async fn insert_datasource(
        &self,
        name: &ResourceName,
        data: &Row,
    ) -> Result<OperationResult, ClientError>;

    /// Health check. `success` reflects the datasource's liveness.
    async fn ping_datasource(&self, name: &ResourceName) -> Result<OperationResult, ClientError>;

    async fn close_datasource(&self, name: &ResourceName) -> Result<OperationResult, ClientError>;

    async fn create_llm(
        &self,
        name: &ResourceName,
        config: &LlmConfig,
    ) -> Result<OperationResult, ClientError>;

    async fn generate_llm(&self, name: &ResourceName, prompt: &str)
        -> Result<TextResult, ClientError>;

    /// Sends a conversation; messages are delivered in slice order.
    async fn chat_llm(
        &self,
        name: &ResourceName,
        messages: &[ChatMessage],
    ) -> Result<TextResult, ClientError>;

    async fn embedding_llm(
        &self,
        name: &ResourceName,
        text: &str,
    ) -> Result<EmbeddingResult, ClientError>;

    /// Health check. `success` reflects the LLM instance's liveness.
    async fn ping_llm(&self, name: &ResourceName) -> Result<OperationResult, ClientError>;

    async fn close_llm(&self, name: &ResourceName) -> Result<OperationResult, ClientError>;
}
