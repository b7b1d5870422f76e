//! Protobuf messages of the `operrouter.v1.OperRouter` service.
//!
//! Declared by hand with `prost` derives so the crate builds without `protoc`.
//! Field tags are the wire contract; never renumber them.
//!
//! Enumerated fields (`DataSourceConfig.type`, `LlmConfig.provider`,
//! `ChatMessage.role`) are carried as plain `int32` codes produced by
//! [`contract::symbols`], which owns the one canonical table per enumeration.

use std::collections::BTreeMap;

use prost::Message;

/// Fully-qualified service name used in request paths.
pub const SERVICE: &str = "operrouter.v1.OperRouter";

/// RPC method names as they appear in request paths.
pub mod rpc {
    pub const PING: &str = "Ping";
    pub const VALIDATE_CONFIG: &str = "ValidateConfig";
    pub const LOAD_CONFIG: &str = "LoadConfig";
    pub const GET_METADATA: &str = "GetMetadata";
    pub const CREATE_DATASOURCE: &str = "CreateDataSource";
    pub const QUERY_DATASOURCE: &str = "QueryDataSource";
    pub const EXECUTE_DATASOURCE: &str = "ExecuteDataSource";
    pub const INSERT_DATASOURCE: &str = "InsertDataSource";
    pub const PING_DATASOURCE: &str = "PingDataSource";
    pub const CLOSE_DATASOURCE: &str = "CloseDataSource";
    pub const CREATE_LLM: &str = "CreateLLM";
    pub const GENERATE_LLM: &str = "GenerateLLM";
    pub const CHAT_LLM: &str = "ChatLLM";
    pub const EMBEDDING_LLM: &str = "EmbeddingLLM";
    pub const PING_LLM: &str = "PingLLM";
    pub const CLOSE_LLM: &str = "CloseLLM";
}

// ---------------------------------------------------------------------------
// Shared replies
// ---------------------------------------------------------------------------

/// Reply of every call that reports only completion.
#[derive(Clone, PartialEq, Message)]
pub struct StatusResponse {
    #[prost(bool, tag = "1")]
    pub success: bool,
    /// Empty on success.
    #[prost(string, tag = "2")]
    pub error: String,
}

/// Reply of `PingDataSource` and `PingLLM`.
#[derive(Clone, PartialEq, Message)]
pub struct HealthResponse {
    #[prost(bool, tag = "1")]
    pub healthy: bool,
    #[prost(string, tag = "2")]
    pub error: String,
}

/// Request of calls addressing one resource by name only.
#[derive(Clone, PartialEq, Message)]
pub struct NameRequest {
    #[prost(string, tag = "1")]
    pub name: String,
}

// ---------------------------------------------------------------------------
// Core
// ---------------------------------------------------------------------------

#[derive(Clone, PartialEq, Message)]
pub struct PingRequest {}

#[derive(Clone, PartialEq, Message)]
pub struct ValidateConfigRequest {
    /// The configuration document as JSON text.
    #[prost(string, tag = "1")]
    pub config: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct LoadConfigRequest {
    #[prost(string, tag = "1")]
    pub path: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct GetMetadataRequest {}

#[derive(Clone, PartialEq, Message)]
pub struct ServiceMetadata {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(string, tag = "2")]
    pub version: String,
    #[prost(string, optional, tag = "3")]
    pub description: Option<String>,
}

#[derive(Clone, PartialEq, Message)]
pub struct GetMetadataResponse {
    #[prost(message, optional, tag = "1")]
    pub metadata: Option<ServiceMetadata>,
    #[prost(string, tag = "2")]
    pub error: String,
}

// ---------------------------------------------------------------------------
// Typed values
// ---------------------------------------------------------------------------

/// A discriminated scalar: exactly one variant of `kind` is set.
#[derive(Clone, PartialEq, Message)]
pub struct TypedValue {
    #[prost(oneof = "typed_value::Kind", tags = "1, 2, 3, 4, 5, 6")]
    pub kind: Option<typed_value::Kind>,
}

pub mod typed_value {
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum Kind {
        /// Always `0`; presence alone marks the null.
        #[prost(int32, tag = "1")]
        NullValue(i32),
        #[prost(bool, tag = "2")]
        BoolValue(bool),
        #[prost(int64, tag = "3")]
        IntValue(i64),
        #[prost(double, tag = "4")]
        FloatValue(f64),
        #[prost(string, tag = "5")]
        StringValue(String),
        #[prost(bytes = "vec", tag = "6")]
        BytesValue(Vec<u8>),
    }
}

/// One result row or insert payload.
#[derive(Clone, PartialEq, Message)]
pub struct Row {
    #[prost(btree_map = "string, message", tag = "1")]
    pub columns: BTreeMap<String, TypedValue>,
}

// ---------------------------------------------------------------------------
// Datasources
// ---------------------------------------------------------------------------

#[derive(Clone, PartialEq, Message)]
pub struct DataSourceConfig {
    /// `DriverKind` code; `0` is unspecified.
    #[prost(int32, tag = "1")]
    pub r#type: i32,
    /// Connection locator, e.g. `postgresql://u:p@host:5432/db`.
    #[prost(string, tag = "2")]
    pub url: String,
    /// Driver-specific settings, stringified.
    #[prost(btree_map = "string, string", tag = "3")]
    pub extra: BTreeMap<String, String>,
}

#[derive(Clone, PartialEq, Message)]
pub struct CreateDataSourceRequest {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(message, optional, tag = "2")]
    pub config: Option<DataSourceConfig>,
}

/// Request of `QueryDataSource` and `ExecuteDataSource`.
#[derive(Clone, PartialEq, Message)]
pub struct StatementRequest {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(string, tag = "2")]
    pub query: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct QueryDataSourceResponse {
    #[prost(bool, tag = "1")]
    pub success: bool,
    #[prost(message, repeated, tag = "2")]
    pub rows: Vec<Row>,
    #[prost(string, tag = "3")]
    pub error: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct InsertDataSourceRequest {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(message, optional, tag = "2")]
    pub data: Option<Row>,
}

// ---------------------------------------------------------------------------
// LLMs
// ---------------------------------------------------------------------------

#[derive(Clone, PartialEq, Message)]
pub struct LlmConfig {
    /// `LlmProvider` code; `0` is unspecified.
    #[prost(int32, tag = "1")]
    pub provider: i32,
    #[prost(string, tag = "2")]
    pub model: String,
    #[prost(string, optional, tag = "3")]
    pub api_key: Option<String>,
    #[prost(string, optional, tag = "4")]
    pub base_url: Option<String>,
    #[prost(btree_map = "string, string", tag = "5")]
    pub extra: BTreeMap<String, String>,
}

#[derive(Clone, PartialEq, Message)]
pub struct CreateLlmRequest {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(message, optional, tag = "2")]
    pub config: Option<LlmConfig>,
}

#[derive(Clone, PartialEq, Message)]
pub struct GenerateLlmRequest {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(string, tag = "2")]
    pub prompt: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct ChatMessage {
    /// `ChatRole` code; `0` is unspecified.
    #[prost(int32, tag = "1")]
    pub role: i32,
    #[prost(string, tag = "2")]
    pub content: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct ChatLlmRequest {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(message, repeated, tag = "2")]
    pub messages: Vec<ChatMessage>,
}

/// Reply of `GenerateLLM` and `ChatLLM`.
#[derive(Clone, PartialEq, Message)]
pub struct TextResponse {
    #[prost(bool, tag = "1")]
    pub success: bool,
    #[prost(string, tag = "2")]
    pub text: String,
    #[prost(string, tag = "3")]
    pub error: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct EmbeddingLlmRequest {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(string, tag = "2")]
    pub text: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct EmbeddingResponse {
    #[prost(bool, tag = "1")]
    pub success: bool,
    #[prost(float, repeated, tag = "2")]
    pub embedding: Vec<f32>,
    #[prost(string, tag = "3")]
    pub error: String,
}
