//! Shapes of the `result` member for each family of methods.
//!
//! A reply claiming success must carry its payload field; a missing payload
//! on a successful reply is a malformed response, never an empty default.
//! Failed replies may omit the payload.

use contract::{ClientError, EmbeddingResult, OperationResult, QueryResult, Row, TextResult};
use serde::Deserialize;

fn payload<T: Default>(success: bool, field: Option<T>, name: &str) -> Result<T, ClientError> {
    match field {
        Some(value) => Ok(value),
        None if success => Err(ClientError::malformed(format!(
            "successful result is missing '{name}'"
        ))),
        None => Ok(T::default()),
    }
}

/// `{success, message?, healthy?}`
#[derive(Debug, Deserialize)]
pub(crate) struct StatusReply {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    message: String,
    #[serde(default)]
    healthy: Option<bool>,
}

impl StatusReply {
    pub(crate) fn into_result(self) -> Result<OperationResult, ClientError> {
        let success = self
            .success
            .ok_or_else(|| ClientError::malformed("result is missing 'success'"))?;
        Ok(OperationResult::new(success, self.message))
    }

    /// Liveness replies report `healthy`; it takes precedence over `success`.
    pub(crate) fn into_health(self) -> Result<OperationResult, ClientError> {
        let healthy = self
            .healthy
            .or(self.success)
            .ok_or_else(|| ClientError::malformed("result is missing 'healthy'"))?;
        Ok(OperationResult::new(healthy, self.message))
    }
}

/// `{success, rows, message?}`
#[derive(Debug, Deserialize)]
pub(crate) struct QueryReply {
    success: bool,
    #[serde(default)]
    rows: Option<Vec<Row>>,
    #[serde(default)]
    message: String,
}

impl QueryReply {
    pub(crate) fn into_result(self) -> Result<QueryResult, ClientError> {
        let rows = payload(self.success, self.rows, "rows")?;
        Ok(QueryResult::new(self.success, rows, self.message))
    }
}

/// `{success, text, message?}`
#[derive(Debug, Deserialize)]
pub(crate) struct TextReply {
    success: bool,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    message: String,
}

impl TextReply {
    pub(crate) fn into_result(self) -> Result<TextResult, ClientError> {
        let text = payload(self.success, self.text, "text")?;
        Ok(TextResult::new(self.success, text, self.message))
    }
}

/// `{success, embedding, message?}`
#[derive(Debug, Deserialize)]
pub(crate) struct EmbeddingReply {
    success: bool,
    #[serde(default)]
    embedding: Option<Vec<f32>>,
    #[serde(default)]
    message: String,
}

impl EmbeddingReply {
    pub(crate) fn into_result(self) -> Result<EmbeddingResult, ClientError> {
        let embedding = payload(self.success, self.embedding, "embedding")?;
        Ok(EmbeddingResult::new(self.success, embedding, self.message))
    }
}
