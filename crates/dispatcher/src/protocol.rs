//! Messages exchanged between the pool and its workers
//!
//! ```text
//! pool -> worker   { "id": "...", "type": "format", "code": "<div>..", "options": { .. } }
//! worker -> pool   { "id": "...", "ok": true, "result": "<div>.." }
//!                  { "id": "...", "ok": false, "error": "syntax error on line 1: .." }
//! ```

use serde::{Deserialize, Serialize};

use crate::task::{DecodeError, Operation, TaskId};

/// A task as handed to a worker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerRequest {
    /// Correlation id the worker must echo
    pub id: TaskId,

    /// Operation kind, kept as a string so unknown kinds reach the worker
    #[serde(rename = "type")]
    pub kind: String,

    /// Payload
    pub code: String,

    /// Operation options, forwarded verbatim
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<serde_json::Value>,
}

impl WorkerRequest {
    /// Build a request from a typed operation
    pub fn new(
        id: TaskId,
        operation: &Operation,
        code: impl Into<String>,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            id,
            kind: operation.kind().to_string(),
            code: code.into(),
            options: operation.options()?,
        })
    }

    /// Build a request from an untyped kind and option map
    pub fn raw(
        id: TaskId,
        kind: impl Into<String>,
        code: impl Into<String>,
        options: Option<serde_json::Value>,
    ) -> Self {
        Self {
            id,
            kind: kind.into(),
            code: code.into(),
            options,
        }
    }

    /// Decode the typed operation this request carries
    pub fn operation(&self) -> Result<Operation, DecodeError> {
        Operation::decode(&self.kind, self.options.as_ref())
    }
}

/// A worker's answer to one request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerResponse {
    /// Id of the request being answered
    pub id: TaskId,

    /// Whether the operation succeeded
    pub ok: bool,

    /// Output on success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,

    /// Message on failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WorkerResponse {
    /// Successful response
    pub fn success(id: TaskId, result: impl Into<String>) -> Self {
        Self {
            id,
            ok: true,
            result: Some(result.into()),
            error: None,
        }
    }

    /// Failed response
    pub fn failure(id: TaskId, error: impl Into<String>) -> Self {
        Self {
            id,
            ok: false,
            result: None,
            error: Some(error.into()),
        }
    }

    /// Result string on success, error message on failure
    ///
    /// A success without a result is the empty string; a failure without a
    /// message reads `"failed"`.
    pub fn into_result(self) -> Result<String, String> {
        if self.ok {
            Ok(self.result.unwrap_or_default())
        } else {
            Err(self.error.unwrap_or_else(|| "failed".to_string()))
        }
    }
}
