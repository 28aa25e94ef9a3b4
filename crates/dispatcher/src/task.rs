//! Task identity and the typed operations a worker can run

use neatify_formatter::{FormatOptions, MinifyOptions};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Correlation token for one submitted task
///
/// Unique per submission; workers echo it back in their response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Generate a fresh id
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// The underlying UUID
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An operation with its options
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Pretty-print the payload
    Format(FormatOptions),
    /// Minify the payload as HTML
    Minify(MinifyOptions),
    /// Health check; the payload is ignored
    Ping,
}

/// Errors decoding an operation from its wire form
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The kind is not one of `format`, `minify`, `ping`
    #[error("unknown operation")]
    UnknownOperation(String),

    /// The options do not match the shape the kind expects
    #[error("invalid options: {reason}")]
    InvalidOptions { kind: String, reason: String },
}

impl Operation {
    /// Wire name of the operation
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Format(_) => "format",
            Self::Minify(_) => "minify",
            Self::Ping => "ping",
        }
    }

    /// Options as a JSON object, `None` for `ping`
    pub fn options(&self) -> Result<Option<serde_json::Value>, serde_json::Error> {
        match self {
            Self::Format(options) => serde_json::to_value(options).map(Some),
            Self::Minify(options) => serde_json::to_value(options).map(Some),
            Self::Ping => Ok(None),
        }
    }

    /// Reject option values the formatter cannot honour
    pub fn validate(&self) -> Result<(), DecodeError> {
        match self {
            Self::Format(options) => {
                options
                    .validate()
                    .map_err(|reason| DecodeError::InvalidOptions {
                        kind: self.kind().to_string(),
                        reason,
                    })
            }
            Self::Minify(_) | Self::Ping => Ok(()),
        }
    }

    /// Decode a kind name and option map into a typed operation
    ///
    /// Missing or `null` options mean defaults. Out-of-range widths are
    /// rejected here so they never reach a worker.
    pub fn decode(kind: &str, options: Option<&serde_json::Value>) -> Result<Self, DecodeError> {
        let operation = match kind {
            "format" => Self::Format(decode_options(kind, options)?),
            "minify" => Self::Minify(decode_options(kind, options)?),
            "ping" => Self::Ping,
            other => return Err(DecodeError::UnknownOperation(other.to_string())),
        };
        operation.validate()?;
        Ok(operation)
    }
}

fn decode_options<T>(kind: &str, options: Option<&serde_json::Value>) -> Result<T, DecodeError>
where
    T: DeserializeOwned + Default,
{
    match options {
        None | Some(serde_json::Value::Null) => Ok(T::default()),
        Some(value) => T::deserialize(value).map_err(|e| DecodeError::InvalidOptions {
            kind: kind.to_string(),
            reason: e.to_string(),
        }),
    }
}
