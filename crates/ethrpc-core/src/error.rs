use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Amount(#[from] AmountError),

    #[error("invalid `{field}` in {model}: {source}")]
    InvalidField {
        model: &'static str,
        field: String,
        #[source]
        source: Box<CoreError>,
    },

    #[error(transparent)]
    Rpc(#[from] RpcError),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl CoreError {
    /// The node-side error object, if this error is an RPC error envelope.
    pub fn rpc_error_object(&self) -> Option<&ErrorObject> {
        match self {
            Self::Rpc(RpcError::Node(obj)) => Some(obj),
            _ => None,
        }
    }
}

// ==============================================================================
// Codec Errors
// ==============================================================================

/// A codec rejected a wire value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {type_name} `{input}`: {reason}")]
pub struct FormatError {
    pub type_name: &'static str,
    pub input: String,
    pub reason: String,
}

impl FormatError {
    pub fn new(type_name: &'static str, input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            type_name,
            input: input.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    #[error("invalid decimal amount `{0}`")]
    InvalidDecimal(String),

    #[error("amount `{input}` is finer than one wei ({max_decimals} decimals allowed)")]
    TooPrecise { input: String, max_decimals: u32 },

    #[error("amount `{0}` does not fit in 256 bits")]
    Overflow(String),
}

// ==============================================================================
// RPC Errors
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    #[error("HTTP transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP status {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("{0}")]
    Node(ErrorObject),

    #[error("malformed JSON-RPC response: {0}")]
    MalformedResponse(String),

    #[error("JSON-RPC response id {actual} does not match request id {expected}")]
    IdMismatch {
        expected: u64,
        actual: serde_json::Value,
    },

    #[error("missing JSON-RPC batch item id={id}")]
    MissingBatchItem { id: u64 },
}

/// The `error` member of a JSON-RPC response envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorObject {
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl ErrorObject {
    pub fn kind(&self) -> RpcErrorKind {
        RpcErrorKind::from_code(self.code)
    }

    /// The node's message, or the category name when the node sent none.
    pub fn message_or_default(&self) -> &str {
        if self.message.is_empty() {
            self.kind().name()
        } else {
            &self.message
        }
    }
}

impl fmt::Display for ErrorObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}): {}",
            self.kind(),
            self.code,
            self.message_or_default()
        )
    }
}

/// Category of a JSON-RPC error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RpcErrorKind {
    ParseError,
    InvalidRequest,
    MethodNotFound,
    InvalidParams,
    InternalError,
    /// Implementation-defined band `-32099..=-32000`.
    ServerError,
    Unknown,
}

impl RpcErrorKind {
    pub fn from_code(code: i64) -> Self {
        match code {
            -32700 => Self::ParseError,
            -32600 => Self::InvalidRequest,
            -32601 => Self::MethodNotFound,
            -32602 => Self::InvalidParams,
            -32603 => Self::InternalError,
            -32099..=-32000 => Self::ServerError,
            _ => Self::Unknown,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::ParseError => "Parse error",
            Self::InvalidRequest => "Invalid Request",
            Self::MethodNotFound => "Method not found",
            Self::InvalidParams => "Invalid params",
            Self::InternalError => "Internal error",
            Self::ServerError => "Server error",
            Self::Unknown => "Unknown",
        }
    }

    pub fn meaning(self) -> &'static str {
        match self {
            Self::ParseError => {
                "Invalid JSON was received by the server. An error occurred on the server while parsing the JSON text."
            }
            Self::InvalidRequest => "The JSON sent is not a valid Request object.",
            Self::MethodNotFound => "The method does not exist / is not available.",
            Self::InvalidParams => "Invalid method parameter(s).",
            Self::InternalError => "Internal JSON-RPC error.",
            Self::ServerError => "Reserved for implementation-defined server-errors.",
            Self::Unknown => "Unknown code provided.",
        }
    }
}

impl fmt::Display for RpcErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
