//! Error types for the MCP server.

use thiserror::Error;

use crate::protocol::JsonRpcError;

/// Result type for MCP operations.
pub type Result<T> = std::result::Result<T, McpError>;

/// Error type for MCP operations.
#[derive(Debug, Error)]
pub enum McpError {
    /// Malformed framing or message structure.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// No tool is registered under this name.
    #[error("unknown tool: {0}")]
    ToolNotFound(String),

    /// No resource is served at this URI.
    #[error("unknown resource: {0}")]
    ResourceNotFound(String),

    /// Request parameters did not match what the method expects.
    #[error("invalid params: {0}")]
    InvalidParams(String),
}

impl McpError {
    /// Create a protocol error.
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    /// Create an invalid params error.
    pub fn invalid_params(msg: impl Into<String>) -> Self {
        Self::InvalidParams(msg.into())
    }

    /// JSON-RPC error object to answer a failed request with.
    pub fn to_rpc_error(&self) -> JsonRpcError {
        let code = match self {
            Self::Json(_) => JsonRpcError::PARSE_ERROR,
            Self::Protocol(_) => JsonRpcError::INVALID_REQUEST,
            Self::ToolNotFound(_) | Self::ResourceNotFound(_) | Self::InvalidParams(_) => {
                JsonRpcError::INVALID_PARAMS
            }
            Self::Io(_) => JsonRpcError::INTERNAL_ERROR,
        };
        JsonRpcError::new(code, self.to_string())
    }
}
