//! Adapter error types.

use brickline_types::CollaboratorError;
use thiserror::Error;

/// Adapter error type.
#[derive(Debug, Error)]
pub enum WarehouseError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A request URL could not be built from the host and endpoint.
    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        /// The URL (or host) as given.
        url: String,
        /// Parse failure.
        source: url::ParseError,
    },

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The workspace rejected the credentials.
    #[error("Authentication failed ({status}): {message}")]
    Auth {
        /// HTTP status code (401 or 403).
        status: u16,
        /// Message from the workspace.
        message: String,
    },

    /// The workspace returned an error response.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Message from the workspace.
        message: String,
    },

    /// The http_path does not name a SQL warehouse.
    #[error(
        "http_path '{0}' does not name a SQL warehouse (expected /sql/1.0/warehouses/<id>)"
    )]
    InvalidHttpPath(String),

    /// The http_path names an all-purpose cluster, which statements cannot run on.
    #[error(
        "http_path '{0}' points at an all-purpose cluster; statements need a SQL warehouse \
         path (/sql/1.0/warehouses/<id>)"
    )]
    ClusterHttpPath(String),

    /// The statement finished in a non-success state.
    #[error("Statement {state}: {message}")]
    Statement {
        /// Terminal state reported by the warehouse.
        state: String,
        /// Error message, if any.
        message: String,
    },

    /// The statement did not finish within the request timeout.
    #[error("Statement {0} did not finish in time and was cancelled")]
    Timeout(String),
}

/// Result type for adapter operations.
pub type Result<T> = std::result::Result<T, WarehouseError>;

impl From<WarehouseError> for CollaboratorError {
    fn from(err: WarehouseError) -> Self {
        let message = err.to_string();
        match err {
            WarehouseError::Http(_) => CollaboratorError::Transport(message),
            WarehouseError::Auth { .. } => CollaboratorError::Unauthorized(message),
            WarehouseError::Api { status, message } => CollaboratorError::Api { status, message },
            WarehouseError::InvalidUrl { .. }
            | WarehouseError::InvalidHttpPath(_)
            | WarehouseError::ClusterHttpPath(_) => {
                CollaboratorError::InvalidRequest(message)
            }
            WarehouseError::Json(_) => CollaboratorError::Decode(message),
            WarehouseError::Statement { .. } | WarehouseError::Timeout(_) => {
                CollaboratorError::Query(message)
            }
        }
    }
}
