//! Error types for session operations.

use brickline_config::CredentialField;
use brickline_types::CollaboratorError;

/// Error type for session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// A session id was given but is unknown or has expired.
    #[error("Invalid or expired session ID: {0}")]
    InvalidSession(String),

    /// No session was given and the default configuration is incomplete.
    #[error("Missing required Databricks connection details: {}", join_fields(.missing))]
    MissingCredentials {
        /// Fields without a default value.
        missing: Vec<CredentialField>,
    },

    /// The login connectivity probe failed.
    #[error("Authentication failed: {0}")]
    Auth(#[from] CollaboratorError),

    /// Status was requested for a session that does not exist.
    #[error("Session not found: {0}")]
    NotFound(String),
}

fn join_fields(fields: &[CredentialField]) -> String {
    fields
        .iter()
        .map(|f| f.env_var())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;
