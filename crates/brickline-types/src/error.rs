//! Errors surfaced by external collaborators.

/// Result type for collaborator calls.
pub type CollaboratorResult<T> = std::result::Result<T, CollaboratorError>;

/// Failure reported by the SQL warehouse or the workspace REST API.
///
/// Adapters map their transport-specific errors into this type so that the
/// session core never depends on a particular HTTP client.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CollaboratorError {
    /// Network or transport failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// Credentials were rejected.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The remote API answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the response.
        message: String,
    },

    /// The SQL statement failed or did not finish.
    #[error("query failed: {0}")]
    Query(String),

    /// The request could not be built from the given inputs.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The response body could not be decoded.
    #[error("invalid response: {0}")]
    Decode(String),
}

impl CollaboratorError {
    /// Check if this error means the credentials were not accepted.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
            || matches!(self, Self::Api { status: 401 | 403, .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_auth_error() {
        assert!(CollaboratorError::Unauthorized("bad token".into()).is_auth_error());
        assert!(
            CollaboratorError::Api {
                status: 403,
                message: "forbidden".into()
            }
            .is_auth_error()
        );
        assert!(!CollaboratorError::Transport("reset".into()).is_auth_error());
    }

    #[test]
    fn test_display() {
        let err = CollaboratorError::Api {
            status: 404,
            message: "RESOURCE_DOES_NOT_EXIST".into(),
        };
        assert_eq!(err.to_string(), "API error (404): RESOURCE_DOES_NOT_EXIST");
    }
}
