//! Connection credentials.

use serde::{Deserialize, Serialize};

/// Full credential triple for the SQL warehouse.
///
/// The token is never printed by the `Debug` implementation.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Workspace host, e.g. `adb-123456789.0.azuredatabricks.net`.
    pub host: String,
    /// Personal access token.
    pub token: String,
    /// HTTP path of the SQL warehouse.
    pub http_path: String,
}

impl Credentials {
    /// Create a new credential triple.
    pub fn new(
        host: impl Into<String>,
        token: impl Into<String>,
        http_path: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            token: token.into(),
            http_path: http_path.into(),
        }
    }

    /// The subset needed for REST calls.
    pub fn api(&self) -> ApiCredentials {
        ApiCredentials {
            host: self.host.clone(),
            token: self.token.clone(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("host", &self.host)
            .field("token", &"[redacted]")
            .field("http_path", &self.http_path)
            .finish()
    }
}

/// Host and token, enough for the workspace REST API.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiCredentials {
    /// Workspace host.
    pub host: String,
    /// Personal access token.
    pub token: String,
}

impl ApiCredentials {
    /// Create a new host/token pair.
    pub fn new(host: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            token: token.into(),
        }
    }
}

impl std::fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("host", &self.host)
            .field("token", &"[redacted]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_token() {
        let creds = Credentials::new("h", "dapi-secret", "/sql/1.0/warehouses/abc");
        let rendered = format!("{:?}", creds);
        assert!(rendered.contains("\"h\""));
        assert!(!rendered.contains("dapi-secret"));

        let rendered = format!("{:?}", creds.api());
        assert!(!rendered.contains("dapi-secret"));
    }

    #[test]
    fn test_api_subset() {
        let creds = Credentials::new("h", "t", "p");
        assert_eq!(creds.api(), ApiCredentials::new("h", "t"));
    }
}
