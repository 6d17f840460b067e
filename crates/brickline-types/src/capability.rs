//! Capability traits for the external collaborators.
//!
//! The session core and the MCP tools talk to Databricks only through these
//! traits. Production adapters live in `brickline-warehouse`; tests plug in
//! in-memory fakes.

use async_trait::async_trait;
use serde_json::Value;

use crate::credentials::{ApiCredentials, Credentials};
use crate::error::{CollaboratorError, CollaboratorResult};
use crate::query::{QueryResult, TableInfo};

/// SQL connectivity to a warehouse.
#[async_trait]
pub trait SqlWarehouse: Send + Sync {
    /// Round-trip a trivial statement to prove the credentials work.
    async fn validate(&self, credentials: &Credentials) -> CollaboratorResult<()>;

    /// Execute a statement and collect its result set.
    async fn execute(&self, credentials: &Credentials, sql: &str)
    -> CollaboratorResult<QueryResult>;

    /// List the tables visible to these credentials.
    async fn list_tables(&self, credentials: &Credentials) -> CollaboratorResult<Vec<TableInfo>>;
}

/// HTTP method accepted by the workspace REST API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    /// GET request.
    Get,
    /// POST request with a JSON body.
    Post,
}

impl std::str::FromStr for HttpMethod {
    type Err = CollaboratorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            other => Err(CollaboratorError::InvalidRequest(format!(
                "unsupported HTTP method: {}",
                other
            ))),
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Get => write!(f, "GET"),
            Self::Post => write!(f, "POST"),
        }
    }
}

/// The workspace REST API (`/api/2.0/...`).
#[async_trait]
pub trait WorkspaceApi: Send + Sync {
    /// Call `endpoint` (relative to `/api/2.0/`) and return the parsed JSON body.
    async fn request(
        &self,
        credentials: &ApiCredentials,
        endpoint: &str,
        method: HttpMethod,
        payload: Option<&Value>,
    ) -> CollaboratorResult<Value>;
}
