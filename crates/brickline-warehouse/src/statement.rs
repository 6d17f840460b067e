//! SQL Statement Execution API adapter.

use async_trait::async_trait;
use brickline_types::{CollaboratorResult, Credentials, QueryResult, SqlWarehouse, TableInfo};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::time::Instant;
use tracing::{debug, trace, warn};

use crate::client::{DatabricksClient, api_url, base_url};
use crate::error::{Result, WarehouseError};

/// Longest server-side wait the API accepts.
const MAX_WAIT_TIMEOUT_SECS: u64 = 50;

/// Shortest non-zero server-side wait the API accepts.
const MIN_WAIT_TIMEOUT_SECS: u64 = 5;

/// Statement used to check that credentials work.
const PROBE_STATEMENT: &str = "SELECT 1";

/// Statement used to list every table the warehouse can see.
const LIST_TABLES_STATEMENT: &str =
    "SELECT table_catalog, table_schema, table_name FROM system.information_schema.tables";

/// Extract the warehouse id from an http_path.
///
/// Accepts `/sql/1.0/warehouses/<id>` and the older `/sql/1.0/endpoints/<id>`.
/// Cluster paths (`/sql/protocolv1/o/<org>/<cluster>`) are rejected with their
/// own error: the Statement Execution API only runs on warehouses.
pub fn warehouse_id_from_http_path(http_path: &str) -> Result<&str> {
    let segments: Vec<&str> = http_path
        .trim()
        .trim_matches('/')
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();

    match segments.as_slice() {
        ["sql", _, "warehouses" | "endpoints", id] => Ok(*id),
        ["sql", "protocolv1", "o", _, _] => {
            Err(WarehouseError::ClusterHttpPath(http_path.to_string()))
        }
        _ => Err(WarehouseError::InvalidHttpPath(http_path.to_string())),
    }
}

#[derive(Debug, Serialize)]
struct StatementRequest<'a> {
    statement: &'a str,
    warehouse_id: &'a str,
    wait_timeout: String,
    on_wait_timeout: &'static str,
    disposition: &'static str,
    format: &'static str,
}

#[derive(Debug, Deserialize)]
struct StatementResponse {
    statement_id: String,
    status: StatementStatus,
    #[serde(default)]
    manifest: Option<Manifest>,
    #[serde(default)]
    result: Option<ResultChunk>,
}

#[derive(Debug, Deserialize)]
struct StatementStatus {
    state: StatementState,
    #[serde(default)]
    error: Option<ServiceError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
enum StatementState {
    Pending,
    Running,
    Succeeded,
    Failed,
    Canceled,
    Closed,
    #[serde(other)]
    Unknown,
}

impl StatementState {
    fn is_in_flight(self) -> bool {
        matches!(self, Self::Pending | Self::Running)
    }
}

impl std::fmt::Display for StatementState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "PENDING",
            Self::Running => "RUNNING",
            Self::Succeeded => "SUCCEEDED",
            Self::Failed => "FAILED",
            Self::Canceled => "CANCELED",
            Self::Closed => "CLOSED",
            Self::Unknown => "UNKNOWN",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Deserialize)]
struct ServiceError {
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Manifest {
    #[serde(default)]
    schema: Option<ResultSchema>,
}

#[derive(Debug, Default, Deserialize)]
struct ResultSchema {
    #[serde(default)]
    columns: Vec<ColumnInfo>,
}

#[derive(Debug, Deserialize)]
struct ColumnInfo {
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct ResultChunk {
    #[serde(default)]
    data_array: Option<Vec<Vec<Value>>>,
    #[serde(default)]
    next_chunk_internal_link: Option<String>,
}

impl DatabricksClient {
    /// Run a statement to completion and collect every result chunk.
    async fn run_statement(&self, credentials: &Credentials, sql: &str) -> Result<QueryResult> {
        let warehouse_id = warehouse_id_from_http_path(&credentials.http_path)?;
        let deadline = Instant::now() + self.timeout();

        let request = StatementRequest {
            statement: sql,
            warehouse_id,
            wait_timeout: format!("{}s", self.wait_timeout_secs()),
            on_wait_timeout: "CONTINUE",
            disposition: "INLINE",
            format: "JSON_ARRAY",
        };

        debug!(warehouse_id, "submitting statement");
        let url = api_url(&credentials.host, "sql/statements")?;
        let body = serde_json::to_value(&request)?;
        let mut response: StatementResponse =
            serde_json::from_value(self.post_json(&credentials.token, url, &body).await?)?;

        while response.status.state.is_in_flight() {
            if Instant::now() >= deadline {
                self.cancel(credentials, &response.statement_id).await;
                return Err(WarehouseError::Timeout(response.statement_id));
            }
            tokio::time::sleep(self.poll_interval()).await;

            trace!(statement_id = %response.statement_id, "polling statement");
            let url = api_url(
                &credentials.host,
                &format!("sql/statements/{}", response.statement_id),
            )?;
            response = serde_json::from_value(self.get_json(&credentials.token, url).await?)?;
        }

        if response.status.state != StatementState::Succeeded {
            return Err(statement_error(&response.status));
        }

        let columns: Vec<String> = response
            .manifest
            .and_then(|m| m.schema)
            .map(|s| s.columns.into_iter().map(|c| c.name).collect())
            .unwrap_or_default();

        let mut rows = Vec::new();
        let mut chunk = response.result.unwrap_or_default();
        loop {
            rows.extend(chunk.data_array.take().unwrap_or_default());
            let Some(link) = chunk.next_chunk_internal_link.take() else {
                break;
            };
            trace!(statement_id = %response.statement_id, link = %link, "fetching chunk");
            let url = base_url(&credentials.host)?
                .join(&link)
                .map_err(|source| WarehouseError::InvalidUrl { url: link, source })?;
            chunk = serde_json::from_value(self.get_json(&credentials.token, url).await?)?;
        }

        debug!(
            statement_id = %response.statement_id,
            columns = columns.len(),
            rows = rows.len(),
            "statement finished"
        );
        Ok(QueryResult::new(columns, rows))
    }

    /// Best-effort cancel of an in-flight statement.
    async fn cancel(&self, credentials: &Credentials, statement_id: &str) {
        let url = match api_url(
            &credentials.host,
            &format!("sql/statements/{}/cancel", statement_id),
        ) {
            Ok(url) => url,
            Err(e) => {
                warn!(statement_id, error = %e, "cannot build cancel URL");
                return;
            }
        };
        let body = Value::Object(Default::default());
        if let Err(e) = self.post_json(&credentials.token, url, &body).await {
            warn!(statement_id, error = %e, "failed to cancel statement");
        }
    }

    fn wait_timeout_secs(&self) -> u64 {
        self.timeout()
            .as_secs()
            .clamp(MIN_WAIT_TIMEOUT_SECS, MAX_WAIT_TIMEOUT_SECS)
    }
}

fn statement_error(status: &StatementStatus) -> WarehouseError {
    let message = match &status.error {
        Some(ServiceError {
            error_code: Some(code),
            message: Some(message),
        }) => format!("[{}] {}", code, message),
        Some(ServiceError {
            message: Some(message),
            ..
        }) => message.clone(),
        _ => "no error details".to_string(),
    };
    WarehouseError::Statement {
        state: status.state.to_string(),
        message,
    }
}

fn cell_text(cell: &Value) -> String {
    match cell {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[async_trait]
impl SqlWarehouse for DatabricksClient {
    async fn validate(&self, credentials: &Credentials) -> CollaboratorResult<()> {
        self.run_statement(credentials, PROBE_STATEMENT).await?;
        Ok(())
    }

    async fn execute(&self, credentials: &Credentials, sql: &str) -> CollaboratorResult<QueryResult> {
        Ok(self.run_statement(credentials, sql).await?)
    }

    async fn list_tables(&self, credentials: &Credentials) -> CollaboratorResult<Vec<TableInfo>> {
        let result = self.run_statement(credentials, LIST_TABLES_STATEMENT).await?;
        let tables = result
            .rows
            .iter()
            .filter(|row| row.len() >= 3)
            .map(|row| TableInfo {
                catalog: cell_text(&row[0]),
                schema: cell_text(&row[1]),
                name: cell_text(&row[2]),
            })
            .collect();
        Ok(tables)
    }
}
