//! SQL execution tool.

use std::sync::Arc;

use async_trait::async_trait;
use brickline_session::CredentialResolver;
use brickline_types::{QueryResult, SqlWarehouse};
use serde_json::{Value, json};
use tracing::debug;

use super::session_id_property;
use crate::format::{cell_text, markdown_table};
use crate::tool::{ParamExt, Tool, ToolResult};

/// Message for statements that return no rows.
pub const NO_RESULTS: &str = "Query executed successfully. No results returned.";

/// Runs a SQL statement on the warehouse.
pub struct RunSqlQueryTool {
    resolver: CredentialResolver,
    warehouse: Arc<dyn SqlWarehouse>,
}

impl RunSqlQueryTool {
    /// Create the tool.
    pub fn new(resolver: CredentialResolver, warehouse: Arc<dyn SqlWarehouse>) -> Self {
        Self {
            resolver,
            warehouse,
        }
    }

    async fn run(&self, params: &Value) -> Result<QueryResult, String> {
        let sql = params
            .required_str("sql", "the SQL statement to run")
            .map_err(|e| e.to_string())?;
        let session_id = params
            .optional_str("session_id")
            .map_err(|e| e.to_string())?;
        let credentials = self
            .resolver
            .resolve(session_id)
            .map_err(|e| e.to_string())?;

        debug!(host = %credentials.host, "running SQL query");
        self.warehouse
            .execute(&credentials, sql)
            .await
            .map_err(|e| e.to_string())
    }
}

#[async_trait]
impl Tool for RunSqlQueryTool {
    fn name(&self) -> &str {
        "run_sql_query"
    }

    fn description(&self) -> &str {
        "Execute SQL queries on the Databricks SQL warehouse and return the rows as a markdown table"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "sql": {
                    "type": "string",
                    "description": "SQL query to execute"
                },
                "session_id": session_id_property()
            },
            "required": ["sql"]
        })
    }

    async fn execute(&self, params: Value) -> ToolResult {
        match self.run(&params).await {
            Ok(result) => ToolResult::text(render_result(&result)),
            Err(e) => ToolResult::error(format!("Error executing query: {}", e)),
        }
    }
}

fn render_result(result: &QueryResult) -> String {
    if !result.has_result_set() || result.is_empty() {
        return NO_RESULTS.to_string();
    }
    let rows: Vec<Vec<String>> = result
        .rows
        .iter()
        .map(|row| row.iter().map(cell_text).collect())
        .collect();
    markdown_table(&result.columns, &rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::tests::{FakeWarehouse, manager, manager_with_defaults};

    fn tool_with_defaults(warehouse: Arc<FakeWarehouse>) -> RunSqlQueryTool {
        let manager = manager_with_defaults(FakeWarehouse::default());
        RunSqlQueryTool::new(manager.resolver().clone(), warehouse)
    }

    #[tokio::test]
    async fn test_renders_markdown_table() {
        let tool = tool_with_defaults(Arc::new(FakeWarehouse::with_result(QueryResult::new(
            vec!["id".into(), "name".into()],
            vec![vec![json!("1"), json!("alpha")], vec![json!("2"), Value::Null]],
        ))));

        let result = tool.execute(json!({"sql": "SELECT id, name FROM t"})).await;

        assert_eq!(
            result,
            ToolResult::text("| id | name |\n| --- | --- |\n| 1 | alpha |\n| 2 | NULL |\n")
        );
    }

    #[tokio::test]
    async fn test_no_rows_and_no_result_set() {
        let manager = manager_with_defaults(FakeWarehouse::default());

        let empty = FakeWarehouse::with_result(QueryResult::new(vec!["id".into()], vec![]));
        let tool = RunSqlQueryTool::new(manager.resolver().clone(), Arc::new(empty));
        let result = tool.execute(json!({"sql": "SELECT id FROM empty"})).await;
        assert_eq!(result, ToolResult::text(NO_RESULTS));

        let tool = RunSqlQueryTool::new(
            manager.resolver().clone(),
            Arc::new(FakeWarehouse::default()),
        );
        let result = tool.execute(json!({"sql": "CREATE TABLE t (id INT)"})).await;
        assert_eq!(result, ToolResult::text(NO_RESULTS));
    }

    #[tokio::test]
    async fn test_missing_defaults_reports_env_names() {
        let manager = manager(FakeWarehouse::default());
        let tool = RunSqlQueryTool::new(
            manager.resolver().clone(),
            Arc::new(FakeWarehouse::default()),
        );

        let result = tool.execute(json!({"sql": "SELECT 1"})).await;

        assert!(result.is_error());
        assert!(result.content().starts_with("Error executing query:"));
        assert!(result.content().contains("DATABRICKS_HOST"));
        assert!(result.content().contains("DATABRICKS_HTTP_PATH"));
    }

    #[tokio::test]
    async fn test_invalid_session_never_uses_defaults() {
        let warehouse = Arc::new(FakeWarehouse::default());
        let manager = manager_with_defaults(FakeWarehouse::default());
        let tool = RunSqlQueryTool::new(manager.resolver().clone(), warehouse.clone());

        let result = tool
            .execute(json!({"sql": "SELECT 1", "session_id": "does-not-exist"}))
            .await;

        assert!(result.is_error());
        assert!(result.content().contains("Invalid or expired session ID"));
        assert_eq!(warehouse.executed(), Vec::<String>::new());
    }

    #[tokio::test]
    async fn test_non_string_session_id_is_rejected() {
        let warehouse = Arc::new(FakeWarehouse::default());
        let manager = manager_with_defaults(FakeWarehouse::default());
        let tool = RunSqlQueryTool::new(manager.resolver().clone(), warehouse.clone());

        for session_id in [json!(12345), json!(true), json!({"id": "x"})] {
            let result = tool
                .execute(json!({"sql": "SELECT 1", "session_id": session_id}))
                .await;
            assert!(result.is_error());
            assert!(result.content().contains("invalid type for 'session_id'"));
        }
        assert!(warehouse.executed().is_empty());

        let result = tool
            .execute(json!({"sql": "SELECT 1", "session_id": null}))
            .await;
        assert!(!result.is_error());
        assert_eq!(warehouse.executed(), vec!["dh: SELECT 1".to_string()]);
    }

    #[tokio::test]
    async fn test_session_credentials_are_used() {
        let warehouse = Arc::new(FakeWarehouse::default());
        let manager = manager_with_defaults(FakeWarehouse::default());
        let outcome = manager.login("session-host", "good", "p").await.unwrap();
        let tool = RunSqlQueryTool::new(manager.resolver().clone(), warehouse.clone());

        tool.execute(json!({"sql": "SELECT 1", "session_id": outcome.session_id.to_string()}))
            .await;

        assert_eq!(warehouse.executed(), vec!["session-host: SELECT 1".to_string()]);
    }

    #[tokio::test]
    async fn test_warehouse_failure_is_error() {
        let manager = manager_with_defaults(FakeWarehouse::default());
        let tool = RunSqlQueryTool::new(
            manager.resolver().clone(),
            Arc::new(FakeWarehouse::failing("TABLE_OR_VIEW_NOT_FOUND")),
        );

        let result = tool.execute(json!({"sql": "SELECT * FROM nope"})).await;

        assert!(result.is_error());
        assert_eq!(
            result.content(),
            "Error executing query: query failed: TABLE_OR_VIEW_NOT_FOUND"
        );
    }
}
