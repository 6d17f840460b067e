//! Databricks tools exposed over MCP.

mod jobs;
mod session;
mod sql;

use std::sync::Arc;

use brickline_session::SessionManager;
use brickline_types::{SqlWarehouse, WorkspaceApi};
use serde_json::{Value, json};

pub use jobs::{GetJobDetailsTool, GetJobStatusTool, ListJobsTool};
pub use session::{LoginTool, LogoutTool, SessionStatusTool};
pub use sql::RunSqlQueryTool;

use crate::tool::ToolRegistry;

/// Build the registry with every Databricks tool.
pub fn databricks_tools(
    manager: SessionManager,
    warehouse: Arc<dyn SqlWarehouse>,
    api: Arc<dyn WorkspaceApi>,
) -> ToolRegistry {
    let resolver = manager.resolver().clone();

    let mut registry = ToolRegistry::new();
    registry.register(LoginTool::new(manager.clone()));
    registry.register(LogoutTool::new(manager.clone()));
    registry.register(SessionStatusTool::new(manager));
    registry.register(RunSqlQueryTool::new(resolver.clone(), warehouse));
    registry.register(ListJobsTool::new(resolver.clone(), api.clone()));
    registry.register(GetJobStatusTool::new(resolver.clone(), api.clone()));
    registry.register(GetJobDetailsTool::new(resolver, api));
    registry
}

/// JSON Schema property for the optional `session_id` argument.
fn session_id_property() -> Value {
    json!({
        "type": "string",
        "description": "(Optional) Session ID from a previous login. Defaults to the server's configured credentials."
    })
}
