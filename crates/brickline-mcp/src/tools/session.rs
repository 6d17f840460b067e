//! Session lifecycle tools: login, logout, session_status.

use async_trait::async_trait;
use brickline_session::{LoginOutcome, SessionInfo, SessionManager};
use serde_json::{Value, json};

use crate::format::{duration_text, timestamp};
use crate::tool::{ParamExt, ParamResult, Tool, ToolResult};

/// Validates credentials and opens a session.
#[derive(Debug, Clone)]
pub struct LoginTool {
    manager: SessionManager,
}

impl LoginTool {
    /// Create a login tool over `manager`.
    pub fn new(manager: SessionManager) -> Self {
        Self { manager }
    }
}

#[async_trait]
impl Tool for LoginTool {
    fn name(&self) -> &str {
        "login"
    }

    fn description(&self) -> &str {
        "Login to Databricks and create a new session. Returns a session_id to pass to other tools."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "host": {
                    "type": "string",
                    "description": "Databricks host, e.g. 'adb-123456789.0.azuredatabricks.net'"
                },
                "token": {
                    "type": "string",
                    "description": "Databricks personal access token"
                },
                "http_path": {
                    "type": "string",
                    "description": "HTTP path of the SQL warehouse, e.g. '/sql/1.0/warehouses/abc123'"
                }
            },
            "required": ["host", "token", "http_path"]
        })
    }

    async fn execute(&self, params: Value) -> ToolResult {
        let (host, token, http_path) = match login_args(&params) {
            Ok(args) => args,
            Err(e) => return ToolResult::error(format!("Authentication failed: {}", e)),
        };

        match self.manager.login(host, token, http_path).await {
            Ok(outcome) => ToolResult::text(login_text(&outcome)),
            Err(e) => ToolResult::error(e.to_string()),
        }
    }
}

fn login_args(params: &Value) -> ParamResult<(&str, &str, &str)> {
    Ok((
        params.required_str("host", "the workspace host name")?,
        params.required_str("token", "a Databricks access token")?,
        params.required_str("http_path", "the SQL warehouse HTTP path")?,
    ))
}

fn login_text(outcome: &LoginOutcome) -> String {
    format!(
        "## Successfully authenticated with Databricks\n\n\
         **Host**: {}\n\
         **Session ID**: {}\n\n\
         Your session will expire after {} of inactivity.\n\
         Please use this session_id in subsequent requests.\n",
        outcome.host,
        outcome.session_id,
        duration_text(outcome.expiry)
    )
}

/// Destroys a session.
#[derive(Debug, Clone)]
pub struct LogoutTool {
    manager: SessionManager,
}

impl LogoutTool {
    /// Create a logout tool over `manager`.
    pub fn new(manager: SessionManager) -> Self {
        Self { manager }
    }
}

#[async_trait]
impl Tool for LogoutTool {
    fn name(&self) -> &str {
        "logout"
    }

    fn description(&self) -> &str {
        "Logout and destroy a Databricks session"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "session_id": {
                    "type": "string",
                    "description": "Session ID from a previous login"
                }
            },
            "required": ["session_id"]
        })
    }

    async fn execute(&self, params: Value) -> ToolResult {
        let session_id = match params.required_str("session_id", "the id returned by login") {
            Ok(id) => id,
            Err(e) => return ToolResult::error(e.to_string()),
        };

        if self.manager.logout(session_id) {
            ToolResult::text("Successfully logged out. Your session has been destroyed.")
        } else {
            ToolResult::text("Session not found. It may have expired or been invalid.")
        }
    }
}

/// Reports on a live session.
#[derive(Debug, Clone)]
pub struct SessionStatusTool {
    manager: SessionManager,
}

impl SessionStatusTool {
    /// Create a status tool over `manager`.
    pub fn new(manager: SessionManager) -> Self {
        Self { manager }
    }
}

#[async_trait]
impl Tool for SessionStatusTool {
    fn name(&self) -> &str {
        "session_status"
    }

    fn description(&self) -> &str {
        "Check the status of a Databricks session"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "session_id": {
                    "type": "string",
                    "description": "Session ID from a previous login"
                }
            },
            "required": ["session_id"]
        })
    }

    async fn execute(&self, params: Value) -> ToolResult {
        let session_id = match params.required_str("session_id", "the id returned by login") {
            Ok(id) => id,
            Err(e) => return ToolResult::error(e.to_string()),
        };

        match self.manager.session_status(session_id) {
            Ok(info) => ToolResult::text(status_text(&info)),
            Err(_) => ToolResult::error("Session not found or expired. Please login again."),
        }
    }
}

fn status_text(info: &SessionInfo) -> String {
    format!(
        "## Session Status\n\n\
         **Session ID**: {}\n\
         **Host**: {}\n\
         **Created**: {}\n\
         **Expires in**: {} minutes\n\n\
         Your session is active.\n",
        info.id,
        info.host,
        timestamp(&info.created_at),
        info.remaining_minutes()
    )
}
