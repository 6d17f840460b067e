//! MCP (Model Context Protocol) server for brickline.
//!
//! Exposes Databricks SQL and Jobs operations as MCP tools, plus the
//! `schema://tables` resource, over stdio.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  McpServer                                                  │
//! │  - initialize, ping, tools/list, tools/call                 │
//! │  - resources/list, resources/read                           │
//! │  - one task per request, single writer task                 │
//! └─────────────────────────────────────────────────────────────┘
//!                           │
//!                           ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  ToolRegistry / ResourceRegistry                            │
//! │  - login, logout, session_status  → SessionManager          │
//! │  - run_sql_query, schema://tables → SqlWarehouse            │
//! │  - list_jobs, get_job_status, get_job_details → WorkspaceApi│
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Framing
//!
//! Newline-delimited JSON, or `Content-Length` framed messages; each
//! response uses the framing of its request.
//!
//! Tool failures are reported as `isError: true` content rather than
//! JSON-RPC errors, so the calling model sees the message.

pub mod error;
pub mod format;
pub mod protocol;
pub mod resources;
pub mod server;
pub mod tool;
pub mod tools;
pub mod transport;

pub use error::{McpError, Result};
pub use protocol::{
    CallToolParams, CallToolResult, InitializeResult, JsonRpcError, JsonRpcRequest,
    JsonRpcResponse, ServerInfo, ToolContent, ToolInfo,
};
pub use resources::{Resource, ResourceRegistry, TablesResource};
pub use server::McpServer;
pub use tool::{ParamExt, Tool, ToolRegistry, ToolResult};
pub use transport::{Frame, Framing, MessageReader, write_frame};
