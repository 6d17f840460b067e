//! End-to-end tests driving the MCP server over in-memory pipes.
//!
//! The warehouse and REST API are in-process fakes, so these exercise the
//! real framing, dispatch, session store and tool rendering together.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use brickline_config::DefaultCredentials;
use brickline_mcp::{Framing, JsonRpcResponse, McpServer, MessageReader, write_frame};
use brickline_session::{SessionConfig, SessionManager};
use brickline_types::{
    ApiCredentials, CollaboratorError, CollaboratorResult, Credentials, HttpMethod, QueryResult,
    SqlWarehouse, TableInfo, WorkspaceApi,
};
use serde_json::{Value, json};
use tokio::io::{AsyncWriteExt, BufReader, DuplexStream};
use tokio::task::JoinHandle;

struct Warehouse;

#[async_trait]
impl SqlWarehouse for Warehouse {
    async fn validate(&self, credentials: &Credentials) -> CollaboratorResult<()> {
        if credentials.token == "good" {
            Ok(())
        } else {
            Err(CollaboratorError::Unauthorized("invalid access token".into()))
        }
    }

    async fn execute(&self, _credentials: &Credentials, sql: &str) -> CollaboratorResult<QueryResult> {
        if sql.contains("boom") {
            return Err(CollaboratorError::Query("syntax error near boom".into()));
        }
        Ok(QueryResult::new(
            vec!["host".into(), "n".into()],
            vec![vec![json!("row"), json!("1")]],
        ))
    }

    async fn list_tables(&self, credentials: &Credentials) -> CollaboratorResult<Vec<TableInfo>> {
        Ok(vec![TableInfo {
            catalog: "main".into(),
            schema: credentials.host.clone(),
            name: "orders".into(),
        }])
    }
}

struct Api;

#[async_trait]
impl WorkspaceApi for Api {
    async fn request(
        &self,
        _credentials: &ApiCredentials,
        endpoint: &str,
        _method: HttpMethod,
        _payload: Option<&Value>,
    ) -> CollaboratorResult<Value> {
        match endpoint {
            "jobs/list" => Ok(json!({"jobs": [
                {"job_id": 7, "creator_user_name": "ana@example.com", "settings": {"name": "nightly"}}
            ]})),
            other => Err(CollaboratorError::Api {
                status: 404,
                message: format!("no route {}", other),
            }),
        }
    }
}

/// A running server plus the client ends of its pipes.
struct Harness {
    input: DuplexStream,
    output: MessageReader<BufReader<DuplexStream>>,
    server: JoinHandle<brickline_mcp::Result<()>>,
}

impl Harness {
    fn start(defaults: DefaultCredentials) -> Self {
        let warehouse = Arc::new(Warehouse);
        let manager = SessionManager::new(
            SessionConfig::new().with_ttl(Duration::from_secs(1800)),
            warehouse.clone(),
            defaults,
        );
        let server = Arc::new(McpServer::databricks(manager, warehouse, Arc::new(Api)));

        let (input, server_in) = tokio::io::duplex(64 * 1024);
        let (server_out, output) = tokio::io::duplex(64 * 1024);
        let server = tokio::spawn(server.serve(BufReader::new(server_in), server_out));

        Self {
            input,
            output: MessageReader::new(BufReader::new(output)),
            server,
        }
    }

    async fn send(&mut self, message: Value, framing: Framing) {
        write_frame(&mut self.input, &message.to_string(), framing)
            .await
            .unwrap();
    }

    async fn recv(&mut self) -> (JsonRpcResponse, Framing) {
        let frame = self.output.next_frame().await.unwrap().expect("response");
        (serde_json::from_str(&frame.body).unwrap(), frame.framing)
    }

    async fn request(&mut self, id: u64, method: &str, params: Value) -> Value {
        self.send(
            json!({"jsonrpc": "2.0", "id": id, "method": method, "params": params}),
            Framing::Line,
        )
        .await;
        let (response, _) = self.recv().await;
        assert_eq!(response.id, json!(id));
        response.result.expect("result")
    }

    async fn call_tool(&mut self, id: u64, name: &str, arguments: Value) -> (String, bool) {
        let result = self
            .request(id, "tools/call", json!({"name": name, "arguments": arguments}))
            .await;
        let text = result["content"][0]["text"].as_str().unwrap().to_string();
        (text, result["isError"] == json!(true))
    }

    async fn shutdown(mut self) {
        self.input.shutdown().await.unwrap();
        drop(self.input);
        self.server.await.unwrap().unwrap();
    }
}

#[tokio::test]
async fn test_initialize_and_list() {
    let mut h = Harness::start(DefaultCredentials::empty());

    let init = h
        .request(
            1,
            "initialize",
            json!({"protocolVersion": "2024-11-05", "capabilities": {}, "clientInfo": {"name": "t", "version": "0"}}),
        )
        .await;
    assert_eq!(init["serverInfo"]["name"], "Databricks API Explorer");

    h.send(
        json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
        Framing::Line,
    )
    .await;

    let tools = h.request(2, "tools/list", json!({})).await;
    let mut names: Vec<&str> = tools["tools"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    names.sort();
    assert_eq!(
        names,
        vec![
            "get_job_details",
            "get_job_status",
            "list_jobs",
            "login",
            "logout",
            "run_sql_query",
            "session_status"
        ]
    );

    let resources = h.request(3, "resources/list", json!({})).await;
    assert_eq!(resources["resources"][0]["uri"], "schema://tables");

    h.shutdown().await;
}

#[tokio::test]
async fn test_session_lifecycle() {
    let mut h = Harness::start(DefaultCredentials::empty());

    let (text, is_error) = h
        .call_tool(
            1,
            "login",
            json!({"host": "adb-1.example.net", "token": "good", "http_path": "/sql/1.0/warehouses/abc"}),
        )
        .await;
    assert!(!is_error, "{}", text);
    assert!(text.contains("Successfully authenticated"));
    let session_id = text
        .lines()
        .find_map(|l| l.strip_prefix("**Session ID**: "))
        .unwrap()
        .trim()
        .to_string();

    let (text, is_error) = h
        .call_tool(2, "session_status", json!({"session_id": session_id}))
        .await;
    assert!(!is_error);
    assert!(text.contains("adb-1.example.net"));
    assert!(text.contains("Your session is active."));

    let (text, is_error) = h
        .call_tool(3, "run_sql_query", json!({"sql": "SELECT 1", "session_id": session_id}))
        .await;
    assert!(!is_error);
    assert!(text.contains("| host | n |"));
    assert!(text.contains("| row | 1 |"));

    let uri = format!("schema://tables?session_id={}", session_id);
    let tables = h.request(4, "resources/read", json!({"uri": uri})).await;
    assert_eq!(
        tables["contents"][0]["text"],
        "Database: main, Schema: adb-1.example.net, Table: orders"
    );

    let (text, _) = h
        .call_tool(5, "logout", json!({"session_id": session_id}))
        .await;
    assert!(text.starts_with("Successfully logged out"));

    let (text, is_error) = h
        .call_tool(6, "run_sql_query", json!({"sql": "SELECT 1", "session_id": session_id}))
        .await;
    assert!(is_error);
    assert!(text.contains("Invalid or expired session ID"));

    h.shutdown().await;
}

#[tokio::test]
async fn test_failures_are_error_content() {
    let mut h = Harness::start(DefaultCredentials::from_values(
        Some("default-host"),
        Some("good"),
        Some("/sql/1.0/warehouses/abc"),
    ));

    let (text, is_error) = h
        .call_tool(1, "login", json!({"host": "h", "token": "bad", "http_path": "p"}))
        .await;
    assert!(is_error);
    assert!(text.starts_with("Authentication failed"));

    let (text, is_error) = h
        .call_tool(2, "run_sql_query", json!({"sql": "SELECT boom"}))
        .await;
    assert!(is_error);
    assert!(text.starts_with("Error executing query"));

    let (text, is_error) = h.call_tool(3, "list_jobs", json!({})).await;
    assert!(!is_error);
    assert!(text.contains("nightly"));

    let (text, is_error) = h
        .call_tool(4, "get_job_details", json!({"job_id": 7}))
        .await;
    assert!(is_error);
    assert!(text.starts_with("Error getting job details"));

    h.shutdown().await;
}

#[tokio::test]
async fn test_content_length_framing_is_answered_in_kind() {
    let mut h = Harness::start(DefaultCredentials::empty());

    h.send(
        json!({"jsonrpc": "2.0", "id": "a", "method": "ping"}),
        Framing::ContentLength,
    )
    .await;
    let (response, framing) = h.recv().await;
    assert_eq!(response.id, json!("a"));
    assert_eq!(framing, Framing::ContentLength);

    h.send(
        json!({"jsonrpc": "2.0", "id": "b", "method": "ping"}),
        Framing::Line,
    )
    .await;
    let (response, framing) = h.recv().await;
    assert_eq!(response.id, json!("b"));
    assert_eq!(framing, Framing::Line);

    h.shutdown().await;
}

#[tokio::test]
async fn test_protocol_errors() {
    let mut h = Harness::start(DefaultCredentials::empty());

    h.input.write_all(b"{oops\n").await.unwrap();
    let (response, _) = h.recv().await;
    assert_eq!(response.id, Value::Null);
    assert_eq!(response.error.unwrap().code, -32700);

    h.send(
        json!({"jsonrpc": "2.0", "id": 9, "method": "sampling/createMessage"}),
        Framing::Line,
    )
    .await;
    let (response, _) = h.recv().await;
    assert_eq!(response.error.unwrap().code, -32601);

    h.shutdown().await;
}
