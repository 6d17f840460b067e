//! JSON-RPC dispatch and the stdio serve loop.

use std::sync::Arc;

use brickline_session::SessionManager;
use brickline_types::{SqlWarehouse, WorkspaceApi};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tokio::io::{AsyncBufRead, AsyncWrite, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::error::{McpError, Result};
use crate::protocol::{
    CallToolParams, CallToolResult, InitializeParams, InitializeResult, JsonRpcError,
    JsonRpcRequest, JsonRpcResponse, ListChangedCapability, ListResourcesResult, ListToolsResult,
    MCP_PROTOCOL_VERSION, ReadResourceParams, ServerCapabilities, ServerInfo,
};
use crate::resources::{ResourceRegistry, databricks_resources};
use crate::tool::ToolRegistry;
use crate::tools::databricks_tools;
use crate::transport::{Framing, MessageReader, write_frame};

/// Outbound messages queued for the writer task.
const OUTBOUND_QUEUE: usize = 64;

/// MCP server over a tool and a resource registry.
///
/// Requests are read in order but handled concurrently, one task each.
/// Responses go through a single writer so frames never interleave.
#[derive(Debug)]
pub struct McpServer {
    tools: ToolRegistry,
    resources: ResourceRegistry,
    info: ServerInfo,
}

impl McpServer {
    /// Create a server over the given registries.
    pub fn new(tools: ToolRegistry, resources: ResourceRegistry) -> Self {
        Self {
            tools,
            resources,
            info: ServerInfo::default(),
        }
    }

    /// Server exposing every Databricks tool and resource.
    pub fn databricks(
        manager: SessionManager,
        warehouse: Arc<dyn SqlWarehouse>,
        api: Arc<dyn WorkspaceApi>,
    ) -> Self {
        let resources = databricks_resources(manager.resolver().clone(), warehouse.clone());
        let tools = databricks_tools(manager, warehouse, api);
        Self::new(tools, resources)
    }

    /// Override the name and version reported by `initialize`.
    pub fn with_info(mut self, info: ServerInfo) -> Self {
        self.info = info;
        self
    }

    /// The registered tools.
    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// The registered resources.
    pub fn resources(&self) -> &ResourceRegistry {
        &self.resources
    }

    /// Serve on the process's stdin and stdout until stdin closes.
    pub async fn serve_stdio(self) -> Result<()> {
        Arc::new(self)
            .serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
            .await
    }

    /// Serve until `reader` reaches end of stream.
    ///
    /// Every in-flight request is answered before this returns.
    pub async fn serve<R, W>(self: Arc<Self>, reader: R, writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<(String, Framing)>(OUTBOUND_QUEUE);
        let writer_task = tokio::spawn(write_loop(rx, writer));

        let mut reader = MessageReader::new(reader);
        let mut in_flight = JoinSet::new();
        let mut outcome = Ok(());

        info!(tools = self.tools.len(), "MCP server ready");
        loop {
            let frame = match reader.next_frame().await {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    debug!("input closed");
                    break;
                }
                Err(McpError::Protocol(msg)) => {
                    warn!(error = %msg, "unreadable frame");
                    let response = JsonRpcResponse::failure(
                        Value::Null,
                        JsonRpcError::new(
                            JsonRpcError::PARSE_ERROR,
                            format!("Parse error: {}", msg),
                        ),
                    );
                    send(&tx, &response, reader.framing()).await;
                    continue;
                }
                Err(e) => {
                    error!(error = %e, "failed to read input");
                    outcome = Err(e);
                    break;
                }
            };

            let server = Arc::clone(&self);
            let tx = tx.clone();
            in_flight.spawn(async move {
                if let Some(response) = server.handle_message(&frame.body).await {
                    send(&tx, &response, frame.framing).await;
                }
            });

            while let Some(joined) = in_flight.try_join_next() {
                if let Err(e) = joined {
                    error!(error = %e, "request task failed");
                }
            }
        }

        while let Some(joined) = in_flight.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "request task failed");
            }
        }
        drop(tx);

        match writer_task.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(e) => return Err(McpError::protocol(format!("writer task failed: {}", e))),
        }
        outcome
    }

    /// Handle one raw message. Returns `None` for notifications.
    pub async fn handle_message(&self, raw: &str) -> Option<JsonRpcResponse> {
        let value: Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(e) => {
                return Some(JsonRpcResponse::failure(
                    Value::Null,
                    JsonRpcError::new(JsonRpcError::PARSE_ERROR, format!("Parse error: {}", e)),
                ));
            }
        };

        let raw_id = value.get("id").cloned().unwrap_or(Value::Null);
        let request: JsonRpcRequest = match serde_json::from_value(value) {
            Ok(request) => request,
            Err(e) => {
                return Some(JsonRpcResponse::failure(
                    raw_id,
                    JsonRpcError::new(
                        JsonRpcError::INVALID_REQUEST,
                        format!("Invalid request: {}", e),
                    ),
                ));
            }
        };

        if request.is_notification() {
            debug!(method = %request.method, "notification");
            return None;
        }

        let id = request.id.clone().unwrap_or(Value::Null);
        debug!(method = %request.method, id = %id, "request");
        Some(match self.dispatch(request).await {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(error) => JsonRpcResponse::failure(id, error),
        })
    }

    async fn dispatch(&self, request: JsonRpcRequest) -> std::result::Result<Value, JsonRpcError> {
        match request.method.as_str() {
            "initialize" => {
                let params: InitializeParams = request
                    .params
                    .map(serde_json::from_value::<InitializeParams>)
                    .transpose()
                    .map_err(|e| McpError::invalid_params(e.to_string()).to_rpc_error())?
                    .unwrap_or_default();
                if let Some(client) = &params.client_info {
                    info!(client = %client.name, version = %client.version, "client connected");
                }
                to_result(&InitializeResult {
                    protocol_version: params
                        .protocol_version
                        .unwrap_or_else(|| MCP_PROTOCOL_VERSION.to_string()),
                    capabilities: ServerCapabilities {
                        tools: Some(ListChangedCapability::default()),
                        resources: Some(ListChangedCapability::default()),
                    },
                    server_info: self.info.clone(),
                })
            }
            "ping" => Ok(json!({})),
            "tools/list" => to_result(&ListToolsResult {
                tools: self.tools.definitions(),
            }),
            "tools/call" => {
                let params: CallToolParams = parse_params(request.params)?;
                info!(tool = %params.name, "tool call");
                let result = self
                    .tools
                    .execute(&params.name, params.arguments)
                    .await
                    .map_err(|e| e.to_rpc_error())?;
                to_result(&CallToolResult::from(result))
            }
            "resources/list" => to_result(&ListResourcesResult {
                resources: self.resources.definitions(),
            }),
            "resources/read" => {
                let params: ReadResourceParams = parse_params(request.params)?;
                info!(uri = %params.uri, "resource read");
                let result = self
                    .resources
                    .read(&params.uri)
                    .await
                    .map_err(|e| e.to_rpc_error())?;
                to_result(&result)
            }
            other => Err(JsonRpcError::method_not_found(other)),
        }
    }
}

fn parse_params<T: DeserializeOwned>(
    params: Option<Value>,
) -> std::result::Result<T, JsonRpcError> {
    let params = params.ok_or_else(|| McpError::invalid_params("missing params").to_rpc_error())?;
    serde_json::from_value(params).map_err(|e| McpError::invalid_params(e.to_string()).to_rpc_error())
}

fn to_result<T: Serialize>(value: &T) -> std::result::Result<Value, JsonRpcError> {
    serde_json::to_value(value)
        .map_err(|e| JsonRpcError::new(JsonRpcError::INTERNAL_ERROR, e.to_string()))
}

async fn send(tx: &mpsc::Sender<(String, Framing)>, response: &JsonRpcResponse, framing: Framing) {
    match serde_json::to_string(response) {
        Ok(body) => {
            if tx.send((body, framing)).await.is_err() {
                warn!("output closed, dropping response");
            }
        }
        Err(e) => error!(error = %e, "failed to serialize response"),
    }
}

async fn write_loop<W>(mut rx: mpsc::Receiver<(String, Framing)>, mut writer: W) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some((body, framing)) = rx.recv().await {
        write_frame(&mut writer, &body, framing).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::tests::{FakeApi, FakeWarehouse, manager_with_defaults};

    fn server() -> McpServer {
        let manager = manager_with_defaults(FakeWarehouse::default());
        McpServer::databricks(
            manager,
            Arc::new(FakeWarehouse::default()),
            Arc::new(FakeApi::responding(json!({"jobs": []}))),
        )
    }

    async fn call(server: &McpServer, message: Value) -> JsonRpcResponse {
        server
            .handle_message(&message.to_string())
            .await
            .expect("request should get a response")
    }

    #[tokio::test]
    async fn test_initialize() {
        let server = server();
        let resp = call(
            &server,
            json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {
                "protocolVersion": "2024-11-05",
                "capabilities": {},
                "clientInfo": {"name": "test", "version": "1"}
            }}),
        )
        .await;

        let result = resp.result.unwrap();
        assert_eq!(result["protocolVersion"], "2024-11-05");
        assert!(result["capabilities"]["tools"].is_object());
        assert!(result["capabilities"]["resources"].is_object());
    }

    #[tokio::test]
    async fn test_notification_gets_no_response() {
        let server = server();
        let resp = server
            .handle_message(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
            .await;
        assert!(resp.is_none());
    }

    #[tokio::test]
    async fn test_parse_error() {
        let resp = server().handle_message("{not json").await.unwrap();
        assert_eq!(resp.id, Value::Null);
        assert_eq!(resp.error.unwrap().code, JsonRpcError::PARSE_ERROR);
    }

    #[tokio::test]
    async fn test_method_not_found() {
        let resp = call(
            &server(),
            json!({"jsonrpc": "2.0", "id": "x", "method": "prompts/list"}),
        )
        .await;
        assert_eq!(resp.id, json!("x"));
        assert_eq!(resp.error.unwrap().code, JsonRpcError::METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_tools_list_has_seven_tools() {
        let resp = call(
            &server(),
            json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"}),
        )
        .await;
        let tools = resp.result.unwrap()["tools"].as_array().unwrap().len();
        assert_eq!(tools, 7);
    }

    #[tokio::test]
    async fn test_tool_failure_is_error_content() {
        let resp = call(
            &server(),
            json!({"jsonrpc": "2.0", "id": 3, "method": "tools/call", "params": {
                "name": "session_status",
                "arguments": {"session_id": "nope"}
            }}),
        )
        .await;

        assert!(resp.error.is_none());
        let result = resp.result.unwrap();
        assert_eq!(result["isError"], true);
        assert_eq!(
            result["content"][0]["text"],
            "Session not found or expired. Please login again."
        );
    }

    #[tokio::test]
    async fn test_unknown_tool_and_missing_params() {
        let server = server();
        let resp = call(
            &server,
            json!({"jsonrpc": "2.0", "id": 4, "method": "tools/call", "params": {"name": "drop_all"}}),
        )
        .await;
        assert_eq!(resp.error.unwrap().code, JsonRpcError::INVALID_PARAMS);

        let resp = call(
            &server,
            json!({"jsonrpc": "2.0", "id": 5, "method": "tools/call"}),
        )
        .await;
        assert_eq!(resp.error.unwrap().code, JsonRpcError::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_resources() {
        let server = server();
        let resp = call(
            &server,
            json!({"jsonrpc": "2.0", "id": 6, "method": "resources/list"}),
        )
        .await;
        assert_eq!(resp.result.unwrap()["resources"][0]["uri"], "schema://tables");

        let resp = call(
            &server,
            json!({"jsonrpc": "2.0", "id": 7, "method": "resources/read", "params": {"uri": "schema://tables"}}),
        )
        .await;
        assert!(resp.result.unwrap()["contents"][0]["text"].is_string());

        let resp = call(
            &server,
            json!({"jsonrpc": "2.0", "id": 8, "method": "resources/read", "params": {"uri": "schema://nope"}}),
        )
        .await;
        assert_eq!(resp.error.unwrap().code, JsonRpcError::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_ping() {
        let resp = call(&server(), json!({"jsonrpc": "2.0", "id": 9, "method": "ping"})).await;
        assert_eq!(resp.result.unwrap(), json!({}));
    }

    async fn serve_bytes(input: &[u8]) -> String {
        let (server_out, mut client_out) = tokio::io::duplex(64 * 1024);
        Arc::new(server())
            .serve(BufReader::new(input), server_out)
            .await
            .unwrap();

        let mut output = String::new();
        tokio::io::AsyncReadExt::read_to_string(&mut client_out, &mut output)
            .await
            .unwrap();
        output
    }

    #[tokio::test]
    async fn test_invalid_utf8_line_does_not_stop_serving() {
        let input: &[u8] = b"{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"\xff\xfe\"}\n\
            {\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"ping\"}\n";

        let responses: Vec<JsonRpcResponse> = serve_bytes(input)
            .await
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();

        assert_eq!(responses.len(), 2);
        let parse_error = responses.iter().find(|r| r.id == Value::Null).unwrap();
        assert_eq!(
            parse_error.error.as_ref().unwrap().code,
            JsonRpcError::PARSE_ERROR
        );
        let ping = responses.iter().find(|r| r.id == json!(2)).unwrap();
        assert_eq!(ping.result, Some(json!({})));
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<parking_lot::Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_login_token_never_reaches_logs() {
        const TOKEN: &str = "dapi-secret-token-value";
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let login = json!({"jsonrpc": "2.0", "id": 1, "method": "tools/call", "params": {
            "name": "login",
            "arguments": {"host": "adb-1.example.net", "token": TOKEN, "http_path": "/sql/1.0/warehouses/a"}
        }})
        .to_string();
        let input = format!(
            "{}\nContent-Length: {}\r\n\r\n{}",
            login,
            login.len(),
            login.replace("\"id\":1", "\"id\":2")
        );

        let output = serve_bytes(input.as_bytes()).await;
        assert!(output.contains("Authentication failed"));

        let logs = String::from_utf8(captured.0.lock().clone()).unwrap();
        assert!(logs.contains("received line message"));
        assert!(logs.contains("received framed message"));
        assert!(logs.contains("tool call"));
        assert!(!logs.contains(TOKEN));
    }
}
