//! MCP server implementation.
//!
//! Handles JSON-RPC 2.0 over stdio according to the MCP protocol specification.
//! Tool calls run as independent tasks; their responses are written as they
//! complete, so one slow upstream request never holds up the others.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;

use crate::client::ApiClient;
use crate::error::{rpc_codes, McpError, Result};
use crate::tools::ToolRegistry;

/// MCP protocol version we support.
const PROTOCOL_VERSION: &str = "2024-11-05";

/// Server information.
const SERVER_NAME: &str = "compliance-mcp";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");
const SERVER_INSTRUCTIONS: &str = "Read-only access to compliance platform data";

/// Responses from in-flight tool calls waiting to be written.
const RESPONSE_QUEUE: usize = 64;

/// JSON-RPC 2.0 request.
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: Option<JsonValue>,
    pub method: String,
    #[serde(default)]
    pub params: Option<JsonValue>,
}

/// JSON-RPC 2.0 response.
#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC 2.0 error object.
#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<JsonValue>,
}

impl JsonRpcResponse {
    /// Create a success response.
    pub fn success(id: Option<JsonValue>, result: JsonValue) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response.
    pub fn error(id: Option<JsonValue>, code: i32, message: String) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message,
                data: None,
            }),
        }
    }

    /// Create an error response from an McpError.
    pub fn from_error(id: Option<JsonValue>, err: McpError) -> Self {
        Self::error(id, err.rpc_code(), err.to_string())
    }
}

/// What to do after handling one request.
enum Handled {
    /// Write this response now.
    Respond(JsonRpcResponse),
    /// A tool task will deliver the response later.
    Pending,
    /// Notification; nothing is written.
    Silent,
}

/// MCP server.
pub struct McpServer {
    client: ApiClient,
    registry: Arc<ToolRegistry>,
}

impl McpServer {
    /// Create a new MCP server that forwards tool calls through `client`.
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            registry: Arc::new(ToolRegistry::new()),
        }
    }

    /// Run the server, reading from stdin and writing to stdout.
    pub async fn run(&self) -> Result<()> {
        let reader = BufReader::new(tokio::io::stdin());
        let mut stdout = tokio::io::stdout();
        self.serve(reader, &mut stdout).await
    }

    /// Serve newline-delimited JSON-RPC from `reader` until EOF, then wait
    /// for in-flight tool calls to finish.
    pub async fn serve<R, W>(&self, reader: R, writer: &mut W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        let (tx, mut rx) = mpsc::channel::<JsonRpcResponse>(RESPONSE_QUEUE);
        // Dropped at EOF so `rx` closes once every tool task is done.
        let mut tx = Some(tx);

        loop {
            tokio::select! {
                line = lines.next_line(), if tx.is_some() => {
                    let line = match line? {
                        Some(line) => line,
                        None => {
                            tracing::debug!("stdin closed, draining in-flight calls");
                            tx = None;
                            continue;
                        }
                    };

                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }

                    let handled = match serde_json::from_str::<JsonRpcRequest>(line) {
                        Ok(request) => match &tx {
                            Some(tx) => self.handle_request(request, tx),
                            None => Handled::Silent,
                        },
                        Err(e) => Handled::Respond(JsonRpcResponse::error(
                            None,
                            rpc_codes::PARSE_ERROR,
                            format!("Parse error: {}", e),
                        )),
                    };

                    if let Handled::Respond(response) = handled {
                        write_response(writer, &response).await?;
                    }
                }
                Some(response) = rx.recv() => {
                    write_response(writer, &response).await?;
                }
                else => break,
            }
        }

        Ok(())
    }

    /// Handle a single JSON-RPC request.
    ///
    /// Requests without an `id` are notifications: they are acted on but
    /// never answered, not even with an error.
    fn handle_request(
        &self,
        request: JsonRpcRequest,
        tx: &mpsc::Sender<JsonRpcResponse>,
    ) -> Handled {
        let is_notification = request.id.is_none();
        match self.route(request, tx) {
            Handled::Respond(_) if is_notification => Handled::Silent,
            handled => handled,
        }
    }

    fn route(&self, request: JsonRpcRequest, tx: &mpsc::Sender<JsonRpcResponse>) -> Handled {
        // Validate JSON-RPC version
        if request.jsonrpc != "2.0" {
            return Handled::Respond(JsonRpcResponse::error(
                request.id,
                rpc_codes::INVALID_REQUEST,
                "Invalid JSON-RPC version".to_string(),
            ));
        }

        let response = match request.method.as_str() {
            "initialize" => self.handle_initialize(request),
            "initialized" | "notifications/initialized" | "notifications/cancelled" => {
                return Handled::Silent;
            }
            "tools/list" => self.handle_tools_list(request),
            "tools/call" => return self.handle_tools_call(request, tx),
            "ping" => JsonRpcResponse::success(request.id, serde_json::json!({})),
            _ => JsonRpcResponse::error(
                request.id,
                rpc_codes::METHOD_NOT_FOUND,
                format!("Unknown method: {}", request.method),
            ),
        };

        Handled::Respond(response)
    }

    /// Handle the initialize request.
    fn handle_initialize(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        let client_name = request
            .params
            .as_ref()
            .and_then(|p| p.get("clientInfo"))
            .and_then(|c| c.get("name"))
            .and_then(|n| n.as_str())
            .unwrap_or("unknown");
        tracing::info!(client = client_name, "client initialized");

        JsonRpcResponse::success(
            request.id,
            serde_json::json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {
                    "tools": {}
                },
                "serverInfo": {
                    "name": SERVER_NAME,
                    "version": SERVER_VERSION
                },
                "instructions": SERVER_INSTRUCTIONS
            }),
        )
    }

    /// Handle the tools/list request.
    fn handle_tools_list(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        let tools: Vec<JsonValue> = self
            .registry
            .tools()
            .iter()
            .map(|t| {
                serde_json::json!({
                    "name": t.name,
                    "description": t.description,
                    "inputSchema": t.input_schema
                })
            })
            .collect();

        JsonRpcResponse::success(request.id, serde_json::json!({ "tools": tools }))
    }

    /// Handle the tools/call request.
    ///
    /// Malformed params are answered immediately; otherwise the call runs on
    /// its own task and sends its response through `tx`.
    fn handle_tools_call(
        &self,
        request: JsonRpcRequest,
        tx: &mpsc::Sender<JsonRpcResponse>,
    ) -> Handled {
        let (name, arguments) = match parse_call_params(request.params.as_ref()) {
            Ok(parsed) => parsed,
            Err(err) => return Handled::Respond(JsonRpcResponse::from_error(request.id, err)),
        };

        let id = request.id;
        let client = self.client.clone();
        let registry = Arc::clone(&self.registry);
        let tx = tx.clone();

        tokio::spawn(async move {
            tracing::debug!(tool = %name, "tool call");
            let response = match registry.dispatch(&client, &name, arguments).await {
                Ok(result) => {
                    let is_error = result.is_failure();
                    let body = result.into_json();
                    // MCP tool responses are wrapped in content array
                    JsonRpcResponse::success(
                        id.clone(),
                        serde_json::json!({
                            "content": [{
                                "type": "text",
                                "text": serde_json::to_string(&body)
                                    .unwrap_or_else(|_| "null".to_string())
                            }],
                            "isError": is_error
                        }),
                    )
                }
                Err(err) => {
                    tracing::debug!(tool = %name, error = %err, "tool call rejected");
                    JsonRpcResponse::from_error(id.clone(), err)
                }
            };

            if id.is_some() && tx.send(response).await.is_err() {
                tracing::warn!(tool = %name, "response dropped, writer closed");
            }
        });

        Handled::Pending
    }
}

/// Extract the tool name and arguments from tools/call params.
fn parse_call_params(params: Option<&JsonValue>) -> Result<(String, Map<String, JsonValue>)> {
    let params = match params {
        Some(JsonValue::Object(obj)) => obj,
        _ => return Err(McpError::InvalidArg {
            name: "params".to_string(),
            reason: "Missing params object".to_string(),
        }),
    };

    let name = params
        .get("name")
        .and_then(|v| v.as_str())
        .map(|n| n.to_string())
        .ok_or_else(|| McpError::MissingArg("name".to_string()))?;

    let arguments = match params.get("arguments") {
        Some(JsonValue::Object(obj)) => obj.clone(),
        Some(JsonValue::Null) | None => Map::new(),
        _ => {
            return Err(McpError::InvalidArg {
                name: "arguments".to_string(),
                reason: "'arguments' must be an object".to_string(),
            })
        }
    };

    Ok((name, arguments))
}

async fn write_response<W>(writer: &mut W, response: &JsonRpcResponse) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let response_json = serde_json::to_string(response)?;
    writer.write_all(response_json.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn test_server() -> McpServer {
        // Unroutable base URL; these tests never reach the network.
        let config = Config::new("key", "secret", "http://127.0.0.1:1").unwrap();
        McpServer::new(ApiClient::new(config))
    }

    async fn exchange(input: &str) -> Vec<JsonValue> {
        let server = test_server();
        let mut output = Vec::new();
        server.serve(input.as_bytes(), &mut output).await.unwrap();
        String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn test_json_rpc_response_success() {
        let response = JsonRpcResponse::success(Some(JsonValue::Number(1.into())), serde_json::json!({"ok": true}));
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"result\""));
        assert!(!json.contains("\"error\""));
    }

    #[test]
    fn test_json_rpc_response_error() {
        let response = JsonRpcResponse::error(Some(JsonValue::Number(1.into())), -32600, "Invalid".to_string());
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"error\""));
        assert!(!json.contains("\"result\""));
    }

    #[tokio::test]
    async fn test_initialize() {
        let responses = exchange(
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"clientInfo":{"name":"t"}}}"#,
        )
        .await;
        assert_eq!(responses.len(), 1);
        let result = &responses[0]["result"];
        assert_eq!(result["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(result["serverInfo"]["name"], SERVER_NAME);
        assert!(result["capabilities"].get("tools").is_some());
    }

    #[tokio::test]
    async fn test_notifications_get_no_response() {
        let input = concat!(
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n\n",
            r#"{"jsonrpc":"2.0","method":"ping"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":7,"method":"ping"}"#,
            "\n"
        );
        let responses = exchange(input).await;
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0]["id"], 7);
    }

    #[tokio::test]
    async fn test_rejected_notifications_get_no_response() {
        let input = concat!(
            r#"{"jsonrpc":"2.0","method":"tools/call"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","method":"tools/call","params":{"name":"list_controls","arguments":"x"}}"#,
            "\n",
            r#"{"jsonrpc":"1.0","method":"ping"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","method":"tools/call","params":{"name":"delete_controls"}}"#,
            "\n",
            r#"{"jsonrpc":"2.0","method":"resources/list"}"#,
            "\n"
        );
        let responses = exchange(input).await;
        assert!(responses.is_empty(), "unexpected output: {:?}", responses);
    }

    #[tokio::test]
    async fn test_tools_list() {
        let responses = exchange(r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#).await;
        let tools = responses[0]["result"]["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 11);
        assert!(tools.iter().all(|t| t.get("inputSchema").is_some()));
    }

    #[tokio::test]
    async fn test_parse_error() {
        let responses = exchange("{not json}\n").await;
        assert_eq!(responses[0]["error"]["code"], rpc_codes::PARSE_ERROR);
        assert_eq!(responses[0]["id"], JsonValue::Null);
    }

    #[tokio::test]
    async fn test_wrong_version() {
        let responses = exchange(r#"{"jsonrpc":"1.0","id":3,"method":"ping"}"#).await;
        assert_eq!(responses[0]["error"]["code"], rpc_codes::INVALID_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let responses = exchange(r#"{"jsonrpc":"2.0","id":4,"method":"resources/list"}"#).await;
        assert_eq!(responses[0]["error"]["code"], rpc_codes::METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let responses = exchange(
            r#"{"jsonrpc":"2.0","id":5,"method":"tools/call","params":{"name":"delete_controls"}}"#,
        )
        .await;
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0]["id"], 5);
        assert_eq!(responses[0]["error"]["code"], rpc_codes::METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_tools_call_missing_params() {
        let responses = exchange(r#"{"jsonrpc":"2.0","id":6,"method":"tools/call"}"#).await;
        assert_eq!(responses[0]["error"]["code"], rpc_codes::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_tools_call_bad_arguments() {
        let responses = exchange(
            r#"{"jsonrpc":"2.0","id":8,"method":"tools/call","params":{"name":"list_controls","arguments":[1]}}"#,
        )
        .await;
        assert_eq!(responses[0]["error"]["code"], rpc_codes::INVALID_PARAMS);
    }
}
