//! MCP method handlers (JSON-RPC 2.0).

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use rusty_sprite_core::executor::ScriptExecutor;
use rusty_sprite_core::types::RequestContext;

use crate::prompt::{PROMPT_NAME, guidance_prompt, prompt_descriptor};
use crate::resources::ResourceStore;
use crate::{ToolContext, ToolOutput, ToolRegistry};

pub const MCP_PROTOCOL_VERSION: &str = "2025-06-18";

/// Protocol revisions this server can speak, newest first.
const SUPPORTED_PROTOCOL_VERSIONS: &[&str] = &["2025-06-18", "2025-03-26", "2024-11-05"];

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;

/// Incoming JSON-RPC message. A missing `id` marks a notification.
#[derive(Debug, Clone, Deserialize)]
pub struct RpcRequest {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    #[serde(default)]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

/// Everything a method handler needs.
pub struct McpState {
    pub tools: ToolRegistry,
    pub resources: ResourceStore,
    pub executor: Arc<dyn ScriptExecutor>,
    pub default_session: String,
    pub server_name: String,
    pub server_version: String,
}

impl McpState {
    pub fn new(
        tools: ToolRegistry,
        resources: ResourceStore,
        executor: Arc<dyn ScriptExecutor>,
        default_session: impl Into<String>,
    ) -> Self {
        Self {
            tools,
            resources,
            executor,
            default_session: default_session.into(),
            server_name: "rusty-sprite".to_string(),
            server_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Handle one line of newline-delimited JSON-RPC. Returns `None` for
/// notifications, which never get a reply.
pub async fn handle_message(state: &Arc<McpState>, line: &str) -> Option<RpcResponse> {
    let raw: Value = match serde_json::from_str(line) {
        Ok(v) => v,
        Err(e) => {
            warn!("Unparseable MCP message: {e}");
            return Some(error_response(Value::Null, PARSE_ERROR, &format!("Parse error: {e}")));
        }
    };

    let request: RpcRequest = match serde_json::from_value(raw.clone()) {
        Ok(r) => r,
        Err(e) => {
            let id = raw.get("id").cloned().unwrap_or(Value::Null);
            return Some(error_response(
                id,
                INVALID_REQUEST,
                &format!("Invalid request: {e}"),
            ));
        }
    };

    if let Some(version) = request.jsonrpc.as_deref().filter(|v| *v != "2.0") {
        let message = format!("Unsupported jsonrpc version: {version}");
        return request
            .id
            .map(|id| error_response(id, INVALID_REQUEST, &message));
    }

    let Some(id) = request.id else {
        debug!(method = %request.method, "Notification received");
        return None;
    };

    Some(dispatch_method(state, id, &request.method, request.params).await)
}

/// Dispatch a method request and return the response.
pub async fn dispatch_method(
    state: &Arc<McpState>,
    id: Value,
    method: &str,
    params: Option<Value>,
) -> RpcResponse {
    debug!(method, "Dispatching method");

    match method {
        "initialize" => handle_initialize(state, id, params),
        "ping" => ok_response(id, json!({})),
        "tools/list" => ok_response(id, json!({ "tools": state.tools.to_mcp_tools() })),
        "tools/call" => handle_tools_call(state, id, params).await,
        "resources/list" => {
            ok_response(id, json!({ "resources": state.resources.to_mcp_resources() }))
        }
        "resources/read" => handle_resources_read(state, id, params).await,
        "prompts/list" => ok_response(id, json!({ "prompts": [prompt_descriptor()] })),
        "prompts/get" => handle_prompts_get(id, params),
        _ => error_response(
            id,
            METHOD_NOT_FOUND,
            &format!("Method not found: {method}"),
        ),
    }
}

fn handle_initialize(state: &Arc<McpState>, id: Value, params: Option<Value>) -> RpcResponse {
    let params = params.unwrap_or_default();
    let client = params
        .get("clientInfo")
        .and_then(|c| c.get("name"))
        .and_then(|n| n.as_str())
        .unwrap_or("unknown");
    // Answer with the requested revision when supported, else our newest.
    let version = params
        .get("protocolVersion")
        .and_then(|v| v.as_str())
        .filter(|v| SUPPORTED_PROTOCOL_VERSIONS.contains(v))
        .unwrap_or(MCP_PROTOCOL_VERSION);
    info!(client, protocol = version, "MCP client initialized");

    ok_response(
        id,
        json!({
            "protocolVersion": version,
            "capabilities": {
                "tools": { "listChanged": false },
                "resources": { "listChanged": false, "subscribe": false },
                "prompts": { "listChanged": false },
            },
            "serverInfo": {
                "name": state.server_name,
                "version": state.server_version,
            },
        }),
    )
}

async fn handle_tools_call(
    state: &Arc<McpState>,
    id: Value,
    params: Option<Value>,
) -> RpcResponse {
    let params = params.unwrap_or_default();
    let Some(name) = params.get("name").and_then(|v| v.as_str()) else {
        return error_response(id, INVALID_PARAMS, "Missing 'name' parameter");
    };
    let Some(tool) = state.tools.get(name) else {
        return error_response(id, INVALID_PARAMS, &format!("Unknown tool: {name}"));
    };

    let session = params
        .get("_meta")
        .and_then(|m| m.get("session"))
        .and_then(|s| s.as_str())
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(state.default_session.as_str());
    let request = RequestContext::new(session);
    let context = ToolContext {
        request,
        executor: state.executor.clone(),
    };
    let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);

    debug!(
        tool = name,
        session = %context.request.session,
        request_id = %context.request.request_id,
        "Calling tool"
    );

    let output = match tool.execute(arguments, &context).await {
        Ok(output) => output,
        Err(e) => {
            warn!(tool = name, "Tool failed: {e:#}");
            ToolOutput::error(format!("{e:#}"))
        }
    };

    ok_response(
        id,
        json!({
            "content": [{ "type": "text", "text": output.content }],
            "isError": output.is_error,
        }),
    )
}

async fn handle_resources_read(
    state: &Arc<McpState>,
    id: Value,
    params: Option<Value>,
) -> RpcResponse {
    let params = params.unwrap_or_default();
    let Some(uri) = params.get("uri").and_then(|v| v.as_str()) else {
        return error_response(id, INVALID_PARAMS, "Missing 'uri' parameter");
    };
    match state.resources.read(uri).await {
        Some(text) => ok_response(
            id,
            json!({
                "contents": [{ "uri": uri, "mimeType": "text/plain", "text": text }]
            }),
        ),
        None => error_response(id, INVALID_PARAMS, &format!("Unknown resource: {uri}")),
    }
}

fn handle_prompts_get(id: Value, params: Option<Value>) -> RpcResponse {
    let params = params.unwrap_or_default();
    let name = params.get("name").and_then(|v| v.as_str()).unwrap_or("");
    if name != PROMPT_NAME {
        return error_response(id, INVALID_PARAMS, &format!("Unknown prompt: {name}"));
    }
    let Some(user_prompt) = params
        .get("arguments")
        .and_then(|a| a.get("prompt"))
        .and_then(|p| p.as_str())
    else {
        return error_response(id, INVALID_PARAMS, "Missing 'prompt' argument");
    };

    ok_response(
        id,
        json!({
            "description": "LibreSprite guidance",
            "messages": [{
                "role": "user",
                "content": { "type": "text", "text": guidance_prompt(user_prompt) }
            }]
        }),
    )
}

fn ok_response(id: Value, result: Value) -> RpcResponse {
    RpcResponse {
        jsonrpc: "2.0".to_string(),
        id,
        result: Some(result),
        error: None,
    }
}

fn error_response(id: Value, code: i64, message: &str) -> RpcResponse {
    RpcResponse {
        jsonrpc: "2.0".to_string(),
        id,
        result: None,
        error: Some(RpcError {
            code,
            message: message.to_string(),
        }),
    }
}
