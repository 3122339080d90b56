//! # MCP Handler Module
//!
//! Dispatches JSON-RPC requests to the MCP methods this server implements.
//! Every transport reaches it through the [`RpcService`] trait.
//!
//! ## Supported Methods
//! - `initialize`, `ping`
//! - `tools/list`, `tools/call` (Dune Sim and Blockscout tools, see [`super::tools`])
//! - `resources/list`, `resources/read`, `resources/templates/list`
//! - `prompts/list`, `prompts/get`
//!
//! Notifications (`notifications/*`, or any request without an id) get no response.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, info};

use super::{
    prompts,
    protocol::{error_codes, Request, Response, LATEST_PROTOCOL_VERSION, SUPPORTED_PROTOCOL_VERSIONS},
    resources, tools,
};
use crate::{
    blockchain::UpstreamClient,
    transport::{CallContext, RpcService},
    utils,
};

pub const SERVER_NAME: &str = "MCPWeb3Stats";

#[derive(Debug, Clone)]
pub struct McpHandler {
    client: UpstreamClient,
}

impl McpHandler {
    pub fn new(client: UpstreamClient) -> Self {
        Self { client }
    }

    /// This is the main dispatcher for all incoming MCP requests.
    pub async fn handle(&self, req: Request, ctx: &CallContext) -> Option<Response> {
        if req.is_notification() || req.method.starts_with("notifications/") {
            debug!(method = %req.method, transport = ctx.transport, "notification received");
            return None;
        }

        info!(
            method = %req.method,
            transport = ctx.transport,
            session_id = ctx.session_id.as_deref().unwrap_or("-"),
            "Handling MCP request"
        );

        let id = req.response_id();
        let params = req.params.clone().unwrap_or_else(|| json!({}));

        let result: Result<Value, Response> = match req.method.as_str() {
            "initialize" => Ok(handle_initialize(&params)),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(handle_tools_list()),
            "tools/call" => self.handle_tool_call(&params, &id).await,
            "resources/list" => Ok(resources::list()),
            "resources/templates/list" => Ok(resources::templates()),
            "resources/read" => self.handle_resource_read(&params, &id).await,
            "prompts/list" => Ok(prompts::list()),
            "prompts/get" => handle_prompt_get(&params, &id),
            _ => Err(Response::error(
                id.clone(),
                error_codes::METHOD_NOT_FOUND,
                format!("Method not found: {}", req.method),
            )),
        };

        Some(result.map_or_else(|err| err, |value| Response::success(id, value)))
    }

    /// Handles a 'tools/call' request by dispatching it to the tool catalog.
    async fn handle_tool_call(&self, params: &Value, id: &Value) -> Result<Value, Response> {
        let name: String = utils::get_required_arg(params, "name", id)?;
        let empty_args = json!({});
        let args = match params.get("arguments") {
            None | Some(Value::Null) => &empty_args,
            Some(args @ Value::Object(_)) => args,
            Some(_) => {
                return Err(Response::error(
                    id.clone(),
                    error_codes::INVALID_PARAMS,
                    "'arguments' must be an object".into(),
                ))
            }
        };
        tools::call_tool(&self.client, &name, args, id).await
    }

    async fn handle_resource_read(&self, params: &Value, id: &Value) -> Result<Value, Response> {
        let uri: String = utils::get_required_arg(params, "uri", id)?;
        resources::read(&self.client, &uri, id).await
    }
}

fn handle_prompt_get(params: &Value, id: &Value) -> Result<Value, Response> {
    let name: String = utils::get_required_arg(params, "name", id)?;
    let empty_args = json!({});
    let args = params.get("arguments").unwrap_or(&empty_args);
    prompts::get(&name, args, id)
}

#[async_trait]
impl RpcService for McpHandler {
    async fn call(&self, request: Request, ctx: &CallContext) -> Option<Response> {
        self.handle(request, ctx).await
    }
}

/// Picks the client's protocol version when we speak it, otherwise our latest.
pub fn negotiate_protocol_version(requested: Option<&str>) -> &'static str {
    requested
        .and_then(|v| SUPPORTED_PROTOCOL_VERSIONS.iter().find(|s| **s == v).copied())
        .unwrap_or(LATEST_PROTOCOL_VERSION)
}

/// Handles the 'initialize' request.
fn handle_initialize(params: &Value) -> Value {
    let requested = params.get("protocolVersion").and_then(Value::as_str);
    json!({
        "protocolVersion": negotiate_protocol_version(requested),
        "capabilities": {
            "tools": { "listChanged": false },
            "resources": { "subscribe": false, "listChanged": false },
            "prompts": { "listChanged": false }
        },
        "serverInfo": {
            "name": SERVER_NAME,
            "version": env!("CARGO_PKG_VERSION")
        },
        "instructions": "Blockchain analytics over the Dune Sim API (EVM and SVM wallets, tokens, activity) and Blockscout explorers (addresses, blocks, transactions, contracts)."
    })
}

/// Handles the 'tools/list' request.
fn handle_tools_list() -> Value {
    let tools: Vec<Value> = tools::TOOLS.iter().map(|t| t.definition()).collect();
    json!({ "tools": tools })
}
