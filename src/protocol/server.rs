use serde_json::{json, Value};
use std::sync::Arc;

use super::message::{
    CallParams, Request, Response, RpcError, INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST,
    JSONRPC_VERSION, METHOD_NOT_FOUND, PARSE_ERROR,
};
use crate::tools::{ToolError, ToolRegistry, TransitContext};

pub const SERVER_NAME: &str = "transit-o-mat";
pub const PROTOCOL_VERSION: &str = "2025-03-26";

/// Dispatches JSON-RPC frames to the tool registry. Shared by the stdio and
/// HTTP transports.
#[derive(Clone)]
pub struct McpServer {
    ctx: Arc<TransitContext>,
    registry: Arc<ToolRegistry>,
}

impl McpServer {
    pub fn new(ctx: Arc<TransitContext>, registry: Arc<ToolRegistry>) -> Self {
        Self { ctx, registry }
    }

    pub fn context(&self) -> &Arc<TransitContext> {
        &self.ctx
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// Handle one raw frame. Returns the serialized reply, or `None` for
    /// notifications.
    pub async fn handle_line(&self, line: &str) -> Option<String> {
        let response = match serde_json::from_str::<Value>(line) {
            Ok(frame) => self.handle_value(frame).await?,
            Err(e) => Response::failure(
                Value::Null,
                RpcError::new(PARSE_ERROR, format!("Parse error: {}", e)),
            ),
        };
        match serde_json::to_string(&response) {
            Ok(text) => Some(text),
            Err(e) => {
                log::error!("failed to encode response: {}", e);
                None
            }
        }
    }

    pub async fn handle_value(&self, frame: Value) -> Option<Response> {
        let id = frame.get("id").cloned().unwrap_or(Value::Null);
        let request: Request = match serde_json::from_value(frame) {
            Ok(request) => request,
            Err(e) => {
                return Some(Response::failure(
                    id,
                    RpcError::new(INVALID_REQUEST, format!("Invalid request: {}", e)),
                ))
            }
        };
        if request.jsonrpc != JSONRPC_VERSION {
            return Some(Response::failure(
                id,
                RpcError::new(INVALID_REQUEST, "Invalid request: jsonrpc must be \"2.0\""),
            ));
        }
        self.handle(request).await
    }

    pub async fn handle(&self, request: Request) -> Option<Response> {
        log::debug!("rpc {}", request.method);
        let outcome = self
            .dispatch(&request.method, request.params.unwrap_or(Value::Null))
            .await;

        let id = match request.id {
            Some(id) => id,
            None => {
                if let Err(e) = outcome {
                    log::debug!("notification {} failed: {}", request.method, e.message);
                }
                return None;
            }
        };
        Some(match outcome {
            Ok(result) => Response::success(id, result),
            Err(error) => Response::failure(id, error),
        })
    }

    async fn dispatch(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        match method {
            "initialize" => Ok(self.initialize(&params)),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(json!({ "tools": self.registry.descriptors() })),
            "tools/call" => self.call_tool(params).await,
            m if m.starts_with("notifications/") => Ok(Value::Null),
            other => Err(RpcError::new(
                METHOD_NOT_FOUND,
                format!("Method not found: {}", other),
            )),
        }
    }

    fn initialize(&self, params: &Value) -> Value {
        let version = params
            .get("protocolVersion")
            .and_then(Value::as_str)
            .unwrap_or(PROTOCOL_VERSION);
        json!({
            "protocolVersion": version,
            "capabilities": { "tools": { "listChanged": false } },
            "serverInfo": {
                "name": SERVER_NAME,
                "version": env!("CARGO_PKG_VERSION"),
            },
            "instructions": self.ctx.config().agent.instructions,
        })
    }

    async fn call_tool(&self, params: Value) -> Result<Value, RpcError> {
        let params: CallParams = serde_json::from_value(params)
            .map_err(|e| RpcError::new(INVALID_PARAMS, format!("Invalid params: {}", e)))?;

        match self
            .registry
            .call(&self.ctx, &params.name, params.arguments)
            .await
        {
            Ok(value) => Ok(tool_result(value)),
            Err(ToolError::Transit(e)) => {
                log::warn!("{} failed: {}", params.name, e);
                Ok(json!({
                    "content": [{ "type": "text", "text": e.to_string() }],
                    "isError": true,
                }))
            }
            Err(e @ (ToolError::UnknownTool(_) | ToolError::InvalidArguments { .. })) => {
                Err(RpcError::new(INVALID_PARAMS, e.to_string()))
            }
            Err(e @ ToolError::Encode(_)) => Err(RpcError::new(INTERNAL_ERROR, e.to_string())),
        }
    }
}

/// Text results are passed through; structured results are serialized into
/// the text block and also attached as `structuredContent`.
fn tool_result(value: Value) -> Value {
    match value {
        Value::String(text) => json!({
            "content": [{ "type": "text", "text": text }],
            "isError": false,
        }),
        other => json!({
            "content": [{ "type": "text", "text": other.to_string() }],
            "structuredContent": { "result": other },
            "isError": false,
        }),
    }
}
