// ABOUTME: JSON-RPC 2.0 endpoint for the MCP protocol
// ABOUTME: Dispatches initialize, tools/list, and tools/call against the tool registry
//
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::server::ServerResources;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

const JSONRPC_VERSION: &str = "2.0";
const PROTOCOL_VERSION: &str = "2024-11-05";

/// Routes for the MCP endpoint; the caller applies auth middleware
pub fn router() -> Router<Arc<ServerResources>> {
    Router::new().route("/mcp", post(handle_jsonrpc))
}

/// Inbound JSON-RPC 2.0 request
#[derive(Debug, Deserialize)]
struct JsonRpcRequest {
    #[allow(dead_code)]
    jsonrpc: String,
    method: String,
    #[serde(default)]
    params: Value,
    id: Option<Value>,
}

async fn handle_jsonrpc(
    State(resources): State<Arc<ServerResources>>,
    body: Result<Json<JsonRpcRequest>, axum::extract::rejection::JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(json) => json,
        Err(rejection) => {
            return Json(error_response(
                None,
                -32700,
                &format!("parse error: {rejection}"),
            ))
            .into_response();
        }
    };

    // Notifications carry no id and expect no response body
    let Some(id) = request.id else {
        return StatusCode::ACCEPTED.into_response();
    };

    let response = match request.method.as_str() {
        "initialize" => success_response(id, initialize_result()),
        "ping" => success_response(id, json!({})),
        "tools/list" => success_response(
            id,
            json!({"tools": resources.tools.descriptors()}),
        ),
        "tools/call" => handle_tools_call(&resources, id, request.params).await,
        other => error_response(Some(id), -32601, &format!("method not found: {other}")),
    };

    Json(response).into_response()
}

fn initialize_result() -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": {"tools": {}},
        "serverInfo": {
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
        },
    })
}

async fn handle_tools_call(resources: &ServerResources, id: Value, params: Value) -> Value {
    let Some(name) = params.get("name").and_then(Value::as_str) else {
        return error_response(Some(id), -32602, "missing tool name");
    };
    let arguments = params
        .get("arguments")
        .cloned()
        .unwrap_or_else(|| json!({}));

    // Tool failures are in-band results, not protocol errors: the calling
    // model is expected to read them and adjust.
    let result = match resources.tools.call(name, arguments).await {
        Ok(value) => {
            let text = serde_json::to_string_pretty(&value)
                .unwrap_or_else(|_| value.to_string());
            json!({
                "content": [{"type": "text", "text": text}],
                "isError": false,
            })
        }
        Err(error) => {
            tracing::debug!(tool = name, "tool call failed: {error}");
            json!({
                "content": [{"type": "text", "text": error.to_string()}],
                "isError": true,
            })
        }
    };

    success_response(id, result)
}

fn success_response(id: Value, result: Value) -> Value {
    json!({
        "jsonrpc": JSONRPC_VERSION,
        "id": id,
        "result": result,
    })
}

fn error_response(id: Option<Value>, code: i64, message: &str) -> Value {
    json!({
        "jsonrpc": JSONRPC_VERSION,
        "id": id,
        "error": {"code": code, "message": message},
    })
}
