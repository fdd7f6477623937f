// ABOUTME: Notion tool definitions grouped by API surface
// ABOUTME: Assembles the full tool registry from the per-surface modules
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tool modules mirror the Notion API surfaces: blocks, comments,
//! databases, pages, search, and users. Each module exposes `tools()`,
//! which receives the client accessor and returns its tool definitions.

pub mod blocks;
pub mod comments;
pub mod databases;
pub mod pages;
pub mod search;
pub mod users;

use crate::errors::{AppError, AppResult};
use crate::mcp::ToolRegistry;
use crate::notion::ClientAccessor;
use serde_json::Value;

/// Build the complete Notion tool registry
#[must_use]
pub fn registry(accessor: &ClientAccessor) -> ToolRegistry {
    let mut tools = Vec::new();
    tools.extend(blocks::tools(accessor));
    tools.extend(comments::tools(accessor));
    tools.extend(databases::tools(accessor));
    tools.extend(pages::tools(accessor));
    tools.extend(search::tools(accessor));
    tools.extend(users::tools(accessor));
    ToolRegistry::new(tools)
}

/// Extract a required string argument
pub(crate) fn required_str(args: &Value, key: &str) -> AppResult<String> {
    args.get(key)
        .and_then(Value::as_str)
        .map(ToOwned::to_owned)
        .ok_or_else(|| AppError::invalid_input(format!("missing required argument: {key}")))
}

/// Extract an optional string argument
pub(crate) fn optional_str(args: &Value, key: &str) -> Option<String> {
    args.get(key).and_then(Value::as_str).map(ToOwned::to_owned)
}

/// Extract an optional JSON value argument (objects and arrays pass through)
pub(crate) fn optional_value(args: &Value, key: &str) -> Option<Value> {
    args.get(key).filter(|v| !v.is_null()).cloned()
}

/// Extract a required JSON value argument
pub(crate) fn required_value(args: &Value, key: &str) -> AppResult<Value> {
    optional_value(args, key)
        .ok_or_else(|| AppError::invalid_input(format!("missing required argument: {key}")))
}

/// Extract an optional page-size argument, clamped to Notion's maximum of 100
pub(crate) fn optional_page_size(args: &Value) -> Option<u64> {
    args.get("page_size").and_then(Value::as_u64).map(|n| n.min(100))
}

/// Standard pagination query parameters shared by list endpoints
pub(crate) fn pagination_query(args: &Value) -> Vec<(&'static str, String)> {
    let mut query = Vec::new();
    if let Some(cursor) = optional_str(args, "start_cursor") {
        query.push(("start_cursor", cursor));
    }
    if let Some(page_size) = optional_page_size(args) {
        query.push(("page_size", page_size.to_string()));
    }
    query
}
