// ABOUTME: Tool registry built once at startup
// ABOUTME: Maps tool names to input schemas and async handlers
//
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::errors::{AppError, AppResult};
use futures_util::future::BoxFuture;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Async tool handler: JSON arguments in, JSON result out
pub type ToolHandler =
    Arc<dyn Fn(Value) -> BoxFuture<'static, AppResult<Value>> + Send + Sync>;

/// A callable tool with its wire-visible metadata
pub struct Tool {
    /// Tool name as advertised to the calling platform
    pub name: &'static str,
    /// Human-readable description
    pub description: &'static str,
    /// JSON Schema for the tool's arguments
    pub input_schema: Value,
    handler: ToolHandler,
}

impl Tool {
    /// Create a tool from its metadata and handler
    pub fn new<F>(
        name: &'static str,
        description: &'static str,
        input_schema: Value,
        handler: F,
    ) -> Self
    where
        F: Fn(Value) -> BoxFuture<'static, AppResult<Value>> + Send + Sync + 'static,
    {
        Self {
            name,
            description,
            input_schema,
            handler: Arc::new(handler),
        }
    }
}

/// Immutable set of tools assembled at startup.
///
/// Sorted by name so `tools/list` output is stable across restarts.
pub struct ToolRegistry {
    tools: BTreeMap<&'static str, Tool>,
}

impl ToolRegistry {
    /// Build a registry from a set of tools
    #[must_use]
    pub fn new(tools: Vec<Tool>) -> Self {
        Self {
            tools: tools.into_iter().map(|tool| (tool.name, tool)).collect(),
        }
    }

    /// Number of registered tools
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether the registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Wire-format tool descriptors for `tools/list`
    #[must_use]
    pub fn descriptors(&self) -> Vec<Value> {
        self.tools
            .values()
            .map(|tool| {
                serde_json::json!({
                    "name": tool.name,
                    "description": tool.description,
                    "inputSchema": tool.input_schema,
                })
            })
            .collect()
    }

    /// Invoke a tool by name
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for unknown tool names; otherwise whatever the
    /// handler returns
    pub async fn call(&self, name: &str, arguments: Value) -> AppResult<Value> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| AppError::invalid_input(format!("unknown tool: {name}")))?;
        (tool.handler)(arguments).await
    }
}
