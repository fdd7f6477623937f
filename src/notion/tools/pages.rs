// ABOUTME: Page tools
// ABOUTME: Create pages, retrieve them, and update their properties or archive state
//
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{optional_value, required_str, required_value};
use crate::mcp::Tool;
use crate::notion::ClientAccessor;
use serde_json::json;

/// Page tool definitions
pub fn tools(accessor: &ClientAccessor) -> Vec<Tool> {
    vec![
        create_page(accessor.clone()),
        retrieve_page(accessor.clone()),
        update_page_properties(accessor.clone()),
    ]
}

fn create_page(accessor: ClientAccessor) -> Tool {
    Tool::new(
        "notion_create_page",
        "Create a new page under a parent page or database",
        json!({
            "type": "object",
            "properties": {
                "parent": {"type": "object", "description": "Parent reference, e.g. {\"page_id\": \"...\"} or {\"database_id\": \"...\"}"},
                "properties": {"type": "object", "description": "Page properties; for database parents these must match the schema"},
                "children": {"type": "array", "description": "Optional content blocks for the new page"}
            },
            "required": ["parent", "properties"]
        }),
        move |args| {
            let accessor = accessor.clone();
            Box::pin(async move {
                let parent = required_value(&args, "parent")?;
                let properties = required_value(&args, "properties")?;
                let mut body = json!({
                    "parent": parent,
                    "properties": properties,
                });
                if let Some(children) = optional_value(&args, "children") {
                    body["children"] = children;
                }
                accessor()?.post("pages", &body).await
            })
        },
    )
}

fn retrieve_page(accessor: ClientAccessor) -> Tool {
    Tool::new(
        "notion_retrieve_page",
        "Retrieve a page's properties by its ID",
        json!({
            "type": "object",
            "properties": {
                "page_id": {"type": "string", "description": "ID of the page to retrieve"}
            },
            "required": ["page_id"]
        }),
        move |args| {
            let accessor = accessor.clone();
            Box::pin(async move {
                let page_id = required_str(&args, "page_id")?;
                accessor()?.get(&format!("pages/{page_id}"), &[]).await
            })
        },
    )
}

fn update_page_properties(accessor: ClientAccessor) -> Tool {
    Tool::new(
        "notion_update_page_properties",
        "Update a page's properties, or archive/restore it",
        json!({
            "type": "object",
            "properties": {
                "page_id": {"type": "string", "description": "ID of the page to update"},
                "properties": {"type": "object", "description": "Property values to update"},
                "archived": {"type": "boolean", "description": "Set true to move the page to trash, false to restore"}
            },
            "required": ["page_id"]
        }),
        move |args| {
            let accessor = accessor.clone();
            Box::pin(async move {
                let page_id = required_str(&args, "page_id")?;
                let mut body = json!({});
                if let Some(properties) = optional_value(&args, "properties") {
                    body["properties"] = properties;
                }
                if let Some(archived) = args.get("archived").and_then(serde_json::Value::as_bool) {
                    body["archived"] = json!(archived);
                }
                accessor()?.patch(&format!("pages/{page_id}"), &body).await
            })
        },
    )
}
