// ABOUTME: Block tools
// ABOUTME: Retrieve, list children, append children, update, and delete blocks
//
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{pagination_query, required_str, required_value};
use crate::mcp::Tool;
use crate::notion::ClientAccessor;
use serde_json::json;

/// Block tool definitions
pub fn tools(accessor: &ClientAccessor) -> Vec<Tool> {
    vec![
        retrieve_block(accessor.clone()),
        retrieve_block_children(accessor.clone()),
        append_block_children(accessor.clone()),
        update_block(accessor.clone()),
        delete_block(accessor.clone()),
    ]
}

fn retrieve_block(accessor: ClientAccessor) -> Tool {
    Tool::new(
        "notion_retrieve_block",
        "Retrieve a Notion block by its ID",
        json!({
            "type": "object",
            "properties": {
                "block_id": {"type": "string", "description": "ID of the block to retrieve"}
            },
            "required": ["block_id"]
        }),
        move |args| {
            let accessor = accessor.clone();
            Box::pin(async move {
                let block_id = required_str(&args, "block_id")?;
                accessor()?.get(&format!("blocks/{block_id}"), &[]).await
            })
        },
    )
}

fn retrieve_block_children(accessor: ClientAccessor) -> Tool {
    Tool::new(
        "notion_retrieve_block_children",
        "List the child blocks of a block or page, with pagination",
        json!({
            "type": "object",
            "properties": {
                "block_id": {"type": "string", "description": "ID of the parent block or page"},
                "start_cursor": {"type": "string", "description": "Pagination cursor from a previous response"},
                "page_size": {"type": "integer", "description": "Number of children to return (max 100)"}
            },
            "required": ["block_id"]
        }),
        move |args| {
            let accessor = accessor.clone();
            Box::pin(async move {
                let block_id = required_str(&args, "block_id")?;
                let query = pagination_query(&args);
                accessor()?
                    .get(&format!("blocks/{block_id}/children"), &query)
                    .await
            })
        },
    )
}

fn append_block_children(accessor: ClientAccessor) -> Tool {
    Tool::new(
        "notion_append_block_children",
        "Append child blocks to a block or page",
        json!({
            "type": "object",
            "properties": {
                "block_id": {"type": "string", "description": "ID of the parent block or page"},
                "children": {"type": "array", "description": "Block objects to append"}
            },
            "required": ["block_id", "children"]
        }),
        move |args| {
            let accessor = accessor.clone();
            Box::pin(async move {
                let block_id = required_str(&args, "block_id")?;
                let children = required_value(&args, "children")?;
                accessor()?
                    .patch(
                        &format!("blocks/{block_id}/children"),
                        &json!({"children": children}),
                    )
                    .await
            })
        },
    )
}

fn update_block(accessor: ClientAccessor) -> Tool {
    Tool::new(
        "notion_update_block",
        "Update the content of an existing block",
        json!({
            "type": "object",
            "properties": {
                "block_id": {"type": "string", "description": "ID of the block to update"},
                "block": {"type": "object", "description": "Partial block object with updated fields"}
            },
            "required": ["block_id", "block"]
        }),
        move |args| {
            let accessor = accessor.clone();
            Box::pin(async move {
                let block_id = required_str(&args, "block_id")?;
                let block = required_value(&args, "block")?;
                accessor()?.patch(&format!("blocks/{block_id}"), &block).await
            })
        },
    )
}

fn delete_block(accessor: ClientAccessor) -> Tool {
    Tool::new(
        "notion_delete_block",
        "Move a block to the trash",
        json!({
            "type": "object",
            "properties": {
                "block_id": {"type": "string", "description": "ID of the block to delete"}
            },
            "required": ["block_id"]
        }),
        move |args| {
            let accessor = accessor.clone();
            Box::pin(async move {
                let block_id = required_str(&args, "block_id")?;
                accessor()?.delete(&format!("blocks/{block_id}")).await
            })
        },
    )
}
