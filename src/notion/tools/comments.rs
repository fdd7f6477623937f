// ABOUTME: Comment tools
// ABOUTME: Create comments and list comment threads on pages and blocks
//
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{optional_str, pagination_query, required_str, required_value};
use crate::errors::AppError;
use crate::mcp::Tool;
use crate::notion::ClientAccessor;
use serde_json::json;

/// Comment tool definitions
pub fn tools(accessor: &ClientAccessor) -> Vec<Tool> {
    vec![
        create_comment(accessor.clone()),
        retrieve_comments(accessor.clone()),
    ]
}

fn create_comment(accessor: ClientAccessor) -> Tool {
    Tool::new(
        "notion_create_comment",
        "Add a comment to a page or to an existing discussion thread",
        json!({
            "type": "object",
            "properties": {
                "page_id": {"type": "string", "description": "Page to comment on (mutually exclusive with discussion_id)"},
                "discussion_id": {"type": "string", "description": "Existing discussion thread to reply to"},
                "rich_text": {"type": "array", "description": "Rich text objects forming the comment body"}
            },
            "required": ["rich_text"]
        }),
        move |args| {
            let accessor = accessor.clone();
            Box::pin(async move {
                let rich_text = required_value(&args, "rich_text")?;
                let body = match (
                    optional_str(&args, "page_id"),
                    optional_str(&args, "discussion_id"),
                ) {
                    (Some(page_id), None) => json!({
                        "parent": {"page_id": page_id},
                        "rich_text": rich_text,
                    }),
                    (None, Some(discussion_id)) => json!({
                        "discussion_id": discussion_id,
                        "rich_text": rich_text,
                    }),
                    _ => {
                        return Err(AppError::invalid_input(
                            "exactly one of page_id or discussion_id is required",
                        ))
                    }
                };
                accessor()?.post("comments", &body).await
            })
        },
    )
}

fn retrieve_comments(accessor: ClientAccessor) -> Tool {
    Tool::new(
        "notion_retrieve_comments",
        "List unresolved comments on a page or block, with pagination",
        json!({
            "type": "object",
            "properties": {
                "block_id": {"type": "string", "description": "Page or block whose comments to list"},
                "start_cursor": {"type": "string", "description": "Pagination cursor from a previous response"},
                "page_size": {"type": "integer", "description": "Number of comments to return (max 100)"}
            },
            "required": ["block_id"]
        }),
        move |args| {
            let accessor = accessor.clone();
            Box::pin(async move {
                let block_id = required_str(&args, "block_id")?;
                let mut query = vec![("block_id", block_id)];
                query.extend(pagination_query(&args));
                accessor()?.get("comments", &query).await
            })
        },
    )
}
