// ABOUTME: Search tool
// ABOUTME: Full-text search across pages and databases shared with the integration
//
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{optional_page_size, optional_str, optional_value};
use crate::mcp::Tool;
use crate::notion::ClientAccessor;
use serde_json::json;

/// Search tool definitions
pub fn tools(accessor: &ClientAccessor) -> Vec<Tool> {
    vec![search(accessor.clone())]
}

fn search(accessor: ClientAccessor) -> Tool {
    Tool::new(
        "notion_search",
        "Search pages and databases by title; empty query lists everything shared with the integration",
        json!({
            "type": "object",
            "properties": {
                "query": {"type": "string", "description": "Text to match against page and database titles"},
                "filter": {"type": "object", "description": "Restrict to pages or databases, e.g. {\"property\": \"object\", \"value\": \"page\"}"},
                "sort": {"type": "object", "description": "Sort by last_edited_time"},
                "start_cursor": {"type": "string", "description": "Pagination cursor from a previous response"},
                "page_size": {"type": "integer", "description": "Number of results to return (max 100)"}
            }
        }),
        move |args| {
            let accessor = accessor.clone();
            Box::pin(async move {
                let mut body = json!({});
                if let Some(query) = optional_str(&args, "query") {
                    body["query"] = json!(query);
                }
                if let Some(filter) = optional_value(&args, "filter") {
                    body["filter"] = filter;
                }
                if let Some(sort) = optional_value(&args, "sort") {
                    body["sort"] = sort;
                }
                if let Some(cursor) = optional_str(&args, "start_cursor") {
                    body["start_cursor"] = json!(cursor);
                }
                if let Some(page_size) = optional_page_size(&args) {
                    body["page_size"] = json!(page_size);
                }
                accessor()?.post("search", &body).await
            })
        },
    )
}
