// ABOUTME: Database tools
// ABOUTME: Create, retrieve, update, and query Notion databases
//
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{optional_page_size, optional_str, optional_value, required_str, required_value};
use crate::mcp::Tool;
use crate::notion::ClientAccessor;
use serde_json::json;

/// Database tool definitions
pub fn tools(accessor: &ClientAccessor) -> Vec<Tool> {
    vec![
        create_database(accessor.clone()),
        retrieve_database(accessor.clone()),
        update_database(accessor.clone()),
        query_database(accessor.clone()),
    ]
}

fn create_database(accessor: ClientAccessor) -> Tool {
    Tool::new(
        "notion_create_database",
        "Create a new database as a child of an existing page",
        json!({
            "type": "object",
            "properties": {
                "parent": {"type": "object", "description": "Parent page, e.g. {\"page_id\": \"...\"}"},
                "title": {"type": "array", "description": "Database title as rich text objects"},
                "properties": {"type": "object", "description": "Property schema of the database"}
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
                if let Some(title) = optional_value(&args, "title") {
                    body["title"] = title;
                }
                accessor()?.post("databases", &body).await
            })
        },
    )
}

fn retrieve_database(accessor: ClientAccessor) -> Tool {
    Tool::new(
        "notion_retrieve_database",
        "Retrieve a database's structure and property schema",
        json!({
            "type": "object",
            "properties": {
                "database_id": {"type": "string", "description": "ID of the database to retrieve"}
            },
            "required": ["database_id"]
        }),
        move |args| {
            let accessor = accessor.clone();
            Box::pin(async move {
                let database_id = required_str(&args, "database_id")?;
                accessor()?.get(&format!("databases/{database_id}"), &[]).await
            })
        },
    )
}

fn update_database(accessor: ClientAccessor) -> Tool {
    Tool::new(
        "notion_update_database",
        "Update a database's title, description, or property schema",
        json!({
            "type": "object",
            "properties": {
                "database_id": {"type": "string", "description": "ID of the database to update"},
                "title": {"type": "array", "description": "New title as rich text objects"},
                "description": {"type": "array", "description": "New description as rich text objects"},
                "properties": {"type": "object", "description": "Property schema changes"}
            },
            "required": ["database_id"]
        }),
        move |args| {
            let accessor = accessor.clone();
            Box::pin(async move {
                let database_id = required_str(&args, "database_id")?;
                let mut body = json!({});
                for key in ["title", "description", "properties"] {
                    if let Some(value) = optional_value(&args, key) {
                        body[key] = value;
                    }
                }
                accessor()?
                    .patch(&format!("databases/{database_id}"), &body)
                    .await
            })
        },
    )
}

fn query_database(accessor: ClientAccessor) -> Tool {
    Tool::new(
        "notion_query_database",
        "Query a database with optional filters, sorts, and pagination",
        json!({
            "type": "object",
            "properties": {
                "database_id": {"type": "string", "description": "ID of the database to query"},
                "filter": {"type": "object", "description": "Filter conditions"},
                "sorts": {"type": "array", "description": "Sort criteria"},
                "start_cursor": {"type": "string", "description": "Pagination cursor from a previous response"},
                "page_size": {"type": "integer", "description": "Number of results to return (max 100)"}
            },
            "required": ["database_id"]
        }),
        move |args| {
            let accessor = accessor.clone();
            Box::pin(async move {
                let database_id = required_str(&args, "database_id")?;
                let mut body = json!({});
                if let Some(filter) = optional_value(&args, "filter") {
                    body["filter"] = filter;
                }
                if let Some(sorts) = optional_value(&args, "sorts") {
                    body["sorts"] = sorts;
                }
                if let Some(cursor) = optional_str(&args, "start_cursor") {
                    body["start_cursor"] = json!(cursor);
                }
                if let Some(page_size) = optional_page_size(&args) {
                    body["page_size"] = json!(page_size);
                }
                accessor()?
                    .post(&format!("databases/{database_id}/query"), &body)
                    .await
            })
        },
    )
}
