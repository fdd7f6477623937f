// ABOUTME: User tools
// ABOUTME: List workspace users and retrieve individual user or bot details
//
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{pagination_query, required_str};
use crate::mcp::Tool;
use crate::notion::ClientAccessor;
use serde_json::json;

/// User tool definitions
pub fn tools(accessor: &ClientAccessor) -> Vec<Tool> {
    vec![
        list_users(accessor.clone()),
        retrieve_user(accessor.clone()),
        retrieve_bot_user(accessor.clone()),
    ]
}

fn list_users(accessor: ClientAccessor) -> Tool {
    Tool::new(
        "notion_list_users",
        "List all users in the workspace, with pagination",
        json!({
            "type": "object",
            "properties": {
                "start_cursor": {"type": "string", "description": "Pagination cursor from a previous response"},
                "page_size": {"type": "integer", "description": "Number of users to return (max 100)"}
            }
        }),
        move |args| {
            let accessor = accessor.clone();
            Box::pin(async move {
                let query = pagination_query(&args);
                accessor()?.get("users", &query).await
            })
        },
    )
}

fn retrieve_user(accessor: ClientAccessor) -> Tool {
    Tool::new(
        "notion_retrieve_user",
        "Retrieve a user by their ID",
        json!({
            "type": "object",
            "properties": {
                "user_id": {"type": "string", "description": "ID of the user to retrieve"}
            },
            "required": ["user_id"]
        }),
        move |args| {
            let accessor = accessor.clone();
            Box::pin(async move {
                let user_id = required_str(&args, "user_id")?;
                accessor()?.get(&format!("users/{user_id}"), &[]).await
            })
        },
    )
}

fn retrieve_bot_user(accessor: ClientAccessor) -> Tool {
    Tool::new(
        "notion_retrieve_bot_user",
        "Retrieve the bot user the current credential authenticates as",
        json!({"type": "object", "properties": {}}),
        move |_args| {
            let accessor = accessor.clone();
            Box::pin(async move { accessor()?.get("users/me", &[]).await })
        },
    )
}
