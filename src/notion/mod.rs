// ABOUTME: Notion REST API client bound to the per-request credential
// ABOUTME: Tool modules obtain a client through an accessor injected at registry construction
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Notion API Access
//!
//! Tool handlers never see bearer tokens or the credential store. They call
//! the [`ClientAccessor`] handed to them when the tool registry is built,
//! which reads the credential bound to the current request and wraps it in
//! a [`NotionClient`]. Outside an authenticated request the accessor fails
//! with `InvalidToken` rather than falling back to any shared credential.

pub mod tools;

use crate::context::current_credential;
use crate::errors::{AppError, AppResult};
use std::sync::Arc;

/// Notion REST API root
const NOTION_API_BASE: &str = "https://api.notion.com/v1";
/// Pinned Notion API version header value
const NOTION_VERSION: &str = "2022-06-28";

/// Produces a Notion client for the request currently being served
pub type ClientAccessor = Arc<dyn Fn() -> AppResult<NotionClient> + Send + Sync>;

/// The accessor wired into the tool registry in production: a client
/// authenticated as whichever user the current request's bearer token maps to
#[must_use]
pub fn request_client_accessor() -> ClientAccessor {
    client_accessor(NOTION_API_BASE)
}

/// Accessor against an alternate API root
#[must_use]
pub fn client_accessor(api_url: &str) -> ClientAccessor {
    let api_url = api_url.to_owned();
    Arc::new(move || {
        let credential = current_credential()
            .ok_or_else(|| AppError::invalid_token("no credential bound to this request"))?;
        Ok(NotionClient::with_base_url(&credential.access_token, &api_url))
    })
}

/// Build a Notion client from the credential bound to the current request
///
/// # Errors
///
/// Returns `InvalidToken` when no credential is bound, i.e. the caller is
/// outside an authenticated request scope
pub fn client_for_request() -> AppResult<NotionClient> {
    let credential = current_credential()
        .ok_or_else(|| AppError::invalid_token("no credential bound to this request"))?;
    Ok(NotionClient::new(&credential.access_token))
}

/// Thin typed wrapper over the Notion REST API for a single access token
#[derive(Debug)]
pub struct NotionClient {
    http: reqwest::Client,
    base_url: String,
    access_token: String,
}

impl NotionClient {
    /// Create a client for the given access token against the production API
    #[must_use]
    pub fn new(access_token: &str) -> Self {
        Self::with_base_url(access_token, NOTION_API_BASE)
    }

    /// Create a client against an alternate API root
    #[must_use]
    pub fn with_base_url(access_token: &str, base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_owned(),
            access_token: access_token.to_owned(),
        }
    }

    /// GET a resource, with optional query parameters
    pub async fn get(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> AppResult<serde_json::Value> {
        let request = self
            .http
            .get(self.url(path))
            .query(query);
        self.execute(request).await
    }

    /// POST a JSON body
    pub async fn post(&self, path: &str, body: &serde_json::Value) -> AppResult<serde_json::Value> {
        let request = self.http.post(self.url(path)).json(body);
        self.execute(request).await
    }

    /// PATCH a JSON body
    pub async fn patch(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> AppResult<serde_json::Value> {
        let request = self.http.patch(self.url(path)).json(body);
        self.execute(request).await
    }

    /// DELETE a resource
    pub async fn delete(&self, path: &str) -> AppResult<serde_json::Value> {
        let request = self.http.delete(self.url(path));
        self.execute(request).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn execute(&self, request: reqwest::RequestBuilder) -> AppResult<serde_json::Value> {
        let response = request
            .header("Authorization", format!("Bearer {}", self.access_token))
            .header("Notion-Version", NOTION_VERSION)
            .send()
            .await
            .map_err(|e| AppError::upstream_exchange(format!("Notion API request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::upstream_exchange(format!("Notion API response unreadable: {e}")))?;

        if !status.is_success() {
            // Notion error bodies carry a code and message worth surfacing
            return Err(AppError::upstream_exchange(format!(
                "Notion API returned {status}: {body}"
            )));
        }

        serde_json::from_str(&body)
            .map_err(|e| AppError::upstream_exchange(format!("Notion API response parse error: {e}")))
    }
}
