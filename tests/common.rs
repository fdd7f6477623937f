// ABOUTME: Shared test utilities for integration tests
// ABOUTME: In-memory server resources, client registration, and flow-walking helpers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc,
    clippy::must_use_candidate
)]

//! Shared setup for integration tests: every test gets an isolated
//! in-memory store and a full resource graph over it.

use notion_mcp_remote::config::environment::{
    HttpConfig, SecurityConfig, ServerConfig, StorageConfig, UpstreamOAuthConfig,
};
use notion_mcp_remote::crypto::RecordCipher;
use notion_mcp_remote::oauth2::models::ClientRegistrationResponse;
use notion_mcp_remote::oauth2::ClientRegistrationRequest;
use notion_mcp_remote::server::ServerResources;
use notion_mcp_remote::store::CredentialStore;
use std::sync::Arc;

pub const TEST_SECRET: &str = "integration-test-session-secret";
pub const TEST_REDIRECT_URI: &str = "https://client.example.com/callback";

/// Configuration pointing at an in-memory store and the given upstream
/// endpoints (usually a wiremock server)
pub fn test_config(token_url: &str, api_url: &str) -> ServerConfig {
    ServerConfig {
        base_url: "http://localhost:8000".into(),
        http: HttpConfig {
            host: "127.0.0.1".into(),
            port: 8000,
        },
        upstream: UpstreamOAuthConfig {
            client_id: "upstream-client-id".into(),
            client_secret: "upstream-client-secret".into(),
            authorize_url: "https://api.notion.com/v1/oauth/authorize".into(),
            token_url: token_url.into(),
            api_url: api_url.into(),
        },
        storage: StorageConfig {
            database_url: "sqlite::memory:".into(),
        },
        security: SecurityConfig {
            session_secret: TEST_SECRET.into(),
            additional_allowed_hosts: vec![],
        },
    }
}

/// Full resource graph over an in-memory store; upstream endpoints point
/// at an unroutable address, for tests that never leave the process
pub async fn test_resources() -> Arc<ServerResources> {
    test_resources_with_upstream("http://127.0.0.1:1/oauth/token", "http://127.0.0.1:1").await
}

/// Full resource graph whose upstream exchanges and API calls hit the
/// given endpoints
pub async fn test_resources_with_upstream(
    token_url: &str,
    api_url: &str,
) -> Arc<ServerResources> {
    let config = test_config(token_url, api_url);
    Arc::new(
        ServerResources::from_config(config)
            .await
            .expect("failed to build test resources"),
    )
}

/// Bare in-memory store sealed with `TEST_SECRET`
pub async fn test_store() -> CredentialStore {
    CredentialStore::new("sqlite::memory:", RecordCipher::from_secret(TEST_SECRET))
        .await
        .expect("failed to open in-memory store")
}

/// Register an OAuth client with the standard test redirect URI
pub async fn register_test_client(resources: &ServerResources) -> ClientRegistrationResponse {
    resources
        .provider
        .register_client(ClientRegistrationRequest {
            redirect_uris: vec![TEST_REDIRECT_URI.into()],
            client_name: Some("Integration Test Client".into()),
            grant_types: None,
            response_types: None,
            scope: None,
        })
        .await
        .expect("client registration failed")
}

/// Extract a single query parameter from a URL
pub fn query_param(url: &str, name: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    parsed
        .query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}
