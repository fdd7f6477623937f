// ABOUTME: Server resource container and HTTP router assembly
// ABOUTME: Wires config, store, OAuth provider, and tool registry into one axum application
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Server Assembly
//!
//! [`ServerResources`] is the dependency container built once at startup
//! and shared by every route via axum state. The router mounts the OAuth
//! surface unauthenticated, puts the MCP endpoint behind bearer auth, and
//! wraps everything in Host validation and request tracing.

use crate::config::ServerConfig;
use crate::crypto::RecordCipher;
use crate::mcp::ToolRegistry;
use crate::middleware::{enforce_host_allowlist, require_bearer_auth};
use crate::notion;
use crate::oauth2::OAuthProxyProvider;
use crate::store::CredentialStore;
use crate::upstream::NotionOAuthClient;
use anyhow::Result;
use axum::routing::get;
use axum::{middleware, Json, Router};
use std::collections::HashSet;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared resources container for dependency injection.
///
/// Constructed once at startup and passed as axum state; all fields are
/// cheaply cloneable handles.
pub struct ServerResources {
    /// Server configuration
    pub config: Arc<ServerConfig>,
    /// Encrypted credential store
    pub store: Arc<CredentialStore>,
    /// OAuth proxy provider
    pub provider: Arc<OAuthProxyProvider>,
    /// Tool registry served over the MCP endpoint
    pub tools: Arc<ToolRegistry>,
    /// Lowercased Host header values accepted on inbound requests
    pub allowed_hosts: HashSet<String>,
}

impl ServerResources {
    /// Build the full resource graph from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the credential store cannot be opened
    pub async fn from_config(config: ServerConfig) -> Result<Self> {
        let cipher = RecordCipher::from_secret(&config.security.session_secret);
        let store = Arc::new(CredentialStore::new(&config.storage.database_url, cipher).await?);

        let upstream = Arc::new(NotionOAuthClient::new(
            config.upstream.clone(),
            config.callback_url(),
        ));
        let provider = Arc::new(OAuthProxyProvider::new(Arc::clone(&store), upstream));

        // Tool handlers read the per-request credential through this
        // accessor; they never touch the store or provider directly.
        let accessor = notion::client_accessor(&config.upstream.api_url);
        let tools = Arc::new(notion::tools::registry(&accessor));

        let allowed_hosts = config
            .allowed_hosts()
            .into_iter()
            .map(|host| host.to_ascii_lowercase())
            .collect();

        Ok(Self {
            config: Arc::new(config),
            store,
            provider,
            tools,
            allowed_hosts,
        })
    }
}

/// Assemble the application router over the given resources
pub fn build_router(resources: Arc<ServerResources>) -> Router {
    let protected = crate::mcp::routes::router().route_layer(middleware::from_fn_with_state(
        Arc::clone(&resources),
        require_bearer_auth,
    ));

    Router::new()
        .merge(crate::oauth2::routes::router())
        .merge(protected)
        .route("/health", get(health))
        .layer(middleware::from_fn_with_state(
            Arc::clone(&resources),
            enforce_host_allowlist,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(resources)
}

/// Liveness probe
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Run the server until the process is stopped
///
/// # Errors
///
/// Returns an error if resources cannot be built or the listener cannot
/// bind
pub async fn run_server(config: ServerConfig) -> Result<()> {
    let bind_address = format!("{}:{}", config.http.host, config.http.port);
    tracing::info!("starting server: {}", config.summary());
    tracing::info!("MCP endpoint at {}/mcp", config.base_url);

    let resources = Arc::new(ServerResources::from_config(config).await?);
    tracing::info!(count = resources.tools.len(), "registered tools");

    let router = build_router(resources);
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("listening on {bind_address}");

    axum::serve(listener, router).await?;
    Ok(())
}
