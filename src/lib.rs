// ABOUTME: Remote MCP server exposing Notion tools behind a per-user OAuth 2.0 proxy
// ABOUTME: Library root declaring the module tree
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Notion MCP Remote
//!
//! A remote MCP server that fronts the Notion API with per-user OAuth.
//! Toward the calling platform it is a small OAuth 2.0 authorization
//! server (dynamic registration, authorization code flow with PKCE,
//! revocation); toward Notion it is an OAuth client that exchanges
//! callback codes for workspace tokens. Each issued bearer token maps to
//! one stored Notion credential, encrypted at rest, and every tool call
//! runs with the credential of whoever presented the token.
//!
//! ## Architecture
//!
//! - [`oauth2`] - authorization server: models, proxy provider, routes
//! - [`upstream`] - OAuth client for the Notion token endpoints
//! - [`store`] - encrypted key-value persistence for all OAuth state
//! - [`context`] - request-scoped credential binding (task-local)
//! - [`mcp`] - tool registry and the JSON-RPC endpoint
//! - [`notion`] - Notion API client and the tool definitions
//! - [`server`] - resource container and router assembly

pub mod config;
pub mod context;
pub mod crypto;
pub mod errors;
pub mod logging;
pub mod mcp;
pub mod middleware;
pub mod notion;
pub mod oauth2;
pub mod server;
pub mod store;
pub mod upstream;
