// ABOUTME: OAuth 2.0 authorization server module
// ABOUTME: Wire models, the proxy provider state machine, and the HTTP route handlers
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # OAuth 2.0 Authorization Server
//!
//! This server is a full (if small) OAuth 2.0 authorization server toward
//! the calling platform, and an OAuth 2.0 client toward Notion. The two
//! roles meet in [`OAuthProxyProvider`].

pub mod models;
pub mod provider;
pub mod routes;

pub use models::{
    AuthorizeRequest, ClientRegistrationRequest, ClientRegistrationResponse, OAuth2ErrorResponse,
    TokenRequest, TokenResponse,
};
pub use provider::OAuthProxyProvider;
