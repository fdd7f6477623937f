// ABOUTME: HTTP surface of the OAuth 2.0 authorization server
// ABOUTME: Discovery metadata, client registration, authorize/callback redirects, token and revocation endpoints
//
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::errors::AppError;
use crate::oauth2::models::{
    AuthorizeRequest, ClientRegistrationRequest, OAuth2ErrorResponse, RevokeRequest, TokenRequest,
};
use crate::server::ServerResources;
use axum::extract::{Form, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use std::sync::Arc;

/// Routes for the OAuth 2.0 authorization server surface
pub fn router() -> Router<Arc<ServerResources>> {
    Router::new()
        .route(
            "/.well-known/oauth-authorization-server",
            get(discovery_metadata),
        )
        .route("/oauth/register", post(register_client))
        .route("/oauth/authorize", get(authorize))
        .route("/oauth/callback", get(callback))
        .route("/oauth/token", post(token))
        .route("/oauth/revoke", post(revoke))
}

/// OAuth 2.0 Authorization Server Metadata (RFC 8414)
async fn discovery_metadata(State(resources): State<Arc<ServerResources>>) -> Response {
    let base_url = &resources.config.base_url;

    Json(serde_json::json!({
        "issuer": base_url,
        "authorization_endpoint": format!("{base_url}/oauth/authorize"),
        "token_endpoint": format!("{base_url}/oauth/token"),
        "registration_endpoint": format!("{base_url}/oauth/register"),
        "revocation_endpoint": format!("{base_url}/oauth/revoke"),
        "response_types_supported": ["code"],
        "grant_types_supported": ["authorization_code"],
        "token_endpoint_auth_methods_supported": ["client_secret_post"],
        "code_challenge_methods_supported": ["S256"],
        "scopes_supported": [],
    }))
    .into_response()
}

/// Dynamic client registration (RFC 7591)
async fn register_client(
    State(resources): State<Arc<ServerResources>>,
    Json(request): Json<ClientRegistrationRequest>,
) -> Response {
    match resources.provider.register_client(request).await {
        Ok(response) => (StatusCode::CREATED, Json(response)).into_response(),
        Err(error) => oauth_error_response(&error),
    }
}

/// Authorization endpoint; on success redirects the browser upstream.
///
/// Invalid clients or redirect URIs fail here with a direct error response,
/// never a redirect to an unvalidated target.
async fn authorize(
    State(resources): State<Arc<ServerResources>>,
    Query(request): Query<AuthorizeRequest>,
) -> Response {
    match resources.provider.authorize(request).await {
        Ok(upstream_url) => Redirect::temporary(&upstream_url).into_response(),
        Err(error) => oauth_error_response(&error),
    }
}

/// Query parameters Notion sends to the callback
#[derive(Debug, Deserialize)]
struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

/// Upstream callback; resumes the pending flow and redirects the browser
/// back to the calling platform
async fn callback(
    State(resources): State<Arc<ServerResources>>,
    Query(params): Query<CallbackParams>,
) -> Response {
    let Some(state) = params.state else {
        return oauth_error_response(&AppError::invalid_input("missing state parameter"));
    };

    let result = if let Some(upstream_error) = params.error {
        resources.provider.deny_callback(&state, &upstream_error).await
    } else if let Some(code) = params.code {
        resources.provider.handle_callback(&code, &state).await
    } else {
        Err(AppError::invalid_input("missing code parameter"))
    };

    match result {
        Ok(redirect_url) => Redirect::temporary(&redirect_url).into_response(),
        Err(error) => oauth_error_response(&error),
    }
}

/// Token endpoint; exchanges an authorization code for a bearer token
async fn token(
    State(resources): State<Arc<ServerResources>>,
    Form(request): Form<TokenRequest>,
) -> Response {
    if request.grant_type != "authorization_code" {
        return (
            StatusCode::BAD_REQUEST,
            Json(OAuth2ErrorResponse::unsupported_grant_type()),
        )
            .into_response();
    }

    match resources.provider.exchange_code(request).await {
        Ok(response) => Json(response).into_response(),
        Err(error) => oauth_error_response(&error),
    }
}

/// Revocation endpoint (RFC 7009); always 200, even for unknown tokens
async fn revoke(
    State(resources): State<Arc<ServerResources>>,
    Form(request): Form<RevokeRequest>,
) -> Response {
    match resources.provider.revoke(&request.token).await {
        Ok(()) => StatusCode::OK.into_response(),
        Err(error) => oauth_error_response(&error),
    }
}

/// Render an application error in the RFC 6749 wire format
fn oauth_error_response(error: &AppError) -> Response {
    (error.http_status(), Json(OAuth2ErrorResponse::from(error))).into_response()
}
