// ABOUTME: Bearer token authentication middleware for tool-call routes
// ABOUTME: Resolves the token to an upstream credential and binds it for the request's duration
//
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::context::bind_credential;
use crate::errors::{AppError, ErrorResponse};
use crate::server::ServerResources;
use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::sync::Arc;

/// Authenticate a tool-call request and bind its credential.
///
/// Missing, unknown, or revoked tokens are rejected with 401 before any
/// handler runs. On success the remainder of the request executes inside a
/// [`bind_credential`] scope, so handler code can read the credential
/// ambiently; the binding ends with the response (or with cancellation).
pub async fn require_bearer_auth(
    State(resources): State<Arc<ServerResources>>,
    request: Request,
    next: Next,
) -> Response {
    let Some(token) = extract_bearer_token(&request) else {
        return unauthorized("missing bearer token");
    };

    match resources.provider.resolve_bearer(&token).await {
        Ok(credential) => bind_credential(credential, next.run(request)).await,
        Err(error) => {
            tracing::debug!("bearer authentication failed: {error}");
            unauthorized(&error.message)
        }
    }
}

fn extract_bearer_token(request: &Request) -> Option<String> {
    let header = request
        .headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?;
    let token = header.strip_prefix("Bearer ")?;
    if token.is_empty() {
        None
    } else {
        Some(token.to_owned())
    }
}

fn unauthorized(message: &str) -> Response {
    let error = AppError::invalid_token(message);
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, "Bearer")],
        Json(ErrorResponse::from(&error)),
    )
        .into_response()
}
