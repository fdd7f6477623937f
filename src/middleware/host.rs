// ABOUTME: Host header validation middleware
// ABOUTME: Rejects requests whose Host is not on the configured allow-list (DNS rebinding defense)
//
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::server::ServerResources;
use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

/// Reject requests whose Host header is not on the allow-list.
///
/// The allow-list is derived from the configured base URL and bind address,
/// plus any explicitly configured extra hosts. Comparison is
/// case-insensitive on the host part.
pub async fn enforce_host_allowlist(
    State(resources): State<Arc<ServerResources>>,
    request: Request,
    next: Next,
) -> Response {
    let host = request
        .headers()
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .map(str::to_ascii_lowercase);

    match host {
        Some(host) if resources.allowed_hosts.contains(&host) => next.run(request).await,
        Some(host) => {
            tracing::warn!("rejected request for unknown host: {host}");
            (StatusCode::BAD_REQUEST, "invalid host header").into_response()
        }
        None => (StatusCode::BAD_REQUEST, "missing host header").into_response(),
    }
}
