// ABOUTME: Request-scoped credential binding via a tokio task-local slot
// ABOUTME: Makes the resolved upstream credential ambiently visible to handler code
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Per-Request Credential Binding
//!
//! Handler code is written against a single-tenant assumption: it asks for
//! "the current credential" and gets one. This module supplies that illusion
//! for a multi-tenant process. The auth middleware resolves the inbound
//! bearer token to an upstream credential and wraps the rest of the request
//! in [`bind_credential`]; everything the handler transitively calls can
//! read the slot with [`current_credential`] without parameter threading.
//!
//! The slot is a tokio task-local, so concurrently executing requests hold
//! independent values, and the binding is released on every exit path (normal
//! return, error, or cancellation); the scope ends when the
//! wrapped future is dropped.

use crate::oauth2::models::UpstreamToken;
use std::future::Future;
use std::sync::Arc;

tokio::task_local! {
    static REQUEST_CREDENTIAL: Arc<UpstreamToken>;
}

/// Run `body` with the ambient credential slot set to `credential`.
///
/// Visible to `body` and everything it transitively awaits on the same
/// task. The prior value (absent, for top-level requests) is restored when
/// `body` completes or is cancelled.
pub async fn bind_credential<F>(credential: Arc<UpstreamToken>, body: F) -> F::Output
where
    F: Future,
{
    REQUEST_CREDENTIAL.scope(credential, body).await
}

/// Read the credential bound to the current request, if any.
///
/// Returns `None` outside a [`bind_credential`] scope, e.g. on code paths
/// that never went through the tool-call auth middleware.
#[must_use]
pub fn current_credential() -> Option<Arc<UpstreamToken>> {
    REQUEST_CREDENTIAL
        .try_with(std::clone::Clone::clone)
        .ok()
}
