// ABOUTME: Tower middleware for the HTTP surface
// ABOUTME: Bearer authentication with credential binding, and Host header validation
//
// SPDX-License-Identifier: MIT OR Apache-2.0

pub mod auth;
pub mod host;

pub use auth::require_bearer_auth;
pub use host::enforce_host_allowlist;
