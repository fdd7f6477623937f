// ABOUTME: OAuth 2.0 authorization server proxying the upstream Notion flow
// ABOUTME: Client registration, authorize redirect, callback exchange, token issuance and lookup
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # OAuth Proxy Provider
//!
//! Implements the server side of the three-party OAuth dance:
//! calling platform <-> this server <-> Notion OAuth.
//!
//! The provider holds no durable state of its own; it is a stateless
//! orchestrator over the [`CredentialStore`].

use crate::errors::{AppError, AppResult, ErrorCode};
use crate::oauth2::models::{
    AuthCode, AuthorizeRequest, BearerToken, ClientRegistrationRequest,
    ClientRegistrationResponse, OAuth2Client, PendingAuth, TokenRequest, TokenResponse,
    UpstreamToken,
};
use crate::store::CredentialStore;
use crate::upstream::NotionOAuthClient;
use base64::{engine::general_purpose, Engine as _};
use chrono::{Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use subtle::ConstantTimeEq;

/// Authorization codes are valid this long after issuance
const AUTH_CODE_LIFETIME_MINUTES: i64 = 5;
/// Pending flows are abandoned this long after the authorize redirect
const PENDING_AUTH_LIFETIME_MINUTES: i64 = 10;

/// OAuth 2.0 authorization server proxying to Notion for user authorization
pub struct OAuthProxyProvider {
    store: Arc<CredentialStore>,
    upstream: Arc<NotionOAuthClient>,
}

impl OAuthProxyProvider {
    /// Create a provider over the given store and upstream client
    #[must_use]
    pub fn new(store: Arc<CredentialStore>, upstream: Arc<NotionOAuthClient>) -> Self {
        Self { store, upstream }
    }

    // ------------------------------------------------------------------
    // Dynamic client registration (RFC 7591)
    // ------------------------------------------------------------------

    /// Register a new OAuth 2.0 client
    ///
    /// Generates a client id and secret, persists the registration with the
    /// secret hashed, and returns the plaintext secret exactly once.
    pub async fn register_client(
        &self,
        request: ClientRegistrationRequest,
    ) -> AppResult<ClientRegistrationResponse> {
        Self::validate_registration_request(&request)?;

        let client_id = format!("mcp_client_{}", uuid::Uuid::new_v4().simple());
        let client_secret = generate_token(32);
        let created_at = Utc::now();

        let grant_types = request
            .grant_types
            .unwrap_or_else(|| vec!["authorization_code".to_owned()]);
        let response_types = request
            .response_types
            .unwrap_or_else(|| vec!["code".to_owned()]);

        let client = OAuth2Client {
            client_id: client_id.clone(),
            client_secret_hash: hash_secret(&client_secret),
            redirect_uris: request.redirect_uris.clone(),
            grant_types: grant_types.clone(),
            response_types: response_types.clone(),
            client_name: request.client_name.clone(),
            created_at,
        };

        self.store.store_client(&client).await?;
        tracing::info!(client_id = %client_id, "registered OAuth client");

        Ok(ClientRegistrationResponse {
            client_id,
            client_secret,
            client_id_issued_at: created_at.timestamp(),
            client_secret_expires_at: 0,
            redirect_uris: request.redirect_uris,
            grant_types,
            response_types,
            client_name: request.client_name,
        })
    }

    // ------------------------------------------------------------------
    // Authorization (redirect to upstream)
    // ------------------------------------------------------------------

    /// Validate an authorization request and build the upstream redirect.
    ///
    /// The caller's redirect URI must match a registered URI exactly; a
    /// mismatch is a hard failure before any upstream redirect occurs. The
    /// caller's state and redirect are parked in a pending-auth record keyed
    /// by a fresh nonce so the upstream callback can resume the flow.
    pub async fn authorize(&self, request: AuthorizeRequest) -> AppResult<String> {
        let client = self
            .store
            .get_client(&request.client_id)
            .await?
            .ok_or_else(|| AppError::invalid_client(request.client_id.clone()))?;

        if request.response_type != "code" {
            return Err(AppError::invalid_input(
                "only the 'code' response_type is supported",
            ));
        }

        // Exact match only; no prefix or partial matching.
        if !client.redirect_uris.contains(&request.redirect_uri) {
            return Err(AppError::invalid_redirect(request.redirect_uri));
        }

        let nonce = generate_token(32);
        let pending = PendingAuth {
            client_id: request.client_id,
            redirect_uri: request.redirect_uri,
            state: request.state,
            scope: request.scope,
            code_challenge: request.code_challenge,
            code_challenge_method: request.code_challenge_method,
            expires_at: Utc::now() + Duration::minutes(PENDING_AUTH_LIFETIME_MINUTES),
        };
        self.store.store_pending_auth(&nonce, &pending).await?;

        Ok(self.upstream.authorize_url(&nonce))
    }

    // ------------------------------------------------------------------
    // Upstream callback (code -> upstream token -> proxy code)
    // ------------------------------------------------------------------

    /// Complete the upstream half of the flow and redirect the user back.
    ///
    /// Exchanges the upstream code for an access token, persists it, mints
    /// a proxy authorization code bound to the original client and redirect,
    /// and returns the redirect URL carrying that code plus the caller's
    /// original state. If the upstream exchange fails, returns an error
    /// redirect to the (already validated) original redirect URI instead;
    /// a token is never fabricated.
    pub async fn handle_callback(&self, code: &str, state: &str) -> AppResult<String> {
        let pending = self
            .store
            .take_pending_auth(state)
            .await?
            .ok_or_else(|| AppError::invalid_grant("unknown or expired authorization state"))?;

        if pending.is_expired() {
            return Err(AppError::invalid_grant("authorization state expired"));
        }

        let upstream_token = match self.upstream.exchange_code(code).await {
            Ok(token) => token,
            Err(error) => {
                tracing::warn!(client_id = %pending.client_id, "upstream exchange failed: {error}");
                return Ok(error_redirect(&pending.redirect_uri, &error, pending.state.as_deref()));
            }
        };

        if let Some(identity) = upstream_token.display_identity() {
            tracing::info!(client_id = %pending.client_id, "connected upstream account: {identity}");
        }
        self.store.store_upstream_token(&upstream_token).await?;

        let code_value = generate_token(32);
        let auth_code = AuthCode {
            code: code_value.clone(),
            client_id: pending.client_id,
            redirect_uri: pending.redirect_uri.clone(),
            upstream_id: upstream_token.id,
            scope: pending.scope,
            code_challenge: pending.code_challenge,
            created_at: Utc::now(),
            expires_at: Utc::now() + Duration::minutes(AUTH_CODE_LIFETIME_MINUTES),
        };
        self.store.store_auth_code(&auth_code).await?;

        let mut params = vec![("code", code_value)];
        if let Some(state) = pending.state {
            params.push(("state", state));
        }
        Ok(append_query(&pending.redirect_uri, &params))
    }

    /// Resume a flow whose upstream authorization was denied.
    ///
    /// Consumes the pending record and returns an error redirect back to
    /// the original caller carrying the upstream error code.
    pub async fn deny_callback(&self, state: &str, upstream_error: &str) -> AppResult<String> {
        let pending = self
            .store
            .take_pending_auth(state)
            .await?
            .ok_or_else(|| AppError::invalid_grant("unknown or expired authorization state"))?;

        tracing::warn!(client_id = %pending.client_id, "upstream authorization denied: {upstream_error}");

        let mut params = vec![("error", upstream_error.to_owned())];
        if let Some(state) = pending.state {
            params.push(("state", state));
        }
        Ok(append_query(&pending.redirect_uri, &params))
    }

    // ------------------------------------------------------------------
    // Token exchange (proxy code -> bearer token)
    // ------------------------------------------------------------------

    /// Exchange an authorization code for a proxy-issued bearer token.
    ///
    /// The code is consumed atomically: under concurrent exchange attempts
    /// on the same code exactly one succeeds. Any failed validation after
    /// consumption burns the code, so replays never get a second chance.
    pub async fn exchange_code(&self, request: TokenRequest) -> AppResult<TokenResponse> {
        let client = self
            .store
            .get_client(&request.client_id)
            .await?
            .ok_or_else(|| AppError::invalid_client(request.client_id.clone()))?;

        if !constant_time_eq(&hash_secret(&request.client_secret), &client.client_secret_hash) {
            return Err(AppError::invalid_client("client secret mismatch"));
        }

        let code = request
            .code
            .ok_or_else(|| AppError::invalid_input("missing authorization code"))?;
        let redirect_uri = request
            .redirect_uri
            .ok_or_else(|| AppError::invalid_input("missing redirect_uri"))?;

        let auth_code = self
            .store
            .take_auth_code(&code)
            .await?
            .ok_or_else(|| AppError::invalid_grant("authorization code unknown or already used"))?;

        if auth_code.client_id != request.client_id {
            return Err(AppError::invalid_grant("code was issued to a different client"));
        }
        if auth_code.redirect_uri != redirect_uri {
            return Err(AppError::invalid_grant("redirect URI mismatch"));
        }
        if auth_code.is_expired() {
            return Err(AppError::invalid_grant("authorization code expired"));
        }
        if let Some(challenge) = &auth_code.code_challenge {
            let verifier = request
                .code_verifier
                .ok_or_else(|| AppError::invalid_grant("missing PKCE code_verifier"))?;
            if !verify_pkce_s256(challenge, &verifier) {
                return Err(AppError::invalid_grant("PKCE verification failed"));
            }
        }

        let token_value = generate_token(32);
        let bearer = BearerToken {
            token: token_value.clone(),
            client_id: auth_code.client_id,
            upstream_id: auth_code.upstream_id,
            scope: auth_code.scope.clone(),
            issued_at: Utc::now(),
        };
        self.store.store_bearer_token(&bearer).await?;

        tracing::info!(client_id = %bearer.client_id, "issued bearer token");

        Ok(TokenResponse {
            access_token: token_value,
            token_type: "Bearer".to_owned(),
            scope: auth_code.scope,
        })
    }

    // ------------------------------------------------------------------
    // Bearer token resolution (every tool-call request)
    // ------------------------------------------------------------------

    /// Resolve a bearer token to the upstream credential it maps to.
    ///
    /// Fails with `InvalidToken` when the bearer token is unknown or
    /// revoked, or when its upstream record is missing or unreadable;
    /// the transport layer turns all of these into an unauthorized
    /// response, prompting the calling platform to restart the flow.
    pub async fn resolve_bearer(&self, token: &str) -> AppResult<Arc<UpstreamToken>> {
        let bearer = self
            .store
            .get_bearer_token(token)
            .await
            .map_err(absorb_decryption)?
            .ok_or_else(|| AppError::invalid_token("unknown or revoked bearer token"))?;

        let upstream = self
            .store
            .get_upstream_token(bearer.upstream_id)
            .await
            .map_err(absorb_decryption)?
            .ok_or_else(|| AppError::invalid_token("upstream credential missing"))?;

        Ok(Arc::new(upstream))
    }

    // ------------------------------------------------------------------
    // Revocation
    // ------------------------------------------------------------------

    /// Revoke a bearer token by deleting its record; idempotent.
    ///
    /// Does not attempt to revoke the upstream token; that can only happen
    /// on the upstream service directly.
    pub async fn revoke(&self, token: &str) -> AppResult<()> {
        self.store.delete_bearer_token(token).await?;
        tracing::info!("revoked bearer token");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Registration validation
    // ------------------------------------------------------------------

    fn validate_registration_request(request: &ClientRegistrationRequest) -> AppResult<()> {
        if request.redirect_uris.is_empty() {
            return Err(AppError::invalid_input("at least one redirect_uri is required"));
        }
        for uri in &request.redirect_uris {
            if !is_valid_redirect_uri(uri) {
                return Err(AppError::invalid_input(format!("invalid redirect_uri: {uri}")));
            }
        }
        if let Some(grant_types) = &request.grant_types {
            for grant_type in grant_types {
                if grant_type != "authorization_code" {
                    return Err(AppError::invalid_input(format!(
                        "unsupported grant_type: {grant_type}"
                    )));
                }
            }
        }
        if let Some(response_types) = &request.response_types {
            for response_type in response_types {
                if response_type != "code" {
                    return Err(AppError::invalid_input(format!(
                        "unsupported response_type: {response_type}"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Redirect URIs must be HTTPS or loopback
fn is_valid_redirect_uri(uri: &str) -> bool {
    uri.starts_with("https://")
        || uri.starts_with("http://localhost")
        || uri.starts_with("http://127.0.0.1")
}

/// Generate URL-safe random token material
fn generate_token(length: usize) -> String {
    let mut bytes = vec![0u8; length];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    general_purpose::URL_SAFE_NO_PAD.encode(&bytes)
}

/// Hash a client secret for storage
fn hash_secret(secret: &str) -> String {
    hex::encode(Sha256::digest(secret.as_bytes()))
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Verify a PKCE S256 challenge against the presented verifier
fn verify_pkce_s256(challenge: &str, verifier: &str) -> bool {
    let computed = general_purpose::URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()));
    constant_time_eq(&computed, challenge)
}

/// Append query parameters to a redirect URI, preserving any existing query
fn append_query(redirect_uri: &str, params: &[(&str, String)]) -> String {
    let query = params
        .iter()
        .map(|(name, value)| format!("{name}={}", urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&");
    let separator = if redirect_uri.contains('?') { '&' } else { '?' };
    format!("{redirect_uri}{separator}{query}")
}

/// Build an RFC 6749 error redirect back to the caller
fn error_redirect(redirect_uri: &str, error: &AppError, state: Option<&str>) -> String {
    let mut params = vec![
        ("error", error.code.oauth_error_code().to_owned()),
        ("error_description", error.message.clone()),
    ];
    if let Some(state) = state {
        params.push(("state", state.to_owned()));
    }
    append_query(redirect_uri, &params)
}

/// A decryption failure during resolution is unauthorized, not a 500: the
/// record is unrecoverable and the user has to reconnect either way.
fn absorb_decryption(error: AppError) -> AppError {
    if error.code == ErrorCode::Decryption {
        AppError::invalid_token("stored credential unreadable")
    } else {
        error
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_redirect_uri_validation() {
        assert!(is_valid_redirect_uri("https://claude.ai/api/mcp/auth_callback"));
        assert!(is_valid_redirect_uri("http://localhost:3000/cb"));
        assert!(is_valid_redirect_uri("http://127.0.0.1:8080/cb"));
        assert!(!is_valid_redirect_uri("http://example.com/cb"));
        assert!(!is_valid_redirect_uri("javascript:alert(1)"));
    }

    #[test]
    fn test_append_query_separator() {
        let plain = append_query("https://example.com/cb", &[("code", "abc".into())]);
        assert_eq!(plain, "https://example.com/cb?code=abc");

        let existing = append_query("https://example.com/cb?keep=1", &[("code", "abc".into())]);
        assert_eq!(existing, "https://example.com/cb?keep=1&code=abc");
    }

    #[test]
    fn test_pkce_s256_verification() {
        // Verifier/challenge pair from RFC 7636 appendix B
        let verifier = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";
        let challenge = "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM";

        assert!(verify_pkce_s256(challenge, verifier));
        assert!(!verify_pkce_s256(challenge, "wrong-verifier"));
    }

    #[test]
    fn test_generated_tokens_are_unique_and_urlsafe() {
        let first = generate_token(32);
        let second = generate_token(32);
        assert_ne!(first, second);
        assert!(!first.contains('+'));
        assert!(!first.contains('/'));
    }
}
