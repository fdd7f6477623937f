// ABOUTME: OAuth 2.0 data models for client registration, code exchange, and stored records
// ABOUTME: Implements RFC 7591 and OAuth 2.0 request/response structures plus proxy state records
//
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::errors::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// OAuth 2.0 Client Registration Request (RFC 7591)
#[derive(Debug, Deserialize)]
pub struct ClientRegistrationRequest {
    /// Redirect URIs for authorization code flow
    pub redirect_uris: Vec<String>,
    /// Optional client name for display
    pub client_name: Option<String>,
    /// Grant types the client can use
    pub grant_types: Option<Vec<String>>,
    /// Response types the client can use
    pub response_types: Option<Vec<String>>,
    /// Scopes the client can request
    pub scope: Option<String>,
}

/// OAuth 2.0 Client Registration Response (RFC 7591)
#[derive(Debug, Serialize, Deserialize)]
pub struct ClientRegistrationResponse {
    /// Unique client identifier
    pub client_id: String,
    /// Client secret, returned exactly once
    pub client_secret: String,
    /// When the client identifier was issued
    pub client_id_issued_at: i64,
    /// 0 means the secret never expires
    pub client_secret_expires_at: i64,
    /// Redirect URIs registered for this client
    pub redirect_uris: Vec<String>,
    /// Grant types allowed for this client
    pub grant_types: Vec<String>,
    /// Response types allowed for this client
    pub response_types: Vec<String>,
    /// Client name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
}

/// OAuth 2.0 Authorization Request (query parameters of GET /oauth/authorize)
#[derive(Debug, Clone, Deserialize)]
pub struct AuthorizeRequest {
    /// Response type (only `code` is supported)
    pub response_type: String,
    /// Client identifier
    pub client_id: String,
    /// Redirect URI for the response; must match the registration exactly
    pub redirect_uri: String,
    /// Requested scopes
    pub scope: Option<String>,
    /// Caller's opaque state, echoed back unmodified
    pub state: Option<String>,
    /// PKCE code challenge
    pub code_challenge: Option<String>,
    /// PKCE challenge method (`S256`)
    pub code_challenge_method: Option<String>,
}

/// OAuth 2.0 Token Request (form body of POST /oauth/token)
#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    /// Grant type (only `authorization_code` is supported)
    pub grant_type: String,
    /// Authorization code being exchanged
    pub code: Option<String>,
    /// Redirect URI; must match the one bound to the code
    pub redirect_uri: Option<String>,
    /// Client ID
    pub client_id: String,
    /// Client secret
    pub client_secret: String,
    /// PKCE code verifier
    pub code_verifier: Option<String>,
}

/// OAuth 2.0 Token Response
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Proxy-issued bearer token
    pub access_token: String,
    /// Token type (always "Bearer")
    pub token_type: String,
    /// Scopes granted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

/// Token revocation request (form body of POST /oauth/revoke)
#[derive(Debug, Deserialize)]
pub struct RevokeRequest {
    /// Token to revoke
    pub token: String,
}

/// OAuth 2.0 Error Response (RFC 6749 §5.2)
#[derive(Debug, Serialize, Deserialize)]
pub struct OAuth2ErrorResponse {
    /// Error code
    pub error: String,
    /// Human-readable error description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
    /// URI for error information
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_uri: Option<String>,
}

impl OAuth2ErrorResponse {
    /// Malformed or incomplete request
    #[must_use]
    pub fn invalid_request(description: &str) -> Self {
        Self {
            error: "invalid_request".to_owned(),
            error_description: Some(description.to_owned()),
            error_uri: Some(
                "https://datatracker.ietf.org/doc/html/rfc6749#section-4.1.2.1".to_owned(),
            ),
        }
    }

    /// Client authentication failure
    #[must_use]
    pub fn invalid_client() -> Self {
        Self {
            error: "invalid_client".to_owned(),
            error_description: Some("Client authentication failed".to_owned()),
            error_uri: Some(
                "https://datatracker.ietf.org/doc/html/rfc6749#section-5.2".to_owned(),
            ),
        }
    }

    /// Bad, expired, or consumed grant
    #[must_use]
    pub fn invalid_grant(description: &str) -> Self {
        Self {
            error: "invalid_grant".to_owned(),
            error_description: Some(description.to_owned()),
            error_uri: Some(
                "https://datatracker.ietf.org/doc/html/rfc6749#section-5.2".to_owned(),
            ),
        }
    }

    /// Grant type not supported by this server
    #[must_use]
    pub fn unsupported_grant_type() -> Self {
        Self {
            error: "unsupported_grant_type".to_owned(),
            error_description: Some("Grant type not supported".to_owned()),
            error_uri: Some(
                "https://datatracker.ietf.org/doc/html/rfc6749#section-5.2".to_owned(),
            ),
        }
    }
}

impl From<&AppError> for OAuth2ErrorResponse {
    fn from(error: &AppError) -> Self {
        Self {
            error: error.code.oauth_error_code().to_owned(),
            error_description: Some(error.message.clone()),
            error_uri: None,
        }
    }
}

/// Stored OAuth 2.0 client registration
///
/// Immutable after creation; the plaintext secret is never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuth2Client {
    /// Client identifier
    pub client_id: String,
    /// SHA-256 hash of the client secret (hex)
    pub client_secret_hash: String,
    /// Exact-match redirect URIs
    pub redirect_uris: Vec<String>,
    /// Allowed grant types
    pub grant_types: Vec<String>,
    /// Allowed response types
    pub response_types: Vec<String>,
    /// Display name
    pub client_name: Option<String>,
    /// Registration timestamp
    pub created_at: DateTime<Utc>,
}

/// Authorization flow state persisted between the authorize redirect and the
/// upstream callback, keyed by the state nonce sent upstream
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingAuth {
    /// Client that initiated the flow
    pub client_id: String,
    /// Validated redirect URI to return to
    pub redirect_uri: String,
    /// Caller's opaque state, passed back unmodified
    pub state: Option<String>,
    /// Requested scope
    pub scope: Option<String>,
    /// PKCE code challenge carried through the upstream round trip
    pub code_challenge: Option<String>,
    /// PKCE challenge method
    pub code_challenge_method: Option<String>,
    /// When this pending flow becomes invalid
    pub expires_at: DateTime<Utc>,
}

impl PendingAuth {
    /// Whether the pending flow has expired
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}

/// Proxy-issued single-use authorization code
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthCode {
    /// Code value
    pub code: String,
    /// Client the code was issued to
    pub client_id: String,
    /// Redirect URI the code was issued for
    pub redirect_uri: String,
    /// Reference to the stored upstream token record
    pub upstream_id: Uuid,
    /// Scope carried through from the authorization request
    pub scope: Option<String>,
    /// PKCE code challenge to verify at exchange
    pub code_challenge: Option<String>,
    /// Issuance timestamp
    pub created_at: DateTime<Utc>,
    /// Expiry timestamp (minutes after issuance)
    pub expires_at: DateTime<Utc>,
}

impl AuthCode {
    /// Whether the code has expired
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}

/// Proxy-issued bearer token
///
/// Maps one-to-one to an upstream token record. Carries no forced expiry,
/// mirroring the upstream token's non-expiring model; revocation deletes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BearerToken {
    /// Token value
    pub token: String,
    /// Client the token was issued to
    pub client_id: String,
    /// Reference to the stored upstream token record
    pub upstream_id: Uuid,
    /// Scope granted
    pub scope: Option<String>,
    /// Issuance timestamp
    pub issued_at: DateTime<Utc>,
}

/// Upstream (Notion) access token and the identity it authenticates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamToken {
    /// Record identifier referenced by codes and bearer tokens
    pub id: Uuid,
    /// Opaque upstream access token
    pub access_token: String,
    /// Upstream workspace identifier
    pub workspace_id: Option<String>,
    /// Upstream workspace display name
    pub workspace_name: Option<String>,
    /// Upstream bot/integration identifier
    pub bot_id: Option<String>,
    /// Authorizing user's display name
    pub owner_name: Option<String>,
    /// When the token was obtained
    pub obtained_at: DateTime<Utc>,
}

impl UpstreamToken {
    /// Human-readable identity for logs and onboarding, e.g. "Ada (Acme)"
    #[must_use]
    pub fn display_identity(&self) -> Option<String> {
        match (self.owner_name.as_deref(), self.workspace_name.as_deref()) {
            (Some(name), Some(workspace)) => Some(format!("{name} ({workspace})")),
            (Some(single), None) | (None, Some(single)) => Some(single.to_owned()),
            (None, None) => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_oauth2_error_serialization() {
        let error = OAuth2ErrorResponse::invalid_grant("Authorization code expired");

        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("\"error\":\"invalid_grant\""));
        assert!(json.contains("Authorization code expired"));
        assert!(json.contains("rfc6749"));
    }

    #[test]
    fn test_authorize_request_deserialization() {
        let query = "response_type=code&client_id=abc&redirect_uri=https%3A%2F%2Fexample.com%2Fcb\
                     &state=xyz&code_challenge=E9Melhoa&code_challenge_method=S256";
        let request: AuthorizeRequest = serde_urlencoded::from_str(query).unwrap();

        assert_eq!(request.response_type, "code");
        assert_eq!(request.client_id, "abc");
        assert_eq!(request.redirect_uri, "https://example.com/cb");
        assert_eq!(request.state.as_deref(), Some("xyz"));
        assert_eq!(request.code_challenge_method.as_deref(), Some("S256"));
    }

    #[test]
    fn test_auth_code_expiry() {
        let mut code = AuthCode {
            code: "c".into(),
            client_id: "client".into(),
            redirect_uri: "https://example.com/cb".into(),
            upstream_id: Uuid::new_v4(),
            scope: None,
            code_challenge: None,
            created_at: Utc::now(),
            expires_at: Utc::now() + Duration::minutes(5),
        };
        assert!(!code.is_expired());

        code.expires_at = Utc::now() - Duration::seconds(1);
        assert!(code.is_expired());
    }

    #[test]
    fn test_display_identity() {
        let mut token = UpstreamToken {
            id: Uuid::new_v4(),
            access_token: "secret".into(),
            workspace_id: None,
            workspace_name: Some("Acme".into()),
            bot_id: None,
            owner_name: Some("Ada".into()),
            obtained_at: Utc::now(),
        };
        assert_eq!(token.display_identity().as_deref(), Some("Ada (Acme)"));

        token.owner_name = None;
        assert_eq!(token.display_identity().as_deref(), Some("Acme"));

        token.workspace_name = None;
        assert!(token.display_identity().is_none());
    }
}
