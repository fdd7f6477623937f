// ABOUTME: Integration tests for the OAuth proxy provider state machine
// ABOUTME: Registration, authorize validation, code exchange, expiry, and double-spend
//
// SPDX-License-Identifier: MIT OR Apache-2.0
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod common;

use chrono::{Duration, Utc};
use notion_mcp_remote::errors::ErrorCode;
use notion_mcp_remote::oauth2::models::{AuthCode, UpstreamToken};
use notion_mcp_remote::oauth2::{AuthorizeRequest, ClientRegistrationRequest, TokenRequest};
use uuid::Uuid;

fn authorize_request(client_id: &str, redirect_uri: &str) -> AuthorizeRequest {
    AuthorizeRequest {
        response_type: "code".into(),
        client_id: client_id.into(),
        redirect_uri: redirect_uri.into(),
        scope: None,
        state: Some("caller-state".into()),
        code_challenge: None,
        code_challenge_method: None,
    }
}

fn token_request(client_id: &str, client_secret: &str, code: &str) -> TokenRequest {
    TokenRequest {
        grant_type: "authorization_code".into(),
        code: Some(code.into()),
        redirect_uri: Some(common::TEST_REDIRECT_URI.into()),
        client_id: client_id.into(),
        client_secret: client_secret.into(),
        code_verifier: None,
    }
}

/// Seed an upstream token and a live auth code bound to the given client
async fn seed_auth_code(
    resources: &notion_mcp_remote::server::ServerResources,
    client_id: &str,
    code: &str,
) {
    let upstream = UpstreamToken {
        id: Uuid::new_v4(),
        access_token: "secret_notion".into(),
        workspace_id: None,
        workspace_name: Some("Acme".into()),
        bot_id: None,
        owner_name: None,
        obtained_at: Utc::now(),
    };
    resources.store.store_upstream_token(&upstream).await.unwrap();

    resources
        .store
        .store_auth_code(&AuthCode {
            code: code.into(),
            client_id: client_id.into(),
            redirect_uri: common::TEST_REDIRECT_URI.into(),
            upstream_id: upstream.id,
            scope: None,
            code_challenge: None,
            created_at: Utc::now(),
            expires_at: Utc::now() + Duration::minutes(5),
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn test_registration_issues_usable_credentials() {
    let resources = common::test_resources().await;

    let registration = common::register_test_client(&resources).await;

    assert!(registration.client_id.starts_with("mcp_client_"));
    assert!(!registration.client_secret.is_empty());
    assert_eq!(registration.grant_types, vec!["authorization_code"]);

    let stored = resources
        .store
        .get_client(&registration.client_id)
        .await
        .unwrap()
        .unwrap();
    // Only a hash of the secret is persisted
    assert_ne!(stored.client_secret_hash, registration.client_secret);
}

#[tokio::test]
async fn test_registration_rejects_plain_http_redirect() {
    let resources = common::test_resources().await;

    let error = resources
        .provider
        .register_client(ClientRegistrationRequest {
            redirect_uris: vec!["http://evil.example.com/cb".into()],
            client_name: None,
            grant_types: None,
            response_types: None,
            scope: None,
        })
        .await
        .unwrap_err();

    assert_eq!(error.code, ErrorCode::InvalidInput);
}

#[tokio::test]
async fn test_authorize_redirects_upstream_with_nonce() {
    let resources = common::test_resources().await;
    let registration = common::register_test_client(&resources).await;

    let url = resources
        .provider
        .authorize(authorize_request(
            &registration.client_id,
            common::TEST_REDIRECT_URI,
        ))
        .await
        .unwrap();

    assert!(url.starts_with("https://api.notion.com/v1/oauth/authorize"));
    // The state sent upstream is a fresh nonce, not the caller's state
    let upstream_state = common::query_param(&url, "state").unwrap();
    assert_ne!(upstream_state, "caller-state");
}

#[tokio::test]
async fn test_authorize_rejects_unregistered_redirect_before_any_redirect() {
    let resources = common::test_resources().await;
    let registration = common::register_test_client(&resources).await;

    let error = resources
        .provider
        .authorize(authorize_request(
            &registration.client_id,
            "https://attacker.example.com/cb",
        ))
        .await
        .unwrap_err();

    assert_eq!(error.code, ErrorCode::InvalidRedirect);
}

#[tokio::test]
async fn test_authorize_rejects_unknown_client() {
    let resources = common::test_resources().await;

    let error = resources
        .provider
        .authorize(authorize_request("mcp_client_nope", common::TEST_REDIRECT_URI))
        .await
        .unwrap_err();

    assert_eq!(error.code, ErrorCode::InvalidClient);
}

#[tokio::test]
async fn test_exchange_rejects_wrong_client_secret() {
    let resources = common::test_resources().await;
    let registration = common::register_test_client(&resources).await;
    seed_auth_code(&resources, &registration.client_id, "code-1").await;

    let error = resources
        .provider
        .exchange_code(token_request(
            &registration.client_id,
            "not-the-secret",
            "code-1",
        ))
        .await
        .unwrap_err();

    assert_eq!(error.code, ErrorCode::InvalidClient);
}

#[tokio::test]
async fn test_exchange_rejects_expired_code() {
    let resources = common::test_resources().await;
    let registration = common::register_test_client(&resources).await;

    let upstream_id = Uuid::new_v4();
    resources
        .store
        .store_auth_code(&AuthCode {
            code: "stale".into(),
            client_id: registration.client_id.clone(),
            redirect_uri: common::TEST_REDIRECT_URI.into(),
            upstream_id,
            scope: None,
            code_challenge: None,
            created_at: Utc::now() - Duration::minutes(10),
            expires_at: Utc::now() - Duration::minutes(5),
        })
        .await
        .unwrap();

    let error = resources
        .provider
        .exchange_code(token_request(
            &registration.client_id,
            &registration.client_secret,
            "stale",
        ))
        .await
        .unwrap_err();

    assert_eq!(error.code, ErrorCode::InvalidGrant);
}

#[tokio::test]
async fn test_exchange_succeeds_then_resolves_bearer() {
    let resources = common::test_resources().await;
    let registration = common::register_test_client(&resources).await;
    seed_auth_code(&resources, &registration.client_id, "code-ok").await;

    let token = resources
        .provider
        .exchange_code(token_request(
            &registration.client_id,
            &registration.client_secret,
            "code-ok",
        ))
        .await
        .unwrap();

    assert_eq!(token.token_type, "Bearer");

    let credential = resources
        .provider
        .resolve_bearer(&token.access_token)
        .await
        .unwrap();
    assert_eq!(credential.access_token, "secret_notion");
}

#[tokio::test]
async fn test_concurrent_double_spend_has_exactly_one_winner() {
    let resources = common::test_resources().await;
    let registration = common::register_test_client(&resources).await;
    seed_auth_code(&resources, &registration.client_id, "contested").await;

    let first = resources.provider.exchange_code(token_request(
        &registration.client_id,
        &registration.client_secret,
        "contested",
    ));
    let second = resources.provider.exchange_code(token_request(
        &registration.client_id,
        &registration.client_secret,
        "contested",
    ));

    let (first, second) = tokio::join!(first, second);

    let successes = [&first, &second].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1);

    let loser = if first.is_err() { first } else { second };
    assert_eq!(loser.unwrap_err().code, ErrorCode::InvalidGrant);
}

#[tokio::test]
async fn test_revoked_bearer_no_longer_resolves() {
    let resources = common::test_resources().await;
    let registration = common::register_test_client(&resources).await;
    seed_auth_code(&resources, &registration.client_id, "code-rev").await;

    let token = resources
        .provider
        .exchange_code(token_request(
            &registration.client_id,
            &registration.client_secret,
            "code-rev",
        ))
        .await
        .unwrap();

    resources.provider.revoke(&token.access_token).await.unwrap();
    // Revoking again is fine
    resources.provider.revoke(&token.access_token).await.unwrap();

    let error = resources
        .provider
        .resolve_bearer(&token.access_token)
        .await
        .unwrap_err();
    assert_eq!(error.code, ErrorCode::InvalidToken);
}

#[tokio::test]
async fn test_pkce_verifier_is_enforced() {
    let resources = common::test_resources().await;
    let registration = common::register_test_client(&resources).await;

    let upstream = UpstreamToken {
        id: Uuid::new_v4(),
        access_token: "secret_notion".into(),
        workspace_id: None,
        workspace_name: None,
        bot_id: None,
        owner_name: None,
        obtained_at: Utc::now(),
    };
    resources.store.store_upstream_token(&upstream).await.unwrap();

    // Challenge/verifier pair from RFC 7636 appendix B
    resources
        .store
        .store_auth_code(&AuthCode {
            code: "pkce-code".into(),
            client_id: registration.client_id.clone(),
            redirect_uri: common::TEST_REDIRECT_URI.into(),
            upstream_id: upstream.id,
            scope: None,
            code_challenge: Some("E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM".into()),
            created_at: Utc::now(),
            expires_at: Utc::now() + Duration::minutes(5),
        })
        .await
        .unwrap();

    let mut request = token_request(
        &registration.client_id,
        &registration.client_secret,
        "pkce-code",
    );
    request.code_verifier = None;

    let error = resources.provider.exchange_code(request).await.unwrap_err();
    assert_eq!(error.code, ErrorCode::InvalidGrant);
}
