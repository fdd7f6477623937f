// ABOUTME: End-to-end OAuth flow over the assembled HTTP router
// ABOUTME: Register, authorize, callback with mocked upstream, exchange, tool call, revoke
//
// SPDX-License-Identifier: MIT OR Apache-2.0
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use notion_mcp_remote::server::build_router;
use serde_json::{json, Value};
use tower::util::ServiceExt;
use wiremock::matchers::{header as mock_header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const HOST: &str = "localhost:8000";

async fn response_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::HOST, HOST)
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::HOST, HOST)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_form(uri: &str, fields: &[(&str, &str)]) -> Request<Body> {
    let body = serde_urlencoded::to_string(fields).unwrap();
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::HOST, HOST)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap()
}

fn jsonrpc(method: &str, params: Value, token: Option<&str>) -> Request<Body> {
    let body = json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": method,
        "params": params,
    });
    let mut builder = Request::builder()
        .method("POST")
        .uri("/mcp")
        .header(header::HOST, HOST)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn location(response: &axum::response::Response) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_owned()
}

/// Mock Notion: token endpoint plus a bot-user endpoint that only answers
/// requests authenticated with the token the exchange handed out
async fn mock_notion() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "secret_live_token",
            "token_type": "bearer",
            "bot_id": "bot-1",
            "workspace_id": "ws-1",
            "workspace_name": "Acme",
            "owner": {"type": "user", "user": {"id": "u1", "name": "Ada"}}
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/users/me"))
        .and(mock_header("authorization", "Bearer secret_live_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "user",
            "id": "u-bot",
            "name": "Acme Integration",
            "type": "bot"
        })))
        .mount(&server)
        .await;

    server
}

async fn router_with_mock(notion: &MockServer) -> Router {
    let resources = common::test_resources_with_upstream(
        &format!("{}/oauth/token", notion.uri()),
        &notion.uri(),
    )
    .await;
    build_router(resources)
}

/// Walk the complete flow and return a usable bearer token
async fn acquire_bearer_token(router: &Router) -> String {
    let registration = response_json(
        router
            .clone()
            .oneshot(post_json(
                "/oauth/register",
                &json!({
                    "redirect_uris": [common::TEST_REDIRECT_URI],
                    "client_name": "E2E Client"
                }),
            ))
            .await
            .unwrap(),
    )
    .await;
    let client_id = registration["client_id"].as_str().unwrap().to_owned();
    let client_secret = registration["client_secret"].as_str().unwrap().to_owned();

    // Authorize: expect a redirect to the upstream authorize URL carrying
    // a fresh state nonce
    let authorize_uri = format!(
        "/oauth/authorize?response_type=code&client_id={client_id}&redirect_uri={}&state=caller-state",
        urlencoding::encode(common::TEST_REDIRECT_URI)
    );
    let response = router.clone().oneshot(get(&authorize_uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    let nonce = common::query_param(&location(&response), "state").unwrap();

    // Upstream callback: exchange happens against the mock, the browser is
    // sent back to the client's redirect URI with a proxy code
    let response = router
        .clone()
        .oneshot(get(&format!(
            "/oauth/callback?code=upstream-code&state={nonce}"
        )))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    let callback_location = location(&response);
    assert!(callback_location.starts_with(common::TEST_REDIRECT_URI));
    assert_eq!(
        common::query_param(&callback_location, "state").as_deref(),
        Some("caller-state")
    );
    let code = common::query_param(&callback_location, "code").unwrap();

    // Token exchange
    let response = router
        .clone()
        .oneshot(post_form(
            "/oauth/token",
            &[
                ("grant_type", "authorization_code"),
                ("code", &code),
                ("redirect_uri", common::TEST_REDIRECT_URI),
                ("client_id", &client_id),
                ("client_secret", &client_secret),
            ],
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let token_body = response_json(response).await;
    assert_eq!(token_body["token_type"], "Bearer");

    token_body["access_token"].as_str().unwrap().to_owned()
}

#[tokio::test]
async fn test_discovery_metadata_lists_endpoints() {
    let notion = mock_notion().await;
    let router = router_with_mock(&notion).await;

    let response = router
        .oneshot(get("/.well-known/oauth-authorization-server"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert_eq!(body["issuer"], "http://localhost:8000");
    assert_eq!(
        body["token_endpoint"],
        "http://localhost:8000/oauth/token"
    );
    assert_eq!(body["code_challenge_methods_supported"][0], "S256");
}

#[tokio::test]
async fn test_health_is_open() {
    let notion = mock_notion().await;
    let router = router_with_mock(&notion).await;

    let response = router.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_host_is_rejected() {
    let notion = mock_notion().await;
    let router = router_with_mock(&notion).await;

    let request = Request::builder()
        .uri("/health")
        .header(header::HOST, "evil.example.com")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_mcp_requires_bearer_token() {
    let notion = mock_notion().await;
    let router = router_with_mock(&notion).await;

    let response = router
        .oneshot(jsonrpc("tools/list", json!({}), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_full_flow_tool_call_uses_connected_credential() {
    let notion = mock_notion().await;
    let router = router_with_mock(&notion).await;

    let bearer = acquire_bearer_token(&router).await;

    // tools/list works once authenticated
    let response = router
        .clone()
        .oneshot(jsonrpc("tools/list", json!({}), Some(&bearer)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    let tools = body["result"]["tools"].as_array().unwrap();
    assert!(tools
        .iter()
        .any(|tool| tool["name"] == "notion_retrieve_bot_user"));

    // The tool call reaches the mock Notion API with the exchanged token;
    // the mock only matches that exact Authorization header
    let response = router
        .clone()
        .oneshot(jsonrpc(
            "tools/call",
            json!({"name": "notion_retrieve_bot_user", "arguments": {}}),
            Some(&bearer),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["result"]["isError"], false);
    let text = body["result"]["content"][0]["text"].as_str().unwrap();
    assert!(text.contains("Acme Integration"));
}

#[tokio::test]
async fn test_tool_errors_are_in_band_results() {
    let notion = mock_notion().await;
    let router = router_with_mock(&notion).await;

    let bearer = acquire_bearer_token(&router).await;

    // Missing required argument: the protocol call succeeds, the tool
    // result carries the failure
    let response = router
        .clone()
        .oneshot(jsonrpc(
            "tools/call",
            json!({"name": "notion_retrieve_page", "arguments": {}}),
            Some(&bearer),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["result"]["isError"], true);
    let text = body["result"]["content"][0]["text"].as_str().unwrap();
    assert!(text.contains("page_id"));
}

#[tokio::test]
async fn test_proxy_code_is_single_use_over_http() {
    let notion = mock_notion().await;
    let router = router_with_mock(&notion).await;

    // Walk the flow manually so we can replay the code
    let registration = response_json(
        router
            .clone()
            .oneshot(post_json(
                "/oauth/register",
                &json!({"redirect_uris": [common::TEST_REDIRECT_URI]}),
            ))
            .await
            .unwrap(),
    )
    .await;
    let client_id = registration["client_id"].as_str().unwrap();
    let client_secret = registration["client_secret"].as_str().unwrap();

    let authorize_uri = format!(
        "/oauth/authorize?response_type=code&client_id={client_id}&redirect_uri={}",
        urlencoding::encode(common::TEST_REDIRECT_URI)
    );
    let response = router.clone().oneshot(get(&authorize_uri)).await.unwrap();
    let nonce = common::query_param(&location(&response), "state").unwrap();

    let response = router
        .clone()
        .oneshot(get(&format!(
            "/oauth/callback?code=upstream-code&state={nonce}"
        )))
        .await
        .unwrap();
    let code = common::query_param(&location(&response), "code").unwrap();

    let form = [
        ("grant_type", "authorization_code"),
        ("code", code.as_str()),
        ("redirect_uri", common::TEST_REDIRECT_URI),
        ("client_id", client_id),
        ("client_secret", client_secret),
    ];

    let first = router
        .clone()
        .oneshot(post_form("/oauth/token", &form))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = router
        .clone()
        .oneshot(post_form("/oauth/token", &form))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::BAD_REQUEST);
    let body = response_json(second).await;
    assert_eq!(body["error"], "invalid_grant");
}

#[tokio::test]
async fn test_revocation_cuts_off_access() {
    let notion = mock_notion().await;
    let router = router_with_mock(&notion).await;

    let bearer = acquire_bearer_token(&router).await;

    let response = router
        .clone()
        .oneshot(post_form("/oauth/revoke", &[("token", bearer.as_str())]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = router
        .clone()
        .oneshot(jsonrpc("tools/list", json!({}), Some(&bearer)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unsupported_grant_type_error_shape() {
    let notion = mock_notion().await;
    let router = router_with_mock(&notion).await;

    let response = router
        .oneshot(post_form(
            "/oauth/token",
            &[
                ("grant_type", "client_credentials"),
                ("client_id", "x"),
                ("client_secret", "y"),
            ],
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(body["error"], "unsupported_grant_type");
}
