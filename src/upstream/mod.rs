// ABOUTME: Upstream Notion OAuth client for the server-to-server half of the proxy flow
// ABOUTME: Builds the authorize redirect URL and exchanges callback codes for access tokens
//
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::config::UpstreamOAuthConfig;
use crate::errors::{AppError, AppResult};
use crate::oauth2::models::UpstreamToken;
use base64::{engine::general_purpose, Engine as _};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

/// Notion token response format
#[derive(Debug, Deserialize)]
struct NotionTokenResponse {
    access_token: String,
    #[serde(default)]
    bot_id: Option<String>,
    #[serde(default)]
    workspace_id: Option<String>,
    #[serde(default)]
    workspace_name: Option<String>,
    #[serde(default)]
    owner: Option<NotionOwner>,
}

#[derive(Debug, Deserialize)]
struct NotionOwner {
    #[serde(default)]
    user: Option<NotionOwnerUser>,
}

#[derive(Debug, Deserialize)]
struct NotionOwnerUser {
    #[serde(default)]
    name: Option<String>,
}

/// Client for the upstream Notion OAuth endpoints
pub struct NotionOAuthClient {
    config: UpstreamOAuthConfig,
    callback_url: String,
    http: reqwest::Client,
}

impl NotionOAuthClient {
    /// Create a client from upstream configuration and this server's
    /// callback URL
    #[must_use]
    pub fn new(config: UpstreamOAuthConfig, callback_url: String) -> Self {
        Self {
            config,
            callback_url,
            http: reqwest::Client::new(),
        }
    }

    /// Build the upstream authorization URL the end user is redirected to.
    ///
    /// Embeds this server's callback as the upstream redirect target and the
    /// given state nonce so the callback can resume the original flow.
    #[must_use]
    pub fn authorize_url(&self, state: &str) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&owner=user&state={}",
            self.config.authorize_url,
            urlencoding::encode(&self.config.client_id),
            urlencoding::encode(&self.callback_url),
            urlencoding::encode(state)
        )
    }

    /// Exchange an upstream authorization code for an access token.
    ///
    /// Notion expects a JSON body with HTTP Basic client authentication.
    ///
    /// # Errors
    ///
    /// Returns `UpstreamExchange` if the request fails or the upstream
    /// rejects the code; a token is never fabricated.
    pub async fn exchange_code(&self, code: &str) -> AppResult<UpstreamToken> {
        let basic = general_purpose::STANDARD.encode(format!(
            "{}:{}",
            self.config.client_id, self.config.client_secret
        ));

        let response = self
            .http
            .post(&self.config.token_url)
            .header("Authorization", format!("Basic {basic}"))
            .json(&serde_json::json!({
                "grant_type": "authorization_code",
                "code": code,
                "redirect_uri": self.callback_url,
            }))
            .send()
            .await
            .map_err(|e| AppError::upstream_exchange(format!("token request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::upstream_exchange(format!("token response unreadable: {e}")))?;

        if !status.is_success() {
            tracing::error!("upstream token exchange failed: {status} {body}");
            return Err(AppError::upstream_exchange(format!(
                "upstream rejected the code exchange ({status})"
            )));
        }

        let parsed: NotionTokenResponse = serde_json::from_str(&body)
            .map_err(|e| AppError::upstream_exchange(format!("token response parse error: {e}")))?;

        Ok(UpstreamToken {
            id: Uuid::new_v4(),
            access_token: parsed.access_token,
            workspace_id: parsed.workspace_id,
            workspace_name: parsed.workspace_name,
            bot_id: parsed.bot_id,
            owner_name: parsed.owner.and_then(|o| o.user).and_then(|u| u.name),
            obtained_at: Utc::now(),
        })
    }
}
