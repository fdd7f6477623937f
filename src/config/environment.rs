// ABOUTME: Environment configuration management for deployment-specific settings
// ABOUTME: Parses environment variables into typed configuration sections
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Environment-based configuration management for production deployment

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use url::Url;

/// Default Notion OAuth endpoints
pub const NOTION_AUTHORIZE_URL: &str = "https://api.notion.com/v1/oauth/authorize";
/// Default Notion token endpoint
pub const NOTION_TOKEN_URL: &str = "https://api.notion.com/v1/oauth/token";
/// Default Notion REST API root
pub const NOTION_API_URL: &str = "https://api.notion.com/v1";

/// HTTP listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Bind address
    pub host: String,
    /// Listen port
    pub port: u16,
}

/// Upstream OAuth application credentials and endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamOAuthConfig {
    /// OAuth client id issued by the upstream service
    pub client_id: String,
    /// OAuth client secret issued by the upstream service
    pub client_secret: String,
    /// Upstream authorization endpoint (browser redirect target)
    pub authorize_url: String,
    /// Upstream token endpoint (server-to-server code exchange)
    pub token_url: String,
    /// Upstream REST API root used by tool handlers
    pub api_url: String,
}

/// Storage backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Database URL (`sqlite:data/tokens.db` or `sqlite::memory:`)
    pub database_url: String,
}

/// Security-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Symmetric secret for at-rest record encryption
    pub session_secret: String,
    /// Extra Host header values accepted besides the base URL host
    pub additional_allowed_hosts: Vec<String>,
}

/// Complete server configuration loaded from the environment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Public base URL used to compute callback and discovery URLs
    pub base_url: String,
    /// HTTP listener settings
    pub http: HttpConfig,
    /// Upstream OAuth settings
    pub upstream: UpstreamOAuthConfig,
    /// Storage settings
    pub storage: StorageConfig,
    /// Security settings
    pub security: SecurityConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or malformed
    pub fn from_env() -> Result<Self> {
        let base_url = env::var("BASE_URL").unwrap_or_else(|_| "http://localhost:8000".into());
        let base_url = base_url.trim_end_matches('/').to_owned();

        let port = env::var("PORT")
            .unwrap_or_else(|_| "8000".into())
            .parse::<u16>()
            .context("PORT must be a valid port number")?;

        let config = Self {
            base_url,
            http: HttpConfig {
                host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".into()),
                port,
            },
            upstream: UpstreamOAuthConfig {
                client_id: env::var("NOTION_OAUTH_CLIENT_ID")
                    .context("NOTION_OAUTH_CLIENT_ID must be set")?,
                client_secret: env::var("NOTION_OAUTH_CLIENT_SECRET")
                    .context("NOTION_OAUTH_CLIENT_SECRET must be set")?,
                authorize_url: env::var("NOTION_AUTHORIZE_URL")
                    .unwrap_or_else(|_| NOTION_AUTHORIZE_URL.into()),
                token_url: env::var("NOTION_TOKEN_URL")
                    .unwrap_or_else(|_| NOTION_TOKEN_URL.into()),
                api_url: env::var("NOTION_API_URL").unwrap_or_else(|_| NOTION_API_URL.into()),
            },
            storage: StorageConfig {
                database_url: env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "sqlite:data/tokens.db".into()),
            },
            security: SecurityConfig {
                session_secret: env::var("SESSION_SECRET").context("SESSION_SECRET must be set")?,
                additional_allowed_hosts: env::var("ADDITIONAL_ALLOWED_HOSTS")
                    .unwrap_or_default()
                    .split(',')
                    .map(str::trim)
                    .filter(|h| !h.is_empty())
                    .map(ToOwned::to_owned)
                    .collect(),
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate cross-field constraints
    fn validate(&self) -> Result<()> {
        Url::parse(&self.base_url).context("BASE_URL must be a valid URL")?;
        anyhow::ensure!(
            self.security.session_secret.len() >= 16,
            "SESSION_SECRET must be at least 16 characters"
        );
        Ok(())
    }

    /// This server's upstream OAuth callback URL
    #[must_use]
    pub fn callback_url(&self) -> String {
        format!("{}/oauth/callback", self.base_url)
    }

    /// Host values accepted on inbound requests
    ///
    /// The base URL's host (with and without its explicit port) plus any
    /// additionally configured hosts. Requests with any other Host header
    /// are rejected before routing.
    #[must_use]
    pub fn allowed_hosts(&self) -> Vec<String> {
        let mut hosts = Vec::new();
        if let Ok(url) = Url::parse(&self.base_url) {
            if let Some(host) = url.host_str() {
                hosts.push(host.to_owned());
                if let Some(port) = url.port() {
                    hosts.push(format!("{host}:{port}"));
                }
            }
        }
        // Local bind address is always acceptable for health probes
        hosts.push(format!("{}:{}", self.http.host, self.http.port));
        hosts.extend(self.security.additional_allowed_hosts.iter().cloned());
        hosts
    }

    /// One-line startup summary safe for logs (no secrets)
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "base_url={} listen={}:{} storage={} upstream_client_id={}",
            self.base_url,
            self.http.host,
            self.http.port,
            self.storage.database_url,
            self.upstream.client_id
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    fn test_config() -> ServerConfig {
        ServerConfig {
            base_url: "https://mcp.example.com".into(),
            http: HttpConfig {
                host: "127.0.0.1".into(),
                port: 8000,
            },
            upstream: UpstreamOAuthConfig {
                client_id: "cid".into(),
                client_secret: "csecret".into(),
                authorize_url: NOTION_AUTHORIZE_URL.into(),
                token_url: NOTION_TOKEN_URL.into(),
                api_url: NOTION_API_URL.into(),
            },
            storage: StorageConfig {
                database_url: "sqlite::memory:".into(),
            },
            security: SecurityConfig {
                session_secret: "0123456789abcdef".into(),
                additional_allowed_hosts: vec!["alt.example.com".into()],
            },
        }
    }

    #[test]
    fn test_callback_url() {
        let config = test_config();
        assert_eq!(config.callback_url(), "https://mcp.example.com/oauth/callback");
    }

    #[test]
    fn test_allowed_hosts_include_base_and_extras() {
        let hosts = test_config().allowed_hosts();
        assert!(hosts.contains(&"mcp.example.com".to_owned()));
        assert!(hosts.contains(&"alt.example.com".to_owned()));
        assert!(hosts.contains(&"127.0.0.1:8000".to_owned()));
    }

    #[test]
    fn test_summary_has_no_secrets() {
        let config = test_config();
        let summary = config.summary();
        assert!(!summary.contains("csecret"));
        assert!(!summary.contains("0123456789abcdef"));
    }
}
