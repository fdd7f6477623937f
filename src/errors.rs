// ABOUTME: Unified error handling with standard error codes and HTTP responses
// ABOUTME: Defines the error taxonomy shared by the OAuth proxy, store, and routes
//
// SPDX-License-Identifier: MIT OR Apache-2.0

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Standard error codes used throughout the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // OAuth authorization flow (1000-1999)
    #[serde(rename = "INVALID_CLIENT")]
    InvalidClient = 1000,
    #[serde(rename = "INVALID_REDIRECT")]
    InvalidRedirect = 1001,
    #[serde(rename = "INVALID_GRANT")]
    InvalidGrant = 1002,
    #[serde(rename = "INVALID_TOKEN")]
    InvalidToken = 1003,
    #[serde(rename = "UPSTREAM_EXCHANGE_FAILED")]
    UpstreamExchange = 1004,

    // Validation (3000-3999)
    #[serde(rename = "INVALID_INPUT")]
    InvalidInput = 3000,

    // Internal (9000-9999)
    #[serde(rename = "DECRYPTION_FAILED")]
    Decryption = 9000,
    #[serde(rename = "STORAGE_ERROR")]
    Storage = 9001,
    #[serde(rename = "CONFIG_ERROR")]
    Config = 9002,
    #[serde(rename = "INTERNAL_ERROR")]
    Internal = 9003,
}

impl ErrorCode {
    /// Get the HTTP status code for this error
    #[must_use]
    pub fn http_status(self) -> StatusCode {
        match self {
            Self::InvalidToken => StatusCode::UNAUTHORIZED,
            Self::InvalidClient
            | Self::InvalidRedirect
            | Self::InvalidGrant
            | Self::InvalidInput => StatusCode::BAD_REQUEST,
            Self::UpstreamExchange => StatusCode::BAD_GATEWAY,
            Self::Decryption | Self::Storage | Self::Config | Self::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// RFC 6749 error code for OAuth endpoint responses
    #[must_use]
    pub fn oauth_error_code(self) -> &'static str {
        match self {
            Self::InvalidClient => "invalid_client",
            Self::InvalidRedirect | Self::InvalidInput => "invalid_request",
            Self::InvalidGrant => "invalid_grant",
            Self::InvalidToken => "invalid_token",
            Self::UpstreamExchange
            | Self::Decryption
            | Self::Storage
            | Self::Config
            | Self::Internal => "server_error",
        }
    }

    /// User-facing description of this error
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::InvalidClient => "Client authentication failed",
            Self::InvalidRedirect => "Redirect URI does not match the client registration",
            Self::InvalidGrant => "Authorization grant is invalid, expired, or already used",
            Self::InvalidToken => "Bearer token is unknown or revoked",
            Self::UpstreamExchange => "Upstream token exchange failed",
            Self::InvalidInput => "The provided input is invalid",
            Self::Decryption => "Stored record could not be decrypted with the current secret",
            Self::Storage => "Storage operation failed",
            Self::Config => "Configuration error",
            Self::Internal => "An internal server error occurred",
        }
    }
}

/// Unified error type for the application
#[derive(Debug, Error)]
pub struct AppError {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Source error for error chaining
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new error with the given code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Attach a source error for chaining
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Get the HTTP status code for this error
    #[must_use]
    pub fn http_status(&self) -> StatusCode {
        self.code.http_status()
    }

    /// Unknown or mismatched client credentials
    pub fn invalid_client(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidClient, message)
    }

    /// Redirect URI not registered for the client
    pub fn invalid_redirect(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRedirect, message)
    }

    /// Bad, expired, or consumed authorization code
    pub fn invalid_grant(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidGrant, message)
    }

    /// Unknown or revoked bearer token
    pub fn invalid_token(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidToken, message)
    }

    /// Upstream token endpoint rejected the exchange
    pub fn upstream_exchange(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::UpstreamExchange, message)
    }

    /// Record present but unreadable with the current secret
    pub fn decryption(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Decryption, message)
    }

    /// Storage operation failure
    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Storage, message)
    }

    /// Configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Config, message)
    }

    /// Invalid input
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Internal server error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, message)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.description(), self.message)
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

/// HTTP error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error payload
    pub error: ErrorResponseDetails,
}

/// Details of an HTTP error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponseDetails {
    /// Machine-readable error code
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
}

impl From<&AppError> for ErrorResponse {
    fn from(error: &AppError) -> Self {
        Self {
            error: ErrorResponseDetails {
                code: error.code,
                message: error.message.clone(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.http_status();
        if status.is_server_error() {
            tracing::error!(code = ?self.code, "request failed: {}", self.message);
        }
        (status, Json(ErrorResponse::from(&self))).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::new(ErrorCode::Internal, error.to_string())
    }
}

impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> Self {
        let message = error.to_string();
        Self::storage(message).with_source(error)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        let message = format!("record serialization failed: {error}");
        Self::storage(message).with_source(error)
    }
}
