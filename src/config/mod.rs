// ABOUTME: Configuration management for the OAuth proxy server
// ABOUTME: Environment-driven configuration with typed sections and validation
//
// SPDX-License-Identifier: MIT OR Apache-2.0

pub mod environment;

pub use environment::{
    HttpConfig, SecurityConfig, ServerConfig, StorageConfig, UpstreamOAuthConfig,
};
