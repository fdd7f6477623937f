// ABOUTME: Server binary entry point
// ABOUTME: Loads environment configuration, initializes logging, and runs the HTTP server
//
// SPDX-License-Identifier: MIT OR Apache-2.0

use anyhow::Result;
use notion_mcp_remote::{config::ServerConfig, logging, server};

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_from_env()?;

    let config = ServerConfig::from_env()?;
    server::run_server(config).await
}
