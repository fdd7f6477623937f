// ABOUTME: MCP protocol surface
// ABOUTME: Tool registry plus the JSON-RPC endpoint that exposes it
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # MCP Surface
//!
//! The calling platform speaks JSON-RPC 2.0 over a single POST endpoint.
//! Tools are registered once at startup into a [`ToolRegistry`]; the
//! endpoint dispatches `tools/list` and `tools/call` against it.

pub mod registry;
pub mod routes;

pub use registry::{Tool, ToolRegistry};
