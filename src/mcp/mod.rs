//! MCP (Model Context Protocol) Server
//!
//! Exposes the connector catalog and registry to MCP clients as tools and
//! resources.
//!
//! ## Architecture
//!
//! - Transport: JSON-RPC over `POST /v1/mcp`, or one message per text frame
//!   on the WebSocket at `/v1/mcp/ws`
//! - Auth: The security gate in front of `/v1` (API key, bearer, OAuth)
//! - Tools: Scope-gated (`read` / `write`)
//! - Resources: Read-only registry views under `registry://`
//! - Prompts: `setup_connector`, a configuration guide for one connector

pub mod context;
pub mod handler;
pub mod prompts;
pub mod protocol;
pub mod registry;
pub mod resources;
pub mod tools;

pub use handler::{
    create_mcp_state, mcp_http_handler, mcp_ws_handler, process_message, McpState,
};
pub use protocol::{McpError, McpRequest, McpResponse};
pub use registry::McpRegistry;
