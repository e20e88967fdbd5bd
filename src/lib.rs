//! MCP Hub Server Library
//!
//! This library exposes the internal modules for testing and potential reuse.

pub mod catalog;
pub mod config;
pub mod executor;
pub mod mcp;
pub mod registry;
pub mod security;
pub mod server;

// Re-export commonly used types for convenience
pub use catalog::Catalog;
pub use executor::{ConnectorExecutor, SimulatedExecutor};
pub use registry::ConnectorRegistry;
pub use server::{make_app, run_server, RequestsLoggingLevel, ServerConfig};
