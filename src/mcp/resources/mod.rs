//! MCP Resources
//!
//! Read-only JSON views of the catalog and the registry.

pub mod registry;

use super::registry::McpRegistry;

/// Register all resources with the registry
pub fn register_all_resources(registry: &mut McpRegistry) {
    registry::register_resources(registry);
}
