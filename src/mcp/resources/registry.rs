//! Registry Resources
//!
//! `registry://` views: the full catalog, its categories, one block and the
//! export table.

use serde::Serialize;

use crate::catalog::Category;
use crate::mcp::context::ToolContext;
use crate::mcp::protocol::{McpError, ResourceContent};
use crate::mcp::registry::{McpRegistry, RegisteredResource, ResourceBuilder, ResourceResult};
use crate::registry::{find_block, RegistryEntry};
use crate::security::SCOPE_READ;

const BLOCKS_PREFIX: &str = "registry://blocks/";

/// Register registry resources with the registry
pub fn register_resources(registry: &mut McpRegistry) {
    registry.register_resource(catalog_resource());
    registry.register_resource(categories_resource());
    registry.register_resource(block_resource());
    registry.register_resource(export_resource());
}

fn json_content<T: Serialize>(uri: String, value: &T) -> ResourceResult {
    let content =
        ResourceContent::json(uri, value).map_err(|e| McpError::InternalError(e.to_string()))?;
    Ok(vec![content])
}

// ============================================================================
// registry://catalog
// ============================================================================

fn catalog_resource() -> RegisteredResource {
    ResourceBuilder::new("registry://catalog", "Connector Catalog")
        .description("Every registered connector with status, usage, priority and fallback")
        .mime_type("application/json")
        .scope(SCOPE_READ)
        .build(catalog_handler)
}

async fn catalog_handler(ctx: ToolContext, uri: String) -> ResourceResult {
    let entries: Vec<RegistryEntry> = ctx.registry().entries().cloned().collect();
    json_content(uri, &entries)
}

// ============================================================================
// registry://categories
// ============================================================================

#[derive(Debug, Serialize)]
struct CategorySummary {
    category: Category,
    total: usize,
    active: usize,
}

fn categories_resource() -> RegisteredResource {
    ResourceBuilder::new("registry://categories", "Connector Categories")
        .description("Populated categories with their total and active connector counts")
        .mime_type("application/json")
        .scope(SCOPE_READ)
        .build(categories_handler)
}

async fn categories_handler(ctx: ToolContext, uri: String) -> ResourceResult {
    let summaries: Vec<CategorySummary> = {
        let registry = ctx.registry();
        ctx.catalog
            .categories()
            .into_iter()
            .map(|category| {
                let members = registry
                    .entries()
                    .filter(|e| e.descriptor.category == category);
                let (total, active) =
                    members.fold((0, 0), |(t, a), e| (t + 1, a + usize::from(e.is_active())));
                CategorySummary {
                    category,
                    total,
                    active,
                }
            })
            .collect()
    };
    json_content(uri, &summaries)
}

// ============================================================================
// registry://blocks/{block}
// ============================================================================

#[derive(Debug, Serialize)]
struct BlockView {
    block: String,
    patterns: &'static [&'static str],
    connectors: Vec<RegistryEntry>,
}

fn block_resource() -> RegisteredResource {
    ResourceBuilder::new("registry://blocks/{block}", "Connector Block")
        .description("Connectors of one operational block, highest priority first")
        .mime_type("application/json")
        .scope(SCOPE_READ)
        .build(block_handler)
}

async fn block_handler(ctx: ToolContext, uri: String) -> ResourceResult {
    let name = uri.strip_prefix(BLOCKS_PREFIX).unwrap_or_default();

    // An unknown block is an empty view, same as connectors.by_block
    let view = match find_block(name) {
        Some(block) => BlockView {
            block: block.name.to_string(),
            patterns: block.patterns,
            connectors: ctx
                .registry()
                .get_by_block(block.name)
                .into_iter()
                .cloned()
                .collect(),
        },
        None => BlockView {
            block: name.to_string(),
            patterns: &[],
            connectors: Vec::new(),
        },
    };
    json_content(uri, &view)
}

// ============================================================================
// registry://export
// ============================================================================

fn export_resource() -> RegisteredResource {
    ResourceBuilder::new("registry://export", "Registry Export")
        .description("Flattened registry rows for spreadsheets and dashboards")
        .mime_type("application/json")
        .scope(SCOPE_READ)
        .build(export_handler)
}

async fn export_handler(ctx: ToolContext, uri: String) -> ResourceResult {
    let rows = ctx.registry().export();
    json_content(uri, &rows)
}
