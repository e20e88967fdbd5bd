//! Connector Tools
//!
//! Read-only queries over the catalog and the registry.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::catalog::{Category, SearchHit};
use crate::mcp::context::ToolContext;
use crate::mcp::protocol::{McpError, ToolsCallResult};
use crate::mcp::registry::{McpRegistry, RegisteredTool, ToolBuilder, ToolName, ToolResult};
use crate::registry::{block_names, RegistryEntry};
use crate::security::SCOPE_READ;

/// Register connector tools with the registry
pub fn register_tools(registry: &mut McpRegistry) {
    registry.register_tool(list_tool());
    registry.register_tool(search_tool());
    registry.register_tool(stats_tool());
    registry.register_tool(by_block_tool());
    registry.register_tool(get_tool());
}

fn parse_params<T: serde::de::DeserializeOwned>(params: Value) -> Result<T, McpError> {
    serde_json::from_value(params).map_err(|e| McpError::InvalidParams(e.to_string()))
}

fn parse_category(raw: Option<&str>) -> Result<Option<Category>, McpError> {
    raw.map(|c| {
        c.parse::<Category>()
            .map_err(|e| McpError::InvalidParams(e.to_string()))
    })
    .transpose()
}

fn to_result<T: Serialize>(value: &T) -> ToolResult {
    ToolsCallResult::json(value).map_err(|e| McpError::InternalError(e.to_string()))
}

// ============================================================================
// connectors.list
// ============================================================================

#[derive(Debug, Deserialize, Default)]
struct ListParams {
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    search: Option<String>,
    #[serde(default)]
    tag: Option<String>,
}

#[derive(Debug, Serialize)]
struct ListResult {
    total: usize,
    categories: Vec<Category>,
    connectors: Vec<RegistryEntry>,
}

fn list_tool() -> RegisteredTool {
    ToolBuilder::new(ToolName::ConnectorsList)
        .description("List registered connectors with their status, usage and priority")
        .input_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "category": {
                    "type": "string",
                    "description": "Only connectors of this category",
                    "enum": Category::ALL.iter().map(|c| c.as_str()).collect::<Vec<_>>()
                },
                "search": {
                    "type": "string",
                    "description": "Case-insensitive substring of id, name or description"
                },
                "tag": {
                    "type": "string",
                    "description": "Only connectors carrying this tag"
                }
            }
        }))
        .scope(SCOPE_READ)
        .build(list_handler)
}

async fn list_handler(ctx: ToolContext, params: Value) -> ToolResult {
    let params: ListParams = parse_params(params)?;
    let category = parse_category(params.category.as_deref())?;
    let search = params.search.map(|s| s.trim().to_lowercase());

    let connectors: Vec<RegistryEntry> = ctx
        .registry()
        .entries()
        .filter(|e| category.map_or(true, |c| e.descriptor.category == c))
        .filter(|e| {
            search.as_deref().map_or(true, |term| {
                e.id().to_lowercase().contains(term)
                    || e.name().to_lowercase().contains(term)
                    || e.descriptor.description.to_lowercase().contains(term)
            })
        })
        .filter(|e| {
            params
                .tag
                .as_deref()
                .map_or(true, |tag| e.tags.iter().any(|t| t == tag))
        })
        .cloned()
        .collect();

    to_result(&ListResult {
        total: connectors.len(),
        categories: ctx.catalog.categories(),
        connectors,
    })
}

// ============================================================================
// connectors.search
// ============================================================================

#[derive(Debug, Deserialize)]
struct SearchParams {
    query: String,
    #[serde(default)]
    category: Option<String>,
}

#[derive(Debug, Serialize)]
struct SearchResult {
    query: String,
    total: usize,
    results: Vec<SearchHit>,
}

fn search_tool() -> RegisteredTool {
    ToolBuilder::new(ToolName::ConnectorsSearch)
        .description("Search the connector catalog, best matches first")
        .input_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Search term"
                },
                "category": {
                    "type": "string",
                    "description": "Restrict results to one category"
                }
            },
            "required": ["query"]
        }))
        .scope(SCOPE_READ)
        .build(search_handler)
}

async fn search_handler(ctx: ToolContext, params: Value) -> ToolResult {
    let params: SearchParams = parse_params(params)?;
    let category = parse_category(params.category.as_deref())?;
    let results = ctx.catalog.search(&params.query, category);

    to_result(&SearchResult {
        total: results.len(),
        query: params.query,
        results,
    })
}

// ============================================================================
// connectors.stats
// ============================================================================

#[derive(Debug, Serialize)]
struct StatsResult {
    total: usize,
    active: usize,
    official: usize,
    featured: usize,
    by_category: BTreeMap<&'static str, usize>,
    by_status: BTreeMap<&'static str, usize>,
}

fn stats_tool() -> RegisteredTool {
    ToolBuilder::new(ToolName::ConnectorsStats)
        .description("Connector counts by category and status")
        .scope(SCOPE_READ)
        .build(stats_handler)
}

async fn stats_handler(ctx: ToolContext, _params: Value) -> ToolResult {
    let stats = {
        let registry = ctx.registry();
        let mut by_category = BTreeMap::new();
        let mut active = 0;
        let mut official = 0;
        let mut featured = 0;
        for entry in registry.entries() {
            *by_category
                .entry(entry.descriptor.category.as_str())
                .or_insert(0) += 1;
            active += usize::from(entry.is_active());
            official += usize::from(entry.descriptor.official);
            featured += usize::from(entry.descriptor.featured);
        }
        StatsResult {
            total: registry.len(),
            active,
            official,
            featured,
            by_category,
            by_status: registry.status_counts(),
        }
    };
    to_result(&stats)
}

// ============================================================================
// connectors.by_block
// ============================================================================

#[derive(Debug, Deserialize, Default)]
struct ByBlockParams {
    #[serde(default)]
    block: Option<String>,
}

fn by_block_tool() -> RegisteredTool {
    ToolBuilder::new(ToolName::ConnectorsByBlock)
        .description(
            "Connectors grouped by operational block, highest priority first. \
             Blocks match on connector id substrings.",
        )
        .input_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "block": {
                    "type": "string",
                    "description": "Block name; all blocks when omitted",
                    "enum": block_names().collect::<Vec<_>>()
                }
            }
        }))
        .scope(SCOPE_READ)
        .build(by_block_handler)
}

async fn by_block_handler(ctx: ToolContext, params: Value) -> ToolResult {
    let params: ByBlockParams = parse_params(params)?;
    let registry = ctx.registry();

    let value = match params.block {
        Some(block) => {
            let connectors: Vec<&RegistryEntry> = registry.get_by_block(&block);
            serde_json::json!({ "block": block, "connectors": connectors })
        }
        None => {
            let blocks: serde_json::Map<String, Value> = block_names()
                .map(|name| {
                    let members = serde_json::to_value(registry.get_by_block(name))
                        .unwrap_or(Value::Null);
                    (name.to_string(), members)
                })
                .collect();
            serde_json::json!({ "blocks": blocks })
        }
    };
    drop(registry);

    to_result(&value)
}

// ============================================================================
// connectors.get
// ============================================================================

#[derive(Debug, Deserialize)]
struct GetParams {
    connector_id: String,
}

#[derive(Debug, Serialize)]
struct GetResult {
    connector: Option<RegistryEntry>,
    fallback: Option<RegistryEntry>,
}

fn get_tool() -> RegisteredTool {
    ToolBuilder::new(ToolName::ConnectorsGet)
        .description("Get one connector together with its resolved fallback")
        .input_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "connector_id": {
                    "type": "string",
                    "description": "Connector id, e.g. @modelcontextprotocol/postgres"
                }
            },
            "required": ["connector_id"]
        }))
        .scope(SCOPE_READ)
        .build(get_handler)
}

async fn get_handler(ctx: ToolContext, params: Value) -> ToolResult {
    let params: GetParams = parse_params(params)?;
    let result = {
        let registry = ctx.registry();
        let pair = registry.get_with_fallback(&params.connector_id);
        GetResult {
            connector: pair.primary.cloned(),
            fallback: pair.fallback.cloned(),
        }
    };
    to_result(&result)
}
