//! Registry Lifecycle Tools
//!
//! Health checks, optimization sweeps and usage feedback.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::mcp::context::ToolContext;
use crate::mcp::protocol::{McpError, ToolsCallResult};
use crate::mcp::registry::{McpRegistry, RegisteredTool, ToolBuilder, ToolName, ToolResult};
use crate::registry::RegistryEntry;
use crate::security::{SCOPE_READ, SCOPE_WRITE};
use crate::server::metrics;

/// Default look-back window of `registry.unused`, in days
pub const DEFAULT_UNUSED_DAYS: u32 = 30;

/// Register lifecycle tools with the registry
pub fn register_tools(registry: &mut McpRegistry) {
    registry.register_tool(validate_tool());
    registry.register_tool(optimize_tool());
    registry.register_tool(report_usage_tool());
    registry.register_tool(unused_tool());
    registry.register_tool(export_tool());
}

fn to_result<T: Serialize>(value: &T) -> ToolResult {
    ToolsCallResult::json(value).map_err(|e| McpError::InternalError(e.to_string()))
}

// ============================================================================
// registry.validate
// ============================================================================

fn validate_tool() -> RegisteredTool {
    ToolBuilder::new(ToolName::RegistryValidate)
        .description(
            "Check that every critical block has at least two active connectors \
             and that no active connector has an error rate above 30%",
        )
        .scope(SCOPE_READ)
        .build(validate_handler)
}

async fn validate_handler(ctx: ToolContext, _params: Value) -> ToolResult {
    let report = ctx.registry().validate();
    to_result(&report)
}

// ============================================================================
// registry.optimize
// ============================================================================

fn optimize_tool() -> RegisteredTool {
    ToolBuilder::new(ToolName::RegistryOptimize)
        .description("Deactivate active connectors that have not been used in 60 days")
        .scope(SCOPE_WRITE)
        .build(optimize_handler)
}

async fn optimize_handler(ctx: ToolContext, _params: Value) -> ToolResult {
    let report = {
        let mut registry = ctx.registry();
        let report = registry.optimize();
        metrics::set_connector_status_counts(&registry.status_counts());
        report
    };
    info!(
        "Optimization requested by {} deactivated {} connectors",
        ctx.session.subject, report.deactivated
    );
    to_result(&report)
}

// ============================================================================
// registry.report_usage
// ============================================================================

#[derive(Debug, Deserialize)]
struct ReportUsageParams {
    connector_id: String,
    success: bool,
}

#[derive(Debug, Serialize)]
struct ReportUsageResult {
    success: bool,
    recorded: bool,
}

fn report_usage_tool() -> RegisteredTool {
    ToolBuilder::new(ToolName::RegistryReportUsage)
        .description("Report the outcome of a connector call to update its health statistics")
        .input_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "connector_id": {
                    "type": "string",
                    "description": "Connector id"
                },
                "success": {
                    "type": "boolean",
                    "description": "Whether the call succeeded"
                }
            },
            "required": ["connector_id", "success"]
        }))
        .scope(SCOPE_WRITE)
        .build(report_usage_handler)
}

async fn report_usage_handler(ctx: ToolContext, params: Value) -> ToolResult {
    let params: ReportUsageParams =
        serde_json::from_value(params).map_err(|e| McpError::InvalidParams(e.to_string()))?;

    let recorded = record_usage(&ctx, &params.connector_id, params.success);
    to_result(&ReportUsageResult {
        success: true,
        recorded,
    })
}

/// Feeds one call outcome into the registry and the metrics.
pub(super) fn record_usage(ctx: &ToolContext, connector_id: &str, success: bool) -> bool {
    let mut registry = ctx.registry();
    let recorded = registry.record_usage(connector_id, success);
    if recorded {
        metrics::record_usage_report(success);
        metrics::set_connector_status_counts(&registry.status_counts());
    } else {
        debug!("Ignoring usage report for unknown connector {}", connector_id);
    }
    recorded
}

// ============================================================================
// registry.unused
// ============================================================================

#[derive(Debug, Deserialize)]
struct UnusedParams {
    #[serde(default = "default_unused_days")]
    days: u32,
}

fn default_unused_days() -> u32 {
    DEFAULT_UNUSED_DAYS
}

#[derive(Debug, Serialize)]
struct UnusedResult {
    days: u32,
    count: usize,
    connectors: Vec<RegistryEntry>,
}

fn unused_tool() -> RegisteredTool {
    ToolBuilder::new(ToolName::RegistryUnused)
        .description("Active connectors never used, or not used within the given number of days")
        .input_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "days": {
                    "type": "integer",
                    "description": "Look-back window in days (default 30)",
                    "minimum": 0
                }
            }
        }))
        .scope(SCOPE_READ)
        .build(unused_handler)
}

async fn unused_handler(ctx: ToolContext, params: Value) -> ToolResult {
    let params: UnusedParams =
        serde_json::from_value(params).map_err(|e| McpError::InvalidParams(e.to_string()))?;

    let connectors: Vec<RegistryEntry> = ctx
        .registry()
        .get_unused(params.days)
        .into_iter()
        .cloned()
        .collect();

    to_result(&UnusedResult {
        days: params.days,
        count: connectors.len(),
        connectors,
    })
}

// ============================================================================
// registry.export
// ============================================================================

fn export_tool() -> RegisteredTool {
    ToolBuilder::new(ToolName::RegistryExport)
        .description("Flattened, spreadsheet-friendly rows of the whole registry")
        .scope(SCOPE_READ)
        .build(export_handler)
}

async fn export_handler(ctx: ToolContext, _params: Value) -> ToolResult {
    let rows = ctx.registry().export();
    to_result(&rows)
}
