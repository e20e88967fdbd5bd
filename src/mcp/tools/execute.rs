//! connectors.execute
//!
//! Hands a tool call to the configured executor and records the outcome as
//! connector usage.

use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use super::lifecycle::record_usage;
use crate::mcp::context::ToolContext;
use crate::mcp::protocol::{McpError, ToolsCallResult};
use crate::mcp::registry::{McpRegistry, RegisteredTool, ToolBuilder, ToolName, ToolResult};
use crate::security::SCOPE_WRITE;

pub fn register_tools(registry: &mut McpRegistry) {
    registry.register_tool(execute_tool());
}

#[derive(Debug, Deserialize)]
struct ExecuteParams {
    connector_id: String,
    tool: String,
    #[serde(default)]
    args: Option<Value>,
}

fn execute_tool() -> RegisteredTool {
    ToolBuilder::new(ToolName::ConnectorsExecute)
        .description("Run a tool on a registered connector")
        .input_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "connector_id": {
                    "type": "string",
                    "description": "Connector id"
                },
                "tool": {
                    "type": "string",
                    "description": "Name of the connector's tool"
                },
                "args": {
                    "type": "object",
                    "description": "Tool arguments"
                }
            },
            "required": ["connector_id", "tool"]
        }))
        .scope(SCOPE_WRITE)
        .build(execute_handler)
}

async fn execute_handler(ctx: ToolContext, params: Value) -> ToolResult {
    let params: ExecuteParams =
        serde_json::from_value(params).map_err(|e| McpError::InvalidParams(e.to_string()))?;
    let args = params.args.unwrap_or_else(|| serde_json::json!({}));

    let descriptor = ctx
        .registry()
        .get(&params.connector_id)
        .map(|entry| entry.descriptor);
    let Some(descriptor) = descriptor else {
        return Ok(ToolsCallResult::text(format!(
            "Connector '{}' is not registered; nothing was executed",
            params.connector_id
        )));
    };

    info!(
        "{} executing {} on {}",
        ctx.session.subject, params.tool, descriptor.id
    );
    let outcome = ctx.executor.execute(&descriptor, &params.tool, &args).await;
    record_usage(&ctx, descriptor.id, outcome.is_ok());

    Ok(match outcome {
        Ok(output) => ToolsCallResult::text(output),
        Err(err) => {
            warn!("Execution on {} failed: {}", descriptor.id, err);
            ToolsCallResult::error(err.to_string())
        }
    })
}
