//! MCP Tools
//!
//! Tool implementations for connector queries, execution and registry upkeep.

pub mod connectors;
pub mod execute;
pub mod lifecycle;

use super::registry::McpRegistry;

/// Register all tools with the registry
pub fn register_all_tools(registry: &mut McpRegistry) {
    connectors::register_tools(registry);
    execute::register_tools(registry);
    lifecycle::register_tools(registry);
}


#[cfg(test)]
mod tests {
    use super::test_support::{context, context_with, json_of, text_of};
    use super::*;
    use crate::catalog::ConnectorDescriptor;
    use crate::executor::{ConnectorExecutor, ExecutionError};
    use crate::mcp::protocol::McpError;
    use crate::mcp::registry::{ToolName, ToolResult};
    use crate::mcp::context::ToolContext;
    use crate::registry::ConnectorStatus;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::Arc;

    async fn call(ctx: &ToolContext, name: ToolName, params: Value) -> ToolResult {
        let mut registry = McpRegistry::new();
        register_all_tools(&mut registry);
        let tool = registry.get_tool(name).unwrap();
        (tool.handler)(ctx.clone(), params).await
    }

    struct FailingExecutor;

    #[async_trait]
    impl ConnectorExecutor for FailingExecutor {
        async fn execute(
            &self,
            connector: &ConnectorDescriptor,
            tool: &str,
            _args: &Value,
        ) -> Result<String, ExecutionError> {
            Err(ExecutionError::Failed {
                connector: connector.id.to_string(),
                tool: tool.to_string(),
                reason: "boom".to_string(),
            })
        }
    }

    #[test]
    fn test_every_tool_is_registered() {
        let mut registry = McpRegistry::new();
        register_all_tools(&mut registry);
        registry.ensure_complete().unwrap();
    }

    #[tokio::test]
    async fn test_list_filters() {
        let ctx = context();
        let all = json_of(&call(&ctx, ToolName::ConnectorsList, json!({})).await.unwrap());
        assert_eq!(all["total"], ctx.catalog.len());

        let dbs = json_of(
            &call(&ctx, ToolName::ConnectorsList, json!({"category": "Databases"}))
                .await
                .unwrap(),
        );
        assert_eq!(dbs["total"], 4);

        let google = json_of(
            &call(&ctx, ToolName::ConnectorsList, json!({"tag": "google"}))
                .await
                .unwrap(),
        );
        for connector in google["connectors"].as_array().unwrap() {
            assert!(connector["name"].as_str().unwrap().contains("Google"));
        }

        let search = json_of(
            &call(&ctx, ToolName::ConnectorsList, json!({"search": "redis"}))
                .await
                .unwrap(),
        );
        assert_eq!(search["total"], 1);
        assert_eq!(search["connectors"][0]["id"], "@redis/mcp-redis");
    }

    #[tokio::test]
    async fn test_list_rejects_unknown_category() {
        let ctx = context();
        let err = call(&ctx, ToolName::ConnectorsList, json!({"category": "gardening"}))
            .await
            .unwrap_err();
        assert!(matches!(err, McpError::InvalidParams(_)));
    }

    #[tokio::test]
    async fn test_search_ranks_results() {
        let ctx = context();
        let result = json_of(
            &call(&ctx, ToolName::ConnectorsSearch, json!({"query": "slack"}))
                .await
                .unwrap(),
        );
        assert_eq!(result["results"][0]["name"], "Slack");
        // 10 (exact) + 5 (contains)
        assert_eq!(result["results"][0]["score"], 15);
    }

    #[tokio::test]
    async fn test_search_requires_query() {
        let ctx = context();
        let err = call(&ctx, ToolName::ConnectorsSearch, json!({}))
            .await
            .unwrap_err();
        assert_eq!(err.code(), -32602);
    }

    #[tokio::test]
    async fn test_stats() {
        let ctx = context();
        let stats = json_of(&call(&ctx, ToolName::ConnectorsStats, json!({})).await.unwrap());
        assert_eq!(stats["total"], ctx.catalog.len());
        assert_eq!(stats["active"], ctx.catalog.len());
        assert_eq!(stats["by_status"]["maintenance"], 0);
        assert_eq!(stats["by_category"]["finance"], 1);
    }

    #[tokio::test]
    async fn test_by_block() {
        let ctx = context();
        let one = json_of(
            &call(&ctx, ToolName::ConnectorsByBlock, json!({"block": "security"}))
                .await
                .unwrap(),
        );
        let members = one["connectors"].as_array().unwrap();
        assert_eq!(members.len(), 3);
        // All three tie on priority, so table order holds
        assert_eq!(members[0]["id"], "@hashicorp/vault-mcp-server");

        let unknown = json_of(
            &call(&ctx, ToolName::ConnectorsByBlock, json!({"block": "nope"}))
                .await
                .unwrap(),
        );
        assert_eq!(unknown["connectors"], json!([]));

        let all = json_of(&call(&ctx, ToolName::ConnectorsByBlock, json!({})).await.unwrap());
        assert_eq!(all["blocks"].as_object().unwrap().len(), 10);
    }

    #[tokio::test]
    async fn test_get_with_fallback() {
        let ctx = context();
        let result = json_of(
            &call(
                &ctx,
                ToolName::ConnectorsGet,
                json!({"connector_id": "@modelcontextprotocol/slack"}),
            )
            .await
            .unwrap(),
        );
        assert_eq!(result["connector"]["name"], "Slack");
        assert_eq!(result["fallback"]["name"], "Discord");

        let missing = json_of(
            &call(&ctx, ToolName::ConnectorsGet, json!({"connector_id": "nope"}))
                .await
                .unwrap(),
        );
        assert_eq!(missing["connector"], Value::Null);
        assert_eq!(missing["fallback"], Value::Null);
    }

    #[tokio::test]
    async fn test_execute_records_success() {
        let ctx = context();
        let result = call(
            &ctx,
            ToolName::ConnectorsExecute,
            json!({"connector_id": "@modelcontextprotocol/git", "tool": "log", "args": {"n": 1}}),
        )
        .await
        .unwrap();
        assert!(result.is_error.is_none());
        assert!(text_of(&result).contains("log"));

        let registry = ctx.registry();
        let usage = &registry.get("@modelcontextprotocol/git").unwrap().usage;
        assert_eq!(usage.total_calls, 1);
        assert_eq!(usage.error_rate, 0.0);
    }

    #[tokio::test]
    async fn test_execute_records_failure() {
        let ctx = context_with(Arc::new(FailingExecutor));
        let result = call(
            &ctx,
            ToolName::ConnectorsExecute,
            json!({"connector_id": "@modelcontextprotocol/git", "tool": "log"}),
        )
        .await
        .unwrap();
        assert_eq!(result.is_error, Some(true));
        assert!(text_of(&result).contains("boom"));

        let registry = ctx.registry();
        let usage = &registry.get("@modelcontextprotocol/git").unwrap().usage;
        assert_eq!(usage.total_calls, 1);
        assert_eq!(usage.error_rate, 1.0);
    }

    #[tokio::test]
    async fn test_execute_unknown_connector_is_lenient() {
        let ctx = context();
        let result = call(
            &ctx,
            ToolName::ConnectorsExecute,
            json!({"connector_id": "nope", "tool": "anything"}),
        )
        .await
        .unwrap();
        assert!(result.is_error.is_none());
        assert!(text_of(&result).contains("nope"));
    }

    #[tokio::test]
    async fn test_report_usage_drives_maintenance() {
        let ctx = context();
        let id = "@stripe/agent-toolkit";
        for _ in 0..11 {
            let result = json_of(
                &call(
                    &ctx,
                    ToolName::RegistryReportUsage,
                    json!({"connector_id": id, "success": false}),
                )
                .await
                .unwrap(),
            );
            assert_eq!(result["recorded"], true);
        }
        assert_eq!(
            ctx.registry().get(id).unwrap().status,
            ConnectorStatus::Maintenance
        );

        let unknown = json_of(
            &call(
                &ctx,
                ToolName::RegistryReportUsage,
                json!({"connector_id": "nope", "success": true}),
            )
            .await
            .unwrap(),
        );
        assert_eq!(unknown["success"], true);
        assert_eq!(unknown["recorded"], false);
    }

    #[tokio::test]
    async fn test_validate_flags_failing_connector() {
        let ctx = context();
        let clean = json_of(&call(&ctx, ToolName::RegistryValidate, json!({})).await.unwrap());
        assert_eq!(clean["valid"], true);

        ctx.registry().record_usage("@modelcontextprotocol/docker", false);
        let report = json_of(&call(&ctx, ToolName::RegistryValidate, json!({})).await.unwrap());
        assert_eq!(report["valid"], false);
        assert_eq!(report["errors"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unused_and_optimize() {
        let ctx = context();
        ctx.registry().record_usage("@modelcontextprotocol/git", true);

        let unused = json_of(&call(&ctx, ToolName::RegistryUnused, json!({})).await.unwrap());
        assert_eq!(unused["days"], 30);
        assert_eq!(unused["count"], ctx.catalog.len() - 1);

        let report = json_of(&call(&ctx, ToolName::RegistryOptimize, json!({})).await.unwrap());
        assert_eq!(report["deactivated"], ctx.catalog.len() - 1);

        let again = json_of(&call(&ctx, ToolName::RegistryOptimize, json!({})).await.unwrap());
        assert_eq!(again["deactivated"], 0);
    }

    #[tokio::test]
    async fn test_export_rows() {
        let ctx = context();
        let rows = json_of(&call(&ctx, ToolName::RegistryExport, json!({})).await.unwrap());
        let rows = rows.as_array().unwrap();
        assert_eq!(rows.len(), ctx.catalog.len());
        let postgres = rows
            .iter()
            .find(|r| r["id"] == "@modelcontextprotocol/postgres")
            .unwrap();
        assert_eq!(postgres["fallback"], "@modelcontextprotocol/sqlite");
        assert_eq!(postgres["last_used"], "never");
        assert_eq!(postgres["error_rate"], "0.00%");
    }
}
