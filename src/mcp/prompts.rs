//! MCP Prompts
//!
//! Message templates a client fills in and hands to its model.

use super::context::ToolContext;
use super::protocol::{
    McpError, PromptArgument, PromptDefinition, PromptMessage, PromptsGetParams,
    PromptsGetResult,
};
use crate::registry::RegistryEntry;

pub const SETUP_CONNECTOR: &str = "setup_connector";

const CONNECTOR_ID_ARG: &str = "connector_id";

pub fn prompt_definitions() -> Vec<PromptDefinition> {
    vec![PromptDefinition {
        name: SETUP_CONNECTOR.to_string(),
        description: "Guide for configuring one connector of the catalog".to_string(),
        arguments: vec![PromptArgument {
            name: CONNECTOR_ID_ARG.to_string(),
            description: "Id of the connector to configure".to_string(),
            required: true,
        }],
    }]
}

pub fn get_prompt(
    ctx: &ToolContext,
    params: &PromptsGetParams,
) -> Result<PromptsGetResult, McpError> {
    match params.name.as_str() {
        SETUP_CONNECTOR => setup_connector(ctx, params),
        other => Err(McpError::InvalidParams(format!("Unknown prompt: {}", other))),
    }
}

fn setup_connector(
    ctx: &ToolContext,
    params: &PromptsGetParams,
) -> Result<PromptsGetResult, McpError> {
    let connector_id = params
        .arguments
        .get(CONNECTOR_ID_ARG)
        .map(|id| id.trim())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| {
            McpError::InvalidParams(format!("Missing argument: {}", CONNECTOR_ID_ARG))
        })?;

    let registry = ctx.registry();
    let found = registry.get_with_fallback(connector_id);
    let Some(primary) = found.primary else {
        return Err(McpError::InvalidParams(format!(
            "Unknown connector: {}",
            connector_id
        )));
    };

    Ok(PromptsGetResult {
        description: format!("Setup guide for {}", primary.descriptor.name),
        messages: vec![PromptMessage::user(setup_text(primary, found.fallback))],
    })
}

fn setup_text(primary: &RegistryEntry, fallback: Option<&RegistryEntry>) -> String {
    let descriptor = &primary.descriptor;
    let origin = if descriptor.official {
        "an official"
    } else {
        "a community"
    };

    let mut text = format!(
        "How do I set up the {} MCP connector ({})?\n\n{}\n\nIt is {} connector in the {} category, currently {}.",
        descriptor.name,
        descriptor.id,
        descriptor.description,
        origin,
        descriptor.category,
        primary.status,
    );
    if let Some(fallback) = fallback {
        text.push_str(&format!(
            " When it is unavailable, {} ({}) can stand in for it.",
            fallback.descriptor.name,
            fallback.descriptor.id
        ));
    }
    text.push_str(" Walk me through installing it and the credentials it needs.");
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::protocol::ToolResultContent;
    use crate::mcp::tools::test_support::context;
    use std::collections::HashMap;

    fn params(name: &str, args: &[(&str, &str)]) -> PromptsGetParams {
        PromptsGetParams {
            name: name.to_string(),
            arguments: args
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<HashMap<_, _>>(),
        }
    }

    fn text(result: &PromptsGetResult) -> &str {
        match &result.messages[0].content {
            ToolResultContent::Text { text } => text,
        }
    }

    #[test]
    fn test_definitions() {
        let prompts = prompt_definitions();
        assert_eq!(prompts.len(), 1);
        assert_eq!(prompts[0].name, SETUP_CONNECTOR);
        assert!(prompts[0].arguments[0].required);
    }

    #[test]
    fn test_setup_connector_mentions_fallback() {
        let result = get_prompt(
            &context(),
            &params(
                SETUP_CONNECTOR,
                &[(CONNECTOR_ID_ARG, "@modelcontextprotocol/slack")],
            ),
        )
        .unwrap();
        assert_eq!(result.messages[0].role, "user");
        let text = text(&result);
        assert!(text.contains("@modelcontextprotocol/slack"));
        assert!(text.contains("@chatbotkit/discord-mcp"));
        assert!(text.contains("currently active"));
    }

    #[test]
    fn test_setup_connector_argument_errors() {
        let ctx = context();

        let missing = get_prompt(&ctx, &params(SETUP_CONNECTOR, &[])).unwrap_err();
        assert_eq!(missing.code(), -32602);

        let unknown = get_prompt(
            &ctx,
            &params(SETUP_CONNECTOR, &[(CONNECTOR_ID_ARG, "@nobody/nothing")]),
        )
        .unwrap_err();
        assert_eq!(unknown.code(), -32602);
        assert!(unknown.message().contains("Unknown connector"));
    }

    #[test]
    fn test_unknown_prompt() {
        let err = get_prompt(&context(), &params("setup_mcp", &[])).unwrap_err();
        assert_eq!(err.code(), -32602);
        assert!(err.message().contains("Unknown prompt: setup_mcp"));
    }
}
