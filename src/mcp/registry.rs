//! MCP Tool and Resource Registry
//!
//! Tools are keyed by [`ToolName`], so the set of tools a client can call is
//! closed at compile time. [`McpRegistry::ensure_complete`] checks at startup
//! that every name has a handler.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::bail;
use serde_json::Value;

use super::context::ToolContext;
use super::protocol::{
    McpError, ResourceContent, ResourceDefinition, ToolDefinition, ToolsCallResult,
};

// ============================================================================
// Tool Names
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolName {
    ConnectorsList,
    ConnectorsSearch,
    ConnectorsStats,
    ConnectorsByBlock,
    ConnectorsGet,
    ConnectorsExecute,
    RegistryValidate,
    RegistryOptimize,
    RegistryReportUsage,
    RegistryUnused,
    RegistryExport,
}

impl ToolName {
    pub const ALL: [ToolName; 11] = [
        ToolName::ConnectorsList,
        ToolName::ConnectorsSearch,
        ToolName::ConnectorsStats,
        ToolName::ConnectorsByBlock,
        ToolName::ConnectorsGet,
        ToolName::ConnectorsExecute,
        ToolName::RegistryValidate,
        ToolName::RegistryOptimize,
        ToolName::RegistryReportUsage,
        ToolName::RegistryUnused,
        ToolName::RegistryExport,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ToolName::ConnectorsList => "connectors.list",
            ToolName::ConnectorsSearch => "connectors.search",
            ToolName::ConnectorsStats => "connectors.stats",
            ToolName::ConnectorsByBlock => "connectors.by_block",
            ToolName::ConnectorsGet => "connectors.get",
            ToolName::ConnectorsExecute => "connectors.execute",
            ToolName::RegistryValidate => "registry.validate",
            ToolName::RegistryOptimize => "registry.optimize",
            ToolName::RegistryReportUsage => "registry.report_usage",
            ToolName::RegistryUnused => "registry.unused",
            ToolName::RegistryExport => "registry.export",
        }
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownToolName(pub String);

impl FromStr for ToolName {
    type Err = UnknownToolName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToolName::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| UnknownToolName(s.to_string()))
    }
}

// ============================================================================
// Tool Types
// ============================================================================

/// Result type for tool execution
pub type ToolResult = Result<ToolsCallResult, McpError>;

/// Boxed future for async tool execution
pub type ToolFuture = Pin<Box<dyn Future<Output = ToolResult> + Send>>;

/// Tool handler function type
pub type ToolHandler = Arc<dyn Fn(ToolContext, Value) -> ToolFuture + Send + Sync>;

/// A registered tool with metadata and handler
pub struct RegisteredTool {
    pub name: ToolName,
    pub description: String,
    pub input_schema: Value,
    pub scopes: Vec<&'static str>,
    pub handler: ToolHandler,
}

impl RegisteredTool {
    pub fn is_allowed(&self, granted: &[String]) -> bool {
        has_scopes(&self.scopes, granted)
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name.as_str().to_string(),
            description: self.description.clone(),
            input_schema: self.input_schema.clone(),
        }
    }
}

fn has_scopes(required: &[&'static str], granted: &[String]) -> bool {
    required.iter().all(|r| granted.iter().any(|g| g == r))
}

// ============================================================================
// Resource Types
// ============================================================================

/// Result type for resource read
pub type ResourceResult = Result<Vec<ResourceContent>, McpError>;

/// Boxed future for async resource read
pub type ResourceFuture = Pin<Box<dyn Future<Output = ResourceResult> + Send>>;

/// Resource handler function type
pub type ResourceHandler = Arc<dyn Fn(ToolContext, String) -> ResourceFuture + Send + Sync>;

/// A registered resource with metadata and handler
pub struct RegisteredResource {
    pub uri_pattern: String,
    pub name: String,
    pub description: Option<String>,
    pub mime_type: Option<String>,
    pub scopes: Vec<&'static str>,
    pub handler: ResourceHandler,
}

// ============================================================================
// Registry
// ============================================================================

/// Registry for MCP tools and resources
#[derive(Default)]
pub struct McpRegistry {
    tools: HashMap<ToolName, RegisteredTool>,
    resources: Vec<RegisteredResource>,
}

impl McpRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool, replacing any previous handler for the same name
    pub fn register_tool(&mut self, tool: RegisteredTool) {
        self.tools.insert(tool.name, tool);
    }

    /// Register a resource
    pub fn register_resource(&mut self, resource: RegisteredResource) {
        self.resources.push(resource);
    }

    /// Fails when a [`ToolName`] has no registered handler.
    pub fn ensure_complete(&self) -> anyhow::Result<()> {
        let missing: Vec<&str> = ToolName::ALL
            .into_iter()
            .filter(|name| !self.tools.contains_key(name))
            .map(ToolName::as_str)
            .collect();
        if !missing.is_empty() {
            bail!("MCP tools without a handler: {}", missing.join(", "));
        }
        Ok(())
    }

    /// Tools the caller's scopes allow, in [`ToolName::ALL`] order
    pub fn get_available_tools(&self, scopes: &[String]) -> Vec<ToolDefinition> {
        ToolName::ALL
            .into_iter()
            .filter_map(|name| self.tools.get(&name))
            .filter(|tool| tool.is_allowed(scopes))
            .map(RegisteredTool::definition)
            .collect()
    }

    /// Get a tool by name, regardless of scopes
    pub fn get_tool(&self, name: ToolName) -> Option<&RegisteredTool> {
        self.tools.get(&name)
    }

    /// Get resources available to the caller's scopes
    pub fn get_available_resources(&self, scopes: &[String]) -> Vec<ResourceDefinition> {
        self.resources
            .iter()
            .filter(|resource| has_scopes(&resource.scopes, scopes))
            .map(|resource| ResourceDefinition {
                uri: resource.uri_pattern.clone(),
                name: resource.name.clone(),
                description: resource.description.clone(),
                mime_type: resource.mime_type.clone(),
            })
            .collect()
    }

    /// Find a resource handler for a URI
    pub fn find_resource(&self, uri: &str, scopes: &[String]) -> Option<&RegisteredResource> {
        self.resources.iter().find(|resource| {
            has_scopes(&resource.scopes, scopes) && matches_uri_pattern(&resource.uri_pattern, uri)
        })
    }

    pub fn tool_count(&self) -> usize {
        self.tools.len()
    }

    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }
}

/// Check if a URI matches a pattern with {param} placeholders
pub fn matches_uri_pattern(pattern: &str, uri: &str) -> bool {
    // Pattern: registry://blocks/{block}
    // URI: registry://blocks/security
    let pattern_parts: Vec<&str> = pattern.split('/').collect();
    let uri_parts: Vec<&str> = uri.split('/').collect();

    if pattern_parts.len() != uri_parts.len() {
        return false;
    }

    pattern_parts
        .iter()
        .zip(uri_parts.iter())
        .all(|(pattern_part, uri_part)| {
            (pattern_part.starts_with('{') && pattern_part.ends_with('}') && !uri_part.is_empty())
                || pattern_part == uri_part
        })
}

// ============================================================================
// Builder helpers
// ============================================================================

/// Builder for registering a tool
pub struct ToolBuilder {
    name: ToolName,
    description: String,
    input_schema: Value,
    scopes: Vec<&'static str>,
}

impl ToolBuilder {
    pub fn new(name: ToolName) -> Self {
        Self {
            name,
            description: String::new(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {}
            }),
            scopes: Vec::new(),
        }
    }

    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    pub fn input_schema(mut self, schema: Value) -> Self {
        self.input_schema = schema;
        self
    }

    pub fn scope(mut self, scope: &'static str) -> Self {
        self.scopes.push(scope);
        self
    }

    pub fn build<F, Fut>(self, handler: F) -> RegisteredTool
    where
        F: Fn(ToolContext, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ToolResult> + Send + 'static,
    {
        RegisteredTool {
            name: self.name,
            description: self.description,
            input_schema: self.input_schema,
            scopes: self.scopes,
            handler: Arc::new(move |ctx, params| Box::pin(handler(ctx, params))),
        }
    }
}

/// Builder for registering a resource
pub struct ResourceBuilder {
    uri_pattern: String,
    name: String,
    description: Option<String>,
    mime_type: Option<String>,
    scopes: Vec<&'static str>,
}

impl ResourceBuilder {
    pub fn new(uri_pattern: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            uri_pattern: uri_pattern.into(),
            name: name.into(),
            description: None,
            mime_type: None,
            scopes: Vec::new(),
        }
    }

    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    pub fn mime_type(mut self, mime: impl Into<String>) -> Self {
        self.mime_type = Some(mime.into());
        self
    }

    pub fn scope(mut self, scope: &'static str) -> Self {
        self.scopes.push(scope);
        self
    }

    pub fn build<F, Fut>(self, handler: F) -> RegisteredResource
    where
        F: Fn(ToolContext, String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ResourceResult> + Send + 'static,
    {
        RegisteredResource {
            uri_pattern: self.uri_pattern,
            name: self.name,
            description: self.description,
            mime_type: self.mime_type,
            scopes: self.scopes,
            handler: Arc::new(move |ctx, uri| Box::pin(handler(ctx, uri))),
        }
    }
}
