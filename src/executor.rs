//! Connector invocation.
//!
//! The hub never supervises connector processes itself; it hands calls to a
//! [`ConnectorExecutor`] and feeds the outcome back into the registry.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::catalog::ConnectorDescriptor;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    #[error("Connector {0} is unavailable")]
    Unavailable(String),
    #[error("Tool {tool} failed on {connector}: {reason}")]
    Failed {
        connector: String,
        tool: String,
        reason: String,
    },
}

#[async_trait]
pub trait ConnectorExecutor: Send + Sync {
    /// Runs `tool` on `connector`, returning its textual output.
    async fn execute(
        &self,
        connector: &ConnectorDescriptor,
        tool: &str,
        args: &Value,
    ) -> Result<String, ExecutionError>;
}

/// Describes the invocation instead of performing it.
#[derive(Debug, Default, Clone, Copy)]
pub struct SimulatedExecutor;

#[async_trait]
impl ConnectorExecutor for SimulatedExecutor {
    async fn execute(
        &self,
        connector: &ConnectorDescriptor,
        tool: &str,
        args: &Value,
    ) -> Result<String, ExecutionError> {
        Ok(format!(
            "Executing {} on {} ({}) with args: {}",
            tool, connector.name, connector.id, args
        ))
    }
}
