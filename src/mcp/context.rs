//! MCP Tool Execution Context
//!
//! Provides access to server state for tool implementations.

use std::sync::{MutexGuard, PoisonError};

use crate::catalog::Catalog;
use crate::registry::ConnectorRegistry;
use crate::server::session::Session;
use crate::server::state::{GuardedExecutor, GuardedRegistry, ServerState};

/// Context provided to tool and resource handlers during execution
#[derive(Clone)]
pub struct ToolContext {
    /// The authenticated caller
    pub session: Session,

    /// Immutable connector metadata
    pub catalog: Catalog,

    /// Runtime connector state
    pub registry: GuardedRegistry,

    /// Performs `connectors.execute` calls
    pub executor: GuardedExecutor,
}

impl ToolContext {
    pub fn new(session: Session, state: &ServerState) -> Self {
        Self {
            session,
            catalog: state.catalog,
            registry: state.registry.clone(),
            executor: state.executor.clone(),
        }
    }

    /// Locks the connector registry. Never hold the guard across an `.await`.
    pub fn registry(&self) -> MutexGuard<'_, ConnectorRegistry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
