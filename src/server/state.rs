use axum::extract::FromRef;

use crate::catalog::Catalog;
use crate::executor::ConnectorExecutor;
use crate::mcp::handler::{create_mcp_state, McpState};
use crate::registry::ConnectorRegistry;
use crate::security::{Authenticator, SlidingWindowRateLimiter};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use super::metrics;
use super::ServerConfig;

pub type GuardedRegistry = Arc<Mutex<ConnectorRegistry>>;
pub type GuardedAuthenticator = Arc<Authenticator>;
pub type GuardedRateLimiter = Arc<SlidingWindowRateLimiter>;
pub type GuardedExecutor = Arc<dyn ConnectorExecutor>;
pub type GuardedMcpState = Arc<McpState>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub hash: String,
    pub catalog: Catalog,
    pub registry: GuardedRegistry,
    pub authenticator: GuardedAuthenticator,
    pub rate_limiter: GuardedRateLimiter,
    pub executor: GuardedExecutor,
    pub mcp_state: GuardedMcpState,
}

impl ServerState {
    /// Builds the state with a registry freshly initialized from `catalog`.
    pub fn new(
        config: ServerConfig,
        catalog: Catalog,
        authenticator: Authenticator,
        executor: GuardedExecutor,
    ) -> anyhow::Result<Self> {
        let registry = ConnectorRegistry::from_catalog(&catalog);
        metrics::set_connector_status_counts(&registry.status_counts());

        Ok(ServerState {
            config,
            start_time: Instant::now(),
            hash: format!("{}-{}", env!("APP_VERSION"), env!("GIT_HASH")),
            catalog,
            registry: Arc::new(Mutex::new(registry)),
            authenticator: Arc::new(authenticator),
            rate_limiter: Arc::new(SlidingWindowRateLimiter::new()),
            executor,
            mcp_state: Arc::new(create_mcp_state()?),
        })
    }

    /// Locks the connector registry. Never hold the guard across an `.await`.
    pub fn registry(&self) -> MutexGuard<'_, ConnectorRegistry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}

impl FromRef<ServerState> for GuardedRegistry {
    fn from_ref(input: &ServerState) -> Self {
        input.registry.clone()
    }
}

impl FromRef<ServerState> for GuardedAuthenticator {
    fn from_ref(input: &ServerState) -> Self {
        input.authenticator.clone()
    }
}

impl FromRef<ServerState> for GuardedRateLimiter {
    fn from_ref(input: &ServerState) -> Self {
        input.rate_limiter.clone()
    }
}

impl FromRef<ServerState> for GuardedExecutor {
    fn from_ref(input: &ServerState) -> Self {
        input.executor.clone()
    }
}

impl FromRef<ServerState> for GuardedMcpState {
    fn from_ref(input: &ServerState) -> Self {
        input.mcp_state.clone()
    }
}
