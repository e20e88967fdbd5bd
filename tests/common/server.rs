//! Test server lifecycle management
//!
//! This module manages spawning and shutting down test HTTP servers.
//! Each test gets an isolated server with its own registry and rate limiter.

use super::constants::*;
use mcp_hub_server::catalog::Catalog;
use mcp_hub_server::executor::SimulatedExecutor;
use mcp_hub_server::security::{Authenticator, GoogleTokenInfo, TokenIntrospector};
use mcp_hub_server::server::state::ServerState;
use mcp_hub_server::server::{make_app, RequestsLoggingLevel, ServerConfig};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

/// Knobs for tests that need a non-default server
#[derive(Debug, Clone, Default)]
pub struct TestServerOptions {
    /// Overrides the requests allowed per rate limit window
    pub rate_limit_requests: Option<u32>,
    /// Overrides the rate limit window length
    pub rate_limit_window: Option<Duration>,
    /// Enables OAuth introspection against this token-info URL
    pub oauth_tokeninfo_url: Option<String>,
    pub cors_allowed_origins: Vec<String>,
}

/// Test server instance with an isolated registry
///
/// When dropped, the server gracefully shuts down.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// The port the server is listening on
    pub port: u16,

    /// Shared state, for inspecting the registry directly
    pub state: ServerState,

    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Spawns a new test server on a random port with default options
    pub async fn spawn() -> Self {
        Self::spawn_with(TestServerOptions::default()).await
    }

    /// Spawns a new test server on a random port
    ///
    /// The server accepts [`TEST_API_KEY`] and [`TEST_BEARER_TOKEN`], and
    /// OAuth tokens when `options.oauth_tokeninfo_url` is set.
    ///
    /// # Panics
    ///
    /// Panics if binding fails or the server doesn't become ready in time.
    pub async fn spawn_with(options: TestServerOptions) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");

        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();

        let base_url = format!("http://127.0.0.1:{}", port);

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let mut config = ServerConfig {
            port,
            requests_logging_level: RequestsLoggingLevel::None,
            cors_allowed_origins: options.cors_allowed_origins.clone(),
            ..ServerConfig::default()
        };
        if let Some(requests) = options.rate_limit_requests {
            config.rate_limit.requests_per_window = requests;
        }
        if let Some(window) = options.rate_limit_window {
            config.rate_limit.window = window;
        }

        let introspector: Option<Arc<dyn TokenIntrospector>> =
            options.oauth_tokeninfo_url.map(|url| {
                Arc::new(
                    GoogleTokenInfo::new(url, Duration::from_millis(OAUTH_TIMEOUT_MS))
                        .expect("Failed to build token-info client"),
                ) as Arc<dyn TokenIntrospector>
            });
        let api_keys = HashMap::from([(
            TEST_API_KEY.to_string(),
            TEST_API_KEY_SUBJECT.to_string(),
        )]);
        let authenticator = Authenticator::new(&api_keys, Some(TEST_BEARER_TOKEN), introspector);

        let state = ServerState::new(
            config,
            Catalog::builtin(),
            authenticator,
            Arc::new(SimulatedExecutor),
        )
        .expect("Failed to build server state");

        let app = make_app(state.clone());

        // Spawn server in background task with graceful shutdown
        tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .with_graceful_shutdown(async {
                shutdown_rx.await.ok();
            })
            .await
            .expect("Server failed");
        });

        let server = Self {
            base_url,
            port,
            state,
            _shutdown_tx: Some(shutdown_tx),
        };

        server.wait_for_ready().await;

        server
    }

    /// WebSocket URL of the MCP transport
    pub fn ws_url(&self) -> String {
        format!("ws://127.0.0.1:{}/v1/mcp/ws", self.port)
    }

    /// Waits for the server to become ready by polling the public home route
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            match client.get(format!("{}/", self.base_url)).send().await {
                Ok(response) if response.status().is_success() => return,
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
