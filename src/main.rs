use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use mcp_hub_server::catalog::Catalog;
use mcp_hub_server::config::{AppConfig, CliConfig, FileConfig};
use mcp_hub_server::executor::SimulatedExecutor;
use mcp_hub_server::security::{Authenticator, GoogleTokenInfo, TokenIntrospector};
use mcp_hub_server::server::{metrics, run_server, state::ServerState, ServerConfig};
use mcp_hub_server::RequestsLoggingLevel;

fn parse_path(s: &str) -> Result<PathBuf> {
    let original_path = PathBuf::from(s);
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to a TOML config file. Its values override the command line.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3001)]
    pub port: u16,

    /// The port for the metrics server (Prometheus scraping).
    #[clap(long, default_value_t = 9091)]
    pub metrics_port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Comma separated API keys accepted in the x-api-key header.
    #[clap(long, env = "MCP_API_KEYS", value_delimiter = ',', hide_env_values = true)]
    pub api_keys: Vec<String>,

    /// Shared secret accepted as `Authorization: Bearer <token>`.
    #[clap(long, env = "MCP_BEARER_TOKEN", hide_env_values = true)]
    pub bearer_token: Option<String>,

    /// Enables OAuth token introspection for the x-oauth-token header.
    #[clap(long, env = "GOOGLE_CLIENT_ID")]
    pub google_client_id: Option<String>,

    /// Requests allowed per client within the rate limit window.
    #[clap(long)]
    pub rate_limit_requests: Option<u32>,

    /// Rate limit window length in milliseconds.
    #[clap(long)]
    pub rate_limit_window_ms: Option<u64>,

    /// Origins allowed for cross-origin requests.
    #[clap(long, value_delimiter = ',')]
    pub cors_allowed_origins: Vec<String>,

    /// Interval in hours between optimization sweeps. 0 (the default)
    /// disables them, since never-used connectors count as unused.
    #[clap(long, default_value_t = 0)]
    pub optimize_interval_hours: u64,
}

impl From<&CliArgs> for CliConfig {
    fn from(args: &CliArgs) -> Self {
        CliConfig {
            port: args.port,
            metrics_port: args.metrics_port,
            logging_level: args.logging_level.clone(),
            api_keys: args.api_keys.clone(),
            bearer_token: args.bearer_token.clone(),
            google_client_id: args.google_client_id.clone(),
            rate_limit_requests: args.rate_limit_requests,
            rate_limit_window_ms: args.rate_limit_window_ms,
            cors_allowed_origins: args.cors_allowed_origins.clone(),
            optimize_interval_hours: args.optimize_interval_hours,
        }
    }
}

fn build_authenticator(config: &AppConfig) -> Result<Authenticator> {
    let introspector: Option<Arc<dyn TokenIntrospector>> = match &config.oauth {
        Some(oauth) => {
            info!(
                "OAuth introspection enabled for client {} via {}",
                oauth.client_id, oauth.tokeninfo_url
            );
            let tokeninfo = GoogleTokenInfo::new(oauth.tokeninfo_url.clone(), oauth.timeout)
                .context("Failed to build OAuth introspection client")?;
            Some(Arc::new(tokeninfo))
        }
        None => None,
    };
    Ok(Authenticator::new(
        &config.api_keys,
        config.bearer_token.as_deref(),
        introspector,
    ))
}

fn spawn_rate_limit_cleanup(state: &ServerState) {
    let rate_limiter = state.rate_limiter.clone();
    let settings = state.config.rate_limit.clone();

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(settings.cleanup_interval);

        // Skip the first immediate tick, wait for the first interval
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let removed = rate_limiter.cleanup_stale_entries(settings.window);
            if removed > 0 {
                info!("Dropped {} idle rate limit entries", removed);
            }
        }
    });
}

fn spawn_optimize_sweep(state: &ServerState, interval_hours: u64) {
    let state = state.clone();
    info!("Optimization sweep enabled: every {} hours", interval_hours);

    tokio::spawn(async move {
        let interval = Duration::from_secs(interval_hours * 60 * 60);
        let mut ticker = tokio::time::interval(interval);

        // Skip the first immediate tick, wait for the first interval
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let report = {
                let mut registry = state.registry();
                let report = registry.optimize();
                metrics::set_connector_status_counts(&registry.status_counts());
                report
            };
            if report.deactivated > 0 {
                info!(
                    "Optimization sweep deactivated {} connectors: {:?}",
                    report.deactivated, report.connectors
                );
            }
        }
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading config file {:?}...", path);
            Some(FileConfig::load(path)?)
        }
        None => None,
    };
    let app_config = AppConfig::resolve(&CliConfig::from(&cli_args), file_config)?;

    if !app_config.has_credentials() {
        warn!("No API keys, bearer token or OAuth client configured: every /v1 request will be rejected");
    }

    info!("Initializing metrics...");
    metrics::init_metrics();

    let authenticator = build_authenticator(&app_config)?;
    info!(
        "Authentication: {} API keys, bearer token {}, OAuth {}",
        authenticator.api_key_count(),
        if authenticator.has_bearer_token() { "set" } else { "unset" },
        if authenticator.has_oauth() { "enabled" } else { "disabled" },
    );

    let catalog = Catalog::builtin();
    info!("Loaded catalog with {} connectors", catalog.len());

    let state = ServerState::new(
        ServerConfig::from(&app_config),
        catalog,
        authenticator,
        Arc::new(SimulatedExecutor),
    )?;

    spawn_rate_limit_cleanup(&state);
    if app_config.optimize_interval_hours > 0 {
        spawn_optimize_sweep(&state, app_config.optimize_interval_hours);
    }

    run_server(state).await
}
