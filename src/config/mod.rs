mod file_config;

pub use file_config::{FileConfig, OAuthConfig, RateLimitConfig};

use crate::security::auth::DEFAULT_TOKENINFO_URL;
use crate::security::rate_limit::{DEFAULT_REQUESTS_PER_WINDOW, DEFAULT_WINDOW};
use crate::server::RequestsLoggingLevel;
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::collections::HashMap;
use std::time::Duration;

/// Subject label given to API keys passed on the command line or environment.
pub const DEFAULT_API_KEY_SUBJECT: &str = "default";

pub const DEFAULT_OAUTH_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_RATE_LIMIT_CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub api_keys: Vec<String>,
    pub bearer_token: Option<String>,
    pub google_client_id: Option<String>,
    pub rate_limit_requests: Option<u32>,
    pub rate_limit_window_ms: Option<u64>,
    pub cors_allowed_origins: Vec<String>,
    pub optimize_interval_hours: u64,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    // Core settings
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub cors_allowed_origins: Vec<String>,
    /// 0 disables the periodic optimization sweep
    pub optimize_interval_hours: u64,

    // Credentials
    /// API key -> subject label
    pub api_keys: HashMap<String, String>,
    pub bearer_token: Option<String>,
    pub oauth: Option<OAuthSettings>,

    pub rate_limit: RateLimitSettings,
}

#[derive(Debug, Clone)]
pub struct OAuthSettings {
    pub client_id: String,
    pub tokeninfo_url: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RateLimitSettings {
    pub requests_per_window: u32,
    pub window: Duration,
    pub cleanup_interval: Duration,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            requests_per_window: DEFAULT_REQUESTS_PER_WINDOW,
            window: DEFAULT_WINDOW,
            cleanup_interval: DEFAULT_RATE_LIMIT_CLEANUP_INTERVAL,
        }
    }
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let port = file.port.unwrap_or(cli.port);
        let metrics_port = file.metrics_port.unwrap_or(cli.metrics_port);
        if port == metrics_port && port != 0 {
            bail!("port and metrics_port must differ (both are {})", port);
        }

        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());

        let cors_allowed_origins = file
            .cors_allowed_origins
            .unwrap_or_else(|| cli.cors_allowed_origins.clone());
        let optimize_interval_hours = file
            .optimize_interval_hours
            .unwrap_or(cli.optimize_interval_hours);

        // The TOML table maps labels to keys; invert it so lookups go by key
        let api_keys: HashMap<String, String> = match file.api_keys {
            Some(labeled) => labeled
                .into_iter()
                .map(|(subject, key)| (key.trim().to_string(), subject))
                .filter(|(key, _)| !key.is_empty())
                .collect(),
            None => cli
                .api_keys
                .iter()
                .map(|key| key.trim())
                .filter(|key| !key.is_empty())
                .map(|key| (key.to_string(), DEFAULT_API_KEY_SUBJECT.to_string()))
                .collect(),
        };

        let bearer_token = file
            .bearer_token
            .or_else(|| cli.bearer_token.clone())
            .filter(|t| !t.is_empty());

        let oauth_file = file.oauth.unwrap_or_default();
        let oauth = oauth_file
            .client_id
            .or_else(|| cli.google_client_id.clone())
            .filter(|id| !id.is_empty())
            .map(|client_id| OAuthSettings {
                client_id,
                tokeninfo_url: oauth_file
                    .tokeninfo_url
                    .unwrap_or_else(|| DEFAULT_TOKENINFO_URL.to_string()),
                timeout: oauth_file
                    .timeout_ms
                    .map(Duration::from_millis)
                    .unwrap_or(DEFAULT_OAUTH_TIMEOUT),
            });

        let rl_file = file.rate_limit.unwrap_or_default();
        let defaults = RateLimitSettings::default();
        let rate_limit = RateLimitSettings {
            requests_per_window: rl_file
                .requests_per_window
                .or(cli.rate_limit_requests)
                .unwrap_or(defaults.requests_per_window),
            window: rl_file
                .window_ms
                .or(cli.rate_limit_window_ms)
                .map(Duration::from_millis)
                .unwrap_or(defaults.window),
            cleanup_interval: rl_file
                .cleanup_interval_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.cleanup_interval),
        };
        if rate_limit.requests_per_window == 0 {
            bail!("rate_limit.requests_per_window must be greater than 0");
        }
        if rate_limit.window.is_zero() {
            bail!("rate_limit.window_ms must be greater than 0");
        }
        if rate_limit.cleanup_interval.is_zero() {
            bail!("rate_limit.cleanup_interval_secs must be greater than 0");
        }

        Ok(Self {
            port,
            metrics_port,
            logging_level,
            cors_allowed_origins,
            optimize_interval_hours,
            api_keys,
            bearer_token,
            oauth,
            rate_limit,
        })
    }

    /// True when at least one credential kind can succeed.
    pub fn has_credentials(&self) -> bool {
        !self.api_keys.is_empty() || self.bearer_token.is_some() || self.oauth.is_some()
    }
}

/// Parses a logging level string into RequestsLoggingLevel.
/// Uses clap's ValueEnum trait for parsing.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}
