use super::RequestsLoggingLevel;
use crate::config::{AppConfig, RateLimitSettings};

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub requests_logging_level: RequestsLoggingLevel,
    pub port: u16,
    pub metrics_port: u16,
    pub rate_limit: RateLimitSettings,
    /// Origins allowed by CORS. Empty means no cross-origin access.
    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            requests_logging_level: RequestsLoggingLevel::Path,
            port: 3001,
            metrics_port: 9091,
            rate_limit: RateLimitSettings::default(),
            cors_allowed_origins: Vec::new(),
        }
    }
}

impl From<&AppConfig> for ServerConfig {
    fn from(config: &AppConfig) -> Self {
        ServerConfig {
            requests_logging_level: config.logging_level.clone(),
            port: config.port,
            metrics_port: config.metrics_port,
            rate_limit: config.rate_limit.clone(),
            cors_allowed_origins: config.cors_allowed_origins.clone(),
        }
    }
}
