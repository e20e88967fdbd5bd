use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Core settings (can override CLI)
    pub port: Option<u16>,
    pub metrics_port: Option<u16>,
    pub logging_level: Option<String>,
    pub optimize_interval_hours: Option<u64>,
    pub cors_allowed_origins: Option<Vec<String>>,

    // Credentials
    /// Subject label -> API key
    pub api_keys: Option<HashMap<String, String>>,
    pub bearer_token: Option<String>,

    // Feature configs
    pub oauth: Option<OAuthConfig>,
    pub rate_limit: Option<RateLimitConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct OAuthConfig {
    pub client_id: Option<String>,
    pub tokeninfo_url: Option<String>,
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct RateLimitConfig {
    pub requests_per_window: Option<u32>,
    pub window_ms: Option<u64>,
    pub cleanup_interval_secs: Option<u64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_full_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
port = 4000
logging_level = "headers"
cors_allowed_origins = ["https://ops.example.com"]

[api_keys]
ops-team = "mcp_abc"
ci = "mcp_def"

[oauth]
client_id = "client.apps.example.com"
timeout_ms = 2500

[rate_limit]
requests_per_window = 120
window_ms = 30000
"#
        )
        .unwrap();

        let config = FileConfig::load(file.path()).unwrap();
        assert_eq!(config.port, Some(4000));
        assert_eq!(config.metrics_port, None);
        assert_eq!(config.logging_level.as_deref(), Some("headers"));
        let keys = config.api_keys.unwrap();
        assert_eq!(keys.get("ops-team").map(String::as_str), Some("mcp_abc"));
        assert_eq!(keys.len(), 2);
        let oauth = config.oauth.unwrap();
        assert_eq!(oauth.client_id.as_deref(), Some("client.apps.example.com"));
        assert_eq!(oauth.tokeninfo_url, None);
        let rate_limit = config.rate_limit.unwrap();
        assert_eq!(rate_limit.requests_per_window, Some(120));
        assert_eq!(rate_limit.cleanup_interval_secs, None);
    }

    #[test]
    fn test_load_empty_file() {
        let file = NamedTempFile::new().unwrap();
        let config = FileConfig::load(file.path()).unwrap();
        assert!(config.port.is_none());
        assert!(config.api_keys.is_none());
    }

    #[test]
    fn test_load_invalid_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "port = \"not a number\"").unwrap();
        let err = FileConfig::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = FileConfig::load(Path::new("/nonexistent/mcp-hub.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
