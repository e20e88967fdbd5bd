//! Shared constants for end-to-end tests
//!
//! When credentials or catalog ids used by the suite change, update only
//! this file.
#![allow(dead_code)]

// ============================================================================
// Credentials
// ============================================================================

/// API key accepted by every test server
pub const TEST_API_KEY: &str = "mcp_e2e_test_key";

/// Subject label the test API key authenticates as
pub const TEST_API_KEY_SUBJECT: &str = "e2e-suite";

/// Shared bearer secret accepted by every test server
pub const TEST_BEARER_TOKEN: &str = "e2e-bearer-secret";

// ============================================================================
// Catalog IDs
// ============================================================================

/// Official connector in the `development` block
pub const GIT_CONNECTOR_ID: &str = "@modelcontextprotocol/git";

/// Messaging connector with a default fallback to Discord
pub const SLACK_CONNECTOR_ID: &str = "@modelcontextprotocol/slack";

/// Fallback of [`SLACK_CONNECTOR_ID`]
pub const DISCORD_CONNECTOR_ID: &str = "@chatbotkit/discord-mcp";

/// Id not present in the catalog
pub const UNKNOWN_CONNECTOR_ID: &str = "@nobody/does-not-exist";

// ============================================================================
// Timeouts
// ============================================================================

/// Maximum time to wait for the server to become ready
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Timeout for individual HTTP requests
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Polling interval while waiting for the server
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 50;

/// OAuth introspection timeout configured on test servers
pub const OAUTH_TIMEOUT_MS: u64 = 300;
