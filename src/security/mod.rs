//! Security Gate
//!
//! Everything a request passes through before it reaches the dispatcher:
//! rate limiting per client identifier, authentication, sanitization and
//! envelope validation. Also holds the helpers used to keep credentials out
//! of the logs.

pub mod auth;
pub mod rate_limit;
pub mod sanitize;

pub use auth::{
    AuthMethod, AuthResult, Authenticator, GoogleTokenInfo, IntrospectionError, TokenInfo,
    TokenIntrospector, SCOPE_READ, SCOPE_WRITE,
};
pub use rate_limit::{RateLimitExceeded, SlidingWindowRateLimiter};
pub use sanitize::{redact_for_logging, redact_headers, sanitize, validate_envelope};

use rand::RngCore;
use sha2::{Digest, Sha256};

pub const API_KEY_PREFIX: &str = "mcp_";

/// A fresh API key: `mcp_` followed by 32 random bytes in hex.
pub fn generate_api_key() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    let hex: String = bytes.iter().map(|b| format!("{:02x}", b)).collect();
    format!("{}{}", API_KEY_PREFIX, hex)
}

/// SHA-256 fingerprint of a key, safe to log or store.
pub fn key_fingerprint(key: &str) -> String {
    format!("sha256:{:x}", Sha256::digest(key.as_bytes()))
}
