//! Request authentication
//!
//! Three credential kinds are tried in a fixed order and the first one that
//! succeeds wins:
//!
//! 1. `x-api-key` against the configured key set
//! 2. `authorization: Bearer <token>` against the shared bearer secret
//! 3. `x-oauth-token`, introspected by the configured OAuth provider
//!
//! A credential that fails does not end the search; only the final outcome
//! is reported, with a generic message.

use async_trait::async_trait;
use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

pub const SCOPE_READ: &str = "read";
pub const SCOPE_WRITE: &str = "write";

pub const API_KEY_HEADER: &str = "x-api-key";
pub const OAUTH_TOKEN_HEADER: &str = "x-oauth-token";

/// Subject reported for callers authenticated with the shared bearer secret.
pub const BEARER_SUBJECT: &str = "bearer-user";

pub const AUTHENTICATION_REQUIRED: &str = "Authentication required";

pub const DEFAULT_TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AuthMethod {
    #[serde(rename = "api_key")]
    ApiKey,
    #[serde(rename = "bearer")]
    Bearer,
    #[serde(rename = "oauth")]
    OAuth,
}

impl AuthMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            AuthMethod::ApiKey => "api_key",
            AuthMethod::Bearer => "bearer",
            AuthMethod::OAuth => "oauth",
        }
    }
}

/// Outcome of authenticating one request. Never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthResult {
    pub authenticated: bool,
    pub subject: Option<String>,
    pub scopes: Vec<String>,
    pub error: Option<String>,
    pub method: Option<AuthMethod>,
}

impl AuthResult {
    pub fn success(method: AuthMethod, subject: impl Into<String>, scopes: Vec<String>) -> Self {
        Self {
            authenticated: true,
            subject: Some(subject.into()),
            scopes,
            error: None,
            method: Some(method),
        }
    }

    pub fn failure() -> Self {
        Self {
            authenticated: false,
            subject: None,
            scopes: Vec::new(),
            error: Some(AUTHENTICATION_REQUIRED.to_string()),
            method: None,
        }
    }

    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.iter().any(|s| s == scope)
    }
}

fn full_scopes() -> Vec<String> {
    vec![SCOPE_READ.to_string(), SCOPE_WRITE.to_string()]
}

/// Identity returned by a successful token introspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenInfo {
    pub subject: String,
    pub scopes: Vec<String>,
}

#[derive(Debug, Error)]
pub enum IntrospectionError {
    #[error("Token introspection request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Token rejected by provider (HTTP {0})")]
    Rejected(u16),
    #[error("Token info has no subject")]
    MissingSubject,
}

/// Delegated validation of opaque OAuth tokens.
#[async_trait]
pub trait TokenIntrospector: Send + Sync {
    async fn introspect(&self, token: &str) -> Result<TokenInfo, IntrospectionError>;
}

#[derive(Debug, Deserialize)]
struct TokenInfoResponse {
    email: Option<String>,
    sub: Option<String>,
    scope: Option<String>,
}

impl TokenInfoResponse {
    fn into_token_info(self) -> Result<TokenInfo, IntrospectionError> {
        let subject = self
            .email
            .or(self.sub)
            .ok_or(IntrospectionError::MissingSubject)?;
        let scopes = match self.scope {
            Some(scope) if !scope.trim().is_empty() => {
                scope.split_whitespace().map(str::to_string).collect()
            }
            _ => vec![SCOPE_READ.to_string()],
        };
        Ok(TokenInfo { subject, scopes })
    }
}

/// Introspects tokens against a Google-style `tokeninfo` endpoint.
pub struct GoogleTokenInfo {
    client: reqwest::Client,
    url: String,
}

impl GoogleTokenInfo {
    pub fn new(url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl TokenIntrospector for GoogleTokenInfo {
    async fn introspect(&self, token: &str) -> Result<TokenInfo, IntrospectionError> {
        let response = self
            .client
            .post(&self.url)
            .form(&[("access_token", token)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(IntrospectionError::Rejected(status.as_u16()));
        }

        let body: TokenInfoResponse = response.json().await?;
        body.into_token_info()
    }
}

fn digest(secret: &str) -> Vec<u8> {
    Sha256::digest(secret.as_bytes()).to_vec()
}

/// Checks request credentials. Secrets are held and compared as SHA-256 digests.
pub struct Authenticator {
    api_keys: HashMap<Vec<u8>, String>,
    bearer_token: Option<Vec<u8>>,
    introspector: Option<Arc<dyn TokenIntrospector>>,
}

impl Authenticator {
    /// `api_keys` maps each key to the subject label it authenticates as.
    pub fn new(
        api_keys: &HashMap<String, String>,
        bearer_token: Option<&str>,
        introspector: Option<Arc<dyn TokenIntrospector>>,
    ) -> Self {
        Self {
            api_keys: api_keys
                .iter()
                .filter(|(key, _)| !key.is_empty())
                .map(|(key, subject)| (digest(key), subject.clone()))
                .collect(),
            bearer_token: bearer_token.filter(|t| !t.is_empty()).map(digest),
            introspector,
        }
    }

    pub fn api_key_count(&self) -> usize {
        self.api_keys.len()
    }

    pub fn has_bearer_token(&self) -> bool {
        self.bearer_token.is_some()
    }

    pub fn has_oauth(&self) -> bool {
        self.introspector.is_some()
    }

    pub async fn authenticate(&self, headers: &HeaderMap) -> AuthResult {
        if let Some(key) = header_str(headers, API_KEY_HEADER) {
            if let Some(subject) = self.api_keys.get(&digest(key)) {
                return AuthResult::success(AuthMethod::ApiKey, subject.clone(), full_scopes());
            }
            debug!("Unknown API key presented");
        }

        if let Some(token) = header_str(headers, "authorization")
            .and_then(|value| value.strip_prefix("Bearer "))
        {
            if self.bearer_token.as_deref() == Some(digest(token).as_slice()) {
                return AuthResult::success(AuthMethod::Bearer, BEARER_SUBJECT, full_scopes());
            }
            debug!("Invalid bearer token presented");
        }

        if let Some(introspector) = &self.introspector {
            if let Some(token) = header_str(headers, OAUTH_TOKEN_HEADER) {
                match introspector.introspect(token).await {
                    Ok(info) => {
                        return AuthResult::success(AuthMethod::OAuth, info.subject, info.scopes)
                    }
                    Err(err) => warn!("OAuth token validation failed: {}", err),
                }
            }
        }

        AuthResult::failure()
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
