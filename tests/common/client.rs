//! HTTP client for end-to-end tests
//!
//! Wraps reqwest with the hub's credential headers and JSON-RPC framing.
//!
//! When API routes or request formats change, update only this file.
#![allow(dead_code)]

use super::constants::*;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

#[derive(Debug, Clone)]
enum Credentials {
    None,
    ApiKey(String),
    Bearer(String),
    OAuth(String),
}

/// HTTP test client bound to one set of credentials
pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
    credentials: Credentials,
    next_id: AtomicU64,
}

impl TestClient {
    fn build(base_url: String, credentials: Credentials) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self {
            client,
            base_url,
            credentials,
            next_id: AtomicU64::new(1),
        }
    }

    /// Creates a client that sends no credentials
    pub fn new(base_url: String) -> Self {
        Self::build(base_url, Credentials::None)
    }

    /// Creates a client authenticating with [`TEST_API_KEY`]
    pub fn with_api_key(base_url: String) -> Self {
        Self::build(base_url, Credentials::ApiKey(TEST_API_KEY.to_string()))
    }

    /// Creates a client authenticating with an arbitrary API key
    pub fn with_custom_api_key(base_url: String, key: &str) -> Self {
        Self::build(base_url, Credentials::ApiKey(key.to_string()))
    }

    /// Creates a client authenticating with the shared bearer secret
    pub fn with_bearer(base_url: String) -> Self {
        Self::build(base_url, Credentials::Bearer(TEST_BEARER_TOKEN.to_string()))
    }

    /// Creates a client authenticating with an OAuth access token
    pub fn with_oauth(base_url: String, token: &str) -> Self {
        Self::build(base_url, Credentials::OAuth(token.to_string()))
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.credentials {
            Credentials::None => builder,
            Credentials::ApiKey(key) => builder.header("x-api-key", key),
            Credentials::Bearer(token) => builder.bearer_auth(token),
            Credentials::OAuth(token) => builder.header("x-oauth-token", token),
        }
    }

    /// Credential headers as name/value pairs, for WebSocket handshakes
    pub fn auth_header(&self) -> Option<(&'static str, String)> {
        match &self.credentials {
            Credentials::None => None,
            Credentials::ApiKey(key) => Some(("x-api-key", key.clone())),
            Credentials::Bearer(token) => Some(("authorization", format!("Bearer {}", token))),
            Credentials::OAuth(token) => Some(("x-oauth-token", token.clone())),
        }
    }

    // ========================================================================
    // Public Endpoints
    // ========================================================================

    /// GET /
    pub async fn get_home(&self) -> Response {
        self.client
            .get(format!("{}/", self.base_url))
            .send()
            .await
            .expect("Home request failed")
    }

    // ========================================================================
    // MCP Endpoint
    // ========================================================================

    /// POST /v1/mcp with a raw body
    pub async fn post_mcp_raw(&self, body: &str) -> Response {
        self.authorize(self.client.post(format!("{}/v1/mcp", self.base_url)))
            .header("content-type", "application/json")
            .body(body.to_string())
            .send()
            .await
            .expect("MCP request failed")
    }

    /// POST /v1/mcp with a JSON body
    pub async fn post_mcp(&self, body: &Value) -> Response {
        self.post_mcp_raw(&body.to_string()).await
    }

    /// Sends one JSON-RPC request and returns the decoded response
    ///
    /// # Panics
    ///
    /// Panics unless the server answers 200 with a JSON body.
    pub async fn rpc(&self, method: &str, params: Option<Value>) -> Value {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut body = json!({ "jsonrpc": "2.0", "id": id, "method": method });
        if let Some(params) = params {
            body["params"] = params;
        }

        let response = self.post_mcp(&body).await;
        assert_eq!(response.status(), StatusCode::OK, "{} failed", method);
        let value: Value = response.json().await.expect("Invalid JSON-RPC response");
        assert_eq!(value["id"], id);
        value
    }

    /// tools/call, returning the whole JSON-RPC response
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Value {
        self.rpc(
            "tools/call",
            Some(json!({ "name": name, "arguments": arguments })),
        )
        .await
    }

    /// tools/call on a tool returning JSON, decoded from its text content
    ///
    /// # Panics
    ///
    /// Panics if the call failed or its content is not JSON.
    pub async fn tool_json(&self, name: &str, arguments: Value) -> Value {
        let response = self.call_tool(name, arguments).await;
        assert!(
            response.get("error").is_none(),
            "{} returned an error: {}",
            name,
            response
        );
        let text = response["result"]["content"][0]["text"]
            .as_str()
            .expect("Tool result has no text content");
        serde_json::from_str(text).expect("Tool result is not JSON")
    }

    /// resources/read, returning the decoded JSON of the first content
    pub async fn read_resource(&self, uri: &str) -> Value {
        let response = self.rpc("resources/read", Some(json!({ "uri": uri }))).await;
        let text = response["result"]["contents"][0]["text"]
            .as_str()
            .unwrap_or_else(|| panic!("Resource {} has no text content: {}", uri, response));
        serde_json::from_str(text).expect("Resource content is not JSON")
    }

    // ========================================================================
    // Dashboard Endpoints
    // ========================================================================

    /// GET /v1/dashboard{path}
    pub async fn get_dashboard(&self, path: &str) -> Response {
        self.authorize(
            self.client
                .get(format!("{}/v1/dashboard{}", self.base_url, path)),
        )
        .send()
        .await
        .expect("Dashboard request failed")
    }

    /// POST /v1/dashboard/optimize
    pub async fn optimize(&self) -> Response {
        self.authorize(
            self.client
                .post(format!("{}/v1/dashboard/optimize", self.base_url)),
        )
        .send()
        .await
        .expect("Optimize request failed")
    }

    /// POST /v1/dashboard/usage
    pub async fn report_usage(&self, connector_id: &str, success: bool) -> Response {
        self.authorize(self.client.post(format!("{}/v1/dashboard/usage", self.base_url)))
            .json(&json!({ "connector_id": connector_id, "success": success }))
            .send()
            .await
            .expect("Usage request failed")
    }

    /// POST /v1/dashboard/status
    pub async fn set_status(&self, connector_id: &str, status: &str) -> Response {
        self.authorize(self.client.post(format!("{}/v1/dashboard/status", self.base_url)))
            .json(&json!({ "connector_id": connector_id, "status": status }))
            .send()
            .await
            .expect("Status request failed")
    }

    /// POST /v1/dashboard/fallback
    pub async fn set_fallback(&self, connector_id: &str, fallback: Option<&str>) -> Response {
        self.authorize(self.client.post(format!("{}/v1/dashboard/fallback", self.base_url)))
            .json(&json!({ "connector_id": connector_id, "fallback": fallback }))
            .send()
            .await
            .expect("Fallback request failed")
    }
}
