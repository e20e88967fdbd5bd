//! Security gate middleware
//!
//! Runs in front of every `/v1` route: the sliding-window rate limit per
//! client identifier first, then authentication. A request that passes both
//! carries a [`Session`] in its extensions.

use std::net::SocketAddr;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, HeaderMap, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use tracing::{debug, warn};

use super::super::state::ServerState;
use crate::mcp::protocol::{McpError, McpResponse};
use crate::security::RateLimitExceeded;
use crate::server::metrics::{categorize_endpoint, record_auth_attempt, record_rate_limit_hit};
use crate::server::session::Session;

pub const WWW_AUTHENTICATE_VALUE: &str = "Bearer realm=\"MCP Hub\", API-Key";

const RATE_LIMIT_LIMIT_HEADER: &str = "x-ratelimit-limit";
const RATE_LIMIT_REMAINING_HEADER: &str = "x-ratelimit-remaining";
const RATE_LIMIT_RESET_HEADER: &str = "x-ratelimit-reset";

/// Identifier the rate limiter counts a request against, and its kind for
/// the metrics label.
pub fn client_identifier(headers: &HeaderMap, peer: Option<SocketAddr>) -> (String, &'static str) {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    if let Some(ip) = forwarded {
        return (ip.to_string(), "forwarded");
    }

    let real_ip = headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    if let Some(ip) = real_ip {
        return (ip.to_string(), "real_ip");
    }

    match peer {
        Some(addr) => (addr.ip().to_string(), "peer"),
        None => ("unknown".to_string(), "unknown"),
    }
}

fn header_value(value: impl ToString) -> Option<HeaderValue> {
    HeaderValue::from_str(&value.to_string()).ok()
}

pub fn rate_limited_response(exceeded: &RateLimitExceeded) -> Response {
    let retry_after_secs = exceeded.retry_after_secs();
    let body = McpResponse::error(None, McpError::RateLimited { retry_after_secs });
    let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();

    let reset = chrono::Duration::from_std(exceeded.retry_after)
        .ok()
        .and_then(|d| Utc::now().checked_add_signed(d))
        .unwrap_or_else(Utc::now);

    let headers = response.headers_mut();
    if let Some(v) = header_value(retry_after_secs) {
        headers.insert(header::RETRY_AFTER, v);
    }
    if let Some(v) = header_value(exceeded.limit) {
        headers.insert(RATE_LIMIT_LIMIT_HEADER, v);
    }
    headers.insert(RATE_LIMIT_REMAINING_HEADER, HeaderValue::from_static("0"));
    if let Some(v) = header_value(reset.to_rfc3339()) {
        headers.insert(RATE_LIMIT_RESET_HEADER, v);
    }
    response
}

pub fn unauthorized_response() -> Response {
    let body = McpResponse::error(None, McpError::Unauthorized);
    let mut response = (StatusCode::UNAUTHORIZED, Json(body)).into_response();
    response.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static(WWW_AUTHENTICATE_VALUE),
    );
    response
}

pub async fn security_gate(
    State(state): State<ServerState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let (client_id, identifier_type) = client_identifier(request.headers(), peer);

    let limits = &state.config.rate_limit;
    let remaining = match state.rate_limiter.check_and_record(
        &client_id,
        limits.requests_per_window,
        limits.window,
    ) {
        Ok(remaining) => remaining,
        Err(exceeded) => {
            let endpoint = categorize_endpoint(request.uri().path());
            warn!(
                "Rate limit exceeded for {} ({}) on {}",
                client_id, identifier_type, endpoint
            );
            record_rate_limit_hit(endpoint, identifier_type);
            return rate_limited_response(&exceeded);
        }
    };

    let auth = state.authenticator.authenticate(request.headers()).await;
    let method = auth.method.map(|m| m.as_str()).unwrap_or("none");
    record_auth_attempt(method, auth.authenticated);

    let Some(session) = Session::from_auth(auth, client_id) else {
        debug!("Rejected unauthenticated request to {}", request.uri().path());
        return unauthorized_response();
    };
    request.extensions_mut().insert(session);

    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    if let Some(v) = header_value(limits.requests_per_window) {
        headers.insert(RATE_LIMIT_LIMIT_HEADER, v);
    }
    if let Some(v) = header_value(remaining) {
        headers.insert(RATE_LIMIT_REMAINING_HEADER, v);
    }
    response
}
