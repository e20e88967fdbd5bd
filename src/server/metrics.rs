use axum::{http::StatusCode, response::IntoResponse};
use lazy_static::lazy_static;
use prometheus::{
    CounterVec, Encoder, GaugeVec, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};
use std::collections::BTreeMap;
use std::time::Duration;

/// Metric name prefix for all hub metrics
const PREFIX: &str = "mcp_hub";

lazy_static! {
    // Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // HTTP Request Metrics
    pub static ref HTTP_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_http_requests_total"), "Total number of HTTP requests"),
        &["method", "path", "status"]
    ).expect("Failed to create http_requests_total metric");

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            format!("{PREFIX}_http_request_duration_seconds"),
            "HTTP request duration in seconds"
        )
        .buckets(vec![0.001, 0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0]),
        &["method", "path"]
    ).expect("Failed to create http_request_duration_seconds metric");

    // Security Gate Metrics
    pub static ref RATE_LIMIT_HITS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_rate_limit_hits_total"), "Rate limit violations"),
        &["endpoint", "identifier_type"]
    ).expect("Failed to create rate_limit_hits_total metric");

    pub static ref AUTH_ATTEMPTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_auth_attempts_total"), "Authentication attempts"),
        &["method", "outcome"]
    ).expect("Failed to create auth_attempts_total metric");

    // Dispatcher Metrics
    pub static ref TOOL_CALLS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_tool_calls_total"), "MCP tool invocations"),
        &["tool", "outcome"]
    ).expect("Failed to create tool_calls_total metric");

    // Registry Metrics
    pub static ref CONNECTOR_USAGE_REPORTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_connector_usage_reports_total"), "Connector usage reports"),
        &["outcome"]
    ).expect("Failed to create connector_usage_reports_total metric");

    pub static ref CONNECTORS_BY_STATUS: GaugeVec = GaugeVec::new(
        Opts::new(format!("{PREFIX}_connectors"), "Registered connectors by status"),
        &["status"]
    ).expect("Failed to create connectors metric");
}

/// Initialize all metrics and register them with the Prometheus registry
pub fn init_metrics() {
    // Register all metrics - ignore errors if already registered (for tests)
    let _ = REGISTRY.register(Box::new(HTTP_REQUESTS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(RATE_LIMIT_HITS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(AUTH_ATTEMPTS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(TOOL_CALLS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(CONNECTOR_USAGE_REPORTS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(CONNECTORS_BY_STATUS.clone()));

    tracing::info!("Metrics system initialized successfully");
}

/// Maps a request path to a bounded label value.
pub fn categorize_endpoint(path: &str) -> &'static str {
    match path {
        "/" => "home",
        "/v1/mcp" => "mcp",
        "/v1/mcp/ws" => "mcp_ws",
        p if p.starts_with("/v1/dashboard") => "dashboard",
        _ => "other",
    }
}

/// Record an HTTP request
pub fn record_http_request(method: &str, path: &str, status: u16, duration: Duration) {
    let endpoint = categorize_endpoint(path);
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, endpoint, &status.to_string()])
        .inc();

    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, endpoint])
        .observe(duration.as_secs_f64());
}

/// Record a rate limit violation
pub fn record_rate_limit_hit(endpoint: &str, identifier_type: &str) {
    RATE_LIMIT_HITS_TOTAL
        .with_label_values(&[endpoint, identifier_type])
        .inc();
}

/// Record an authentication attempt. `method` is "none" when nothing matched.
pub fn record_auth_attempt(method: &str, success: bool) {
    let outcome = if success { "success" } else { "failure" };
    AUTH_ATTEMPTS_TOTAL
        .with_label_values(&[method, outcome])
        .inc();
}

/// Record a tool call, outcome being "ok", "tool_error" or a JSON-RPC failure
pub fn record_tool_call(tool: &str, outcome: &str) {
    TOOL_CALLS_TOTAL.with_label_values(&[tool, outcome]).inc();
}

pub fn record_usage_report(success: bool) {
    let outcome = if success { "success" } else { "failure" };
    CONNECTOR_USAGE_REPORTS_TOTAL
        .with_label_values(&[outcome])
        .inc();
}

/// Mirror the registry's per-status counts into the gauge
pub fn set_connector_status_counts(counts: &BTreeMap<&'static str, usize>) {
    for (status, count) in counts {
        CONNECTORS_BY_STATUS
            .with_label_values(&[status])
            .set(*count as f64);
    }
}

pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();

    let mut buffer = vec![];
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => {
            let response = String::from_utf8(buffer).unwrap_or_else(|_| String::from(""));
            (StatusCode::OK, response)
        }
        Err(e) => {
            tracing::error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to encode metrics: {}", e),
            )
        }
    }
}
