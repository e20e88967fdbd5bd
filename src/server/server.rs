use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    extract::State,
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tracing::{error, info};

use super::dashboard::dashboard_routes;
use super::metrics::metrics_handler;
use super::{
    cors_layer, log_requests, security_gate, security_header_layers, state::ServerState,
};
use crate::mcp::{mcp_http_handler, mcp_ws_handler};

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub hash: String,
    pub connectors: usize,
    pub active_connectors: usize,
    pub categories: usize,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    let (connectors, active_connectors) = {
        let registry = state.registry();
        (
            registry.len(),
            registry.entries().filter(|e| e.is_active()).count(),
        )
    };
    Json(ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        hash: state.hash.clone(),
        connectors,
        active_connectors,
        categories: state.catalog.categories().len(),
    })
}

pub fn make_app(state: ServerState) -> Router {
    let v1_routes: Router<ServerState> = Router::new()
        .route("/mcp", post(mcp_http_handler))
        .route("/mcp/ws", get(mcp_ws_handler))
        .nest("/dashboard", dashboard_routes())
        .layer(middleware::from_fn_with_state(state.clone(), security_gate));

    let mut app: Router = Router::new()
        .route("/", get(home))
        .nest("/v1", v1_routes)
        .with_state(state.clone());

    for layer in security_header_layers() {
        app = app.layer(layer);
    }
    app.layer(cors_layer(&state.config.cors_allowed_origins))
        .layer(middleware::from_fn_with_state(state, log_requests))
}

fn make_metrics_app() -> Router {
    Router::new().route("/metrics", get(metrics_handler))
}

/// Serves the hub and, on its own port, the Prometheus endpoint.
pub async fn run_server(state: ServerState) -> Result<()> {
    let port = state.config.port;
    let metrics_port = state.config.metrics_port;
    let app = make_app(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;
    let metrics_listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", metrics_port))
        .await
        .with_context(|| format!("Failed to bind metrics port {}", metrics_port))?;

    tokio::spawn(async move {
        info!("Metrics available at port {}!", metrics_port);
        if let Err(err) = axum::serve(metrics_listener, make_metrics_app()).await {
            error!("Metrics server stopped: {}", err);
        }
    });

    info!("Ready to serve at port {}!", port);
    Ok(axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::SimulatedExecutor;
    use crate::security::Authenticator;
    use crate::server::{ServerConfig, WWW_AUTHENTICATE_VALUE};
    use crate::catalog::Catalog;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use std::collections::HashMap;
    use std::sync::Arc;
    use tower::ServiceExt;

    const TEST_KEY: &str = "test-key-123";

    fn app_with(config: ServerConfig) -> Router {
        let keys = HashMap::from([(TEST_KEY.to_string(), "tester".to_string())]);
        let state = ServerState::new(
            config,
            Catalog::builtin(),
            Authenticator::new(&keys, None, None),
            Arc::new(SimulatedExecutor),
        )
        .unwrap();
        make_app(state)
    }

    fn app() -> Router {
        app_with(ServerConfig::default())
    }

    fn mcp_request(key: Option<&str>, body: &str) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/v1/mcp")
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(key) = key {
            builder = builder.header("x-api-key", key);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_format_uptime() {
        assert_eq!(format_uptime(Duration::from_secs(0)), "0d 00:00:00");
        assert_eq!(format_uptime(Duration::from_secs(90_061)), "1d 01:01:01");
    }

    #[tokio::test]
    async fn home_is_public_and_reports_catalog() {
        let response = app()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::X_FRAME_OPTIONS], "DENY");
        assert!(response.headers().contains_key("x-request-id"));

        let body = body_json(response).await;
        assert_eq!(body["connectors"], Catalog::builtin().len());
        assert_eq!(body["active_connectors"], Catalog::builtin().len());
        assert_eq!(body["categories"], 11);
    }

    #[tokio::test]
    async fn responds_unauthorized_on_protected_routes() {
        let app = app();
        for (method, route) in [
            ("POST", "/v1/mcp"),
            ("GET", "/v1/dashboard"),
            ("GET", "/v1/dashboard/export"),
            ("POST", "/v1/dashboard/optimize"),
        ] {
            let request = Request::builder()
                .method(method)
                .uri(route)
                .body(Body::empty())
                .unwrap();
            let response = app.clone().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", route);
            assert_eq!(
                response.headers()[header::WWW_AUTHENTICATE],
                WWW_AUTHENTICATE_VALUE
            );
        }
    }

    #[tokio::test]
    async fn mcp_ping_with_api_key() {
        let response = app()
            .oneshot(mcp_request(
                Some(TEST_KEY),
                r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-ratelimit-limit"));
        assert!(response.headers().contains_key("x-ratelimit-remaining"));

        let body = body_json(response).await;
        assert_eq!(body["id"], 1);
        assert!(body["result"].is_object());
    }

    #[tokio::test]
    async fn mcp_parse_error_is_bad_request() {
        let response = app()
            .oneshot(mcp_request(Some(TEST_KEY), "{not json"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["code"], -32700);
    }

    #[tokio::test]
    async fn mcp_invalid_utf8_body_is_bad_request() {
        let mut body = br#"{"jsonrpc":"2.0","id":1,"method":"ping","params":{"x":""#.to_vec();
        body.push(0xFF);
        body.extend_from_slice(br#""}}"#);

        let request = Request::builder()
            .method("POST")
            .uri("/v1/mcp")
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-api-key", TEST_KEY)
            .body(Body::from(body))
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["code"], -32700);
    }

    #[tokio::test]
    async fn mcp_notification_is_accepted_without_body() {
        let response = app()
            .oneshot(mcp_request(
                Some(TEST_KEY),
                r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn rate_limit_rejects_after_quota() {
        let mut config = ServerConfig::default();
        config.rate_limit.requests_per_window = 2;
        let app = app_with(config);

        for _ in 0..2 {
            let response = app
                .clone()
                .oneshot(mcp_request(
                    Some(TEST_KEY),
                    r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#,
                ))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        let response = app
            .oneshot(mcp_request(
                Some(TEST_KEY),
                r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(response.headers().contains_key(header::RETRY_AFTER));
        assert_eq!(body_json(response).await["error"]["code"], -32000);
    }

    #[tokio::test]
    async fn metrics_app_serves_prometheus_text() {
        crate::server::metrics::init_metrics();
        let response = make_metrics_app()
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn dashboard_unused_defaults_to_thirty_days() {
        let request = Request::builder()
            .uri("/v1/dashboard/unused")
            .header("x-api-key", TEST_KEY)
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["days"], 30);
        assert_eq!(body["count"], Catalog::builtin().len());
    }

    #[tokio::test]
    async fn dashboard_usage_records_report() {
        let app = app();
        let request = Request::builder()
            .method("POST")
            .uri("/v1/dashboard/usage")
            .header("x-api-key", TEST_KEY)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                r#"{"connector_id":"@modelcontextprotocol/git","success":true}"#,
            ))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["recorded"], true);

        let request = Request::builder()
            .uri("/v1/dashboard/unused?days=1")
            .header("x-api-key", TEST_KEY)
            .body(Body::empty())
            .unwrap();
        let body = body_json(app.oneshot(request).await.unwrap()).await;
        assert_eq!(body["count"], Catalog::builtin().len() - 1);
    }
}
