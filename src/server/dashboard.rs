//! REST view of the registry for operators.
//!
//! Every route sits behind the security gate. Mutating routes additionally
//! need the `write` scope.

use std::collections::BTreeMap;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::metrics;
use super::session::Session;
use super::state::ServerState;
use crate::registry::{
    block_names, ConnectorStatus, ExportRow, RegistryEntry, RegistryError, ValidationReport,
};
use crate::security::SCOPE_WRITE;

const DEFAULT_UNUSED_DAYS: u32 = 30;

#[derive(Serialize)]
struct BlockSummary {
    block: &'static str,
    total: usize,
    active: usize,
}

#[derive(Serialize)]
struct DashboardSummary {
    total: usize,
    by_status: BTreeMap<&'static str, usize>,
    validation: ValidationReport,
    blocks: Vec<BlockSummary>,
}

#[derive(Serialize)]
struct ExportResponse {
    data: Vec<ExportRow>,
    timestamp: String,
}

#[derive(Deserialize, Debug)]
struct UnusedQuery {
    days: Option<u32>,
}

#[derive(Serialize)]
struct UnusedResponse {
    days: u32,
    count: usize,
    connectors: Vec<RegistryEntry>,
}

#[derive(Deserialize, Debug)]
struct UsageBody {
    connector_id: String,
    success: bool,
}

#[derive(Serialize)]
struct UsageResponse {
    recorded: bool,
}

#[derive(Deserialize, Debug)]
struct StatusBody {
    connector_id: String,
    status: ConnectorStatus,
}

#[derive(Deserialize, Debug)]
struct FallbackBody {
    connector_id: String,
    #[serde(default)]
    fallback: Option<String>,
}

fn registry_error_response(err: RegistryError) -> Response {
    let status = match err {
        RegistryError::UnknownConnector(_) => StatusCode::NOT_FOUND,
        RegistryError::SelfFallback(_) => StatusCode::BAD_REQUEST,
    };
    (status, err.to_string()).into_response()
}

fn block_summaries(state: &ServerState) -> Vec<BlockSummary> {
    let registry = state.registry();
    block_names()
        .map(|block| {
            let members = registry.get_by_block(block);
            BlockSummary {
                block,
                total: members.len(),
                active: members.iter().filter(|e| e.is_active()).count(),
            }
        })
        .collect()
}

/// GET / - Status counts, validation findings and block coverage
async fn get_summary(_session: Session, State(state): State<ServerState>) -> impl IntoResponse {
    let (total, by_status, validation) = {
        let registry = state.registry();
        (registry.len(), registry.status_counts(), registry.validate())
    };
    Json(DashboardSummary {
        total,
        by_status,
        validation,
        blocks: block_summaries(&state),
    })
}

/// GET /export - Flattened rows of every entry
async fn get_export(_session: Session, State(state): State<ServerState>) -> impl IntoResponse {
    let data = state.registry().export();
    Json(ExportResponse {
        data,
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// GET /validate - Health findings
async fn get_validation(_session: Session, State(state): State<ServerState>) -> impl IntoResponse {
    let report = state.registry().validate();
    Json(report)
}

/// GET /blocks - Member and active counts per block
async fn get_blocks(_session: Session, State(state): State<ServerState>) -> impl IntoResponse {
    Json(block_summaries(&state))
}

/// GET /unused?days=N - Entries idle for at least N days
async fn get_unused(
    _session: Session,
    State(state): State<ServerState>,
    Query(query): Query<UnusedQuery>,
) -> impl IntoResponse {
    let days = query.days.unwrap_or(DEFAULT_UNUSED_DAYS);
    let connectors: Vec<RegistryEntry> = state
        .registry()
        .get_unused(days)
        .into_iter()
        .cloned()
        .collect();
    Json(UnusedResponse {
        days,
        count: connectors.len(),
        connectors,
    })
}

/// POST /optimize - Deactivate long-unused entries
async fn post_optimize(session: Session, State(state): State<ServerState>) -> Response {
    if !session.has_scope(SCOPE_WRITE) {
        return StatusCode::FORBIDDEN.into_response();
    }

    let report = {
        let mut registry = state.registry();
        let report = registry.optimize();
        metrics::set_connector_status_counts(&registry.status_counts());
        report
    };
    info!(
        "Dashboard optimization by {} deactivated {} connectors",
        session.subject, report.deactivated
    );
    Json(report).into_response()
}

/// POST /usage - Record one call outcome
async fn post_usage(
    session: Session,
    State(state): State<ServerState>,
    Json(body): Json<UsageBody>,
) -> Response {
    if !session.has_scope(SCOPE_WRITE) {
        return StatusCode::FORBIDDEN.into_response();
    }

    let recorded = {
        let mut registry = state.registry();
        let recorded = registry.record_usage(&body.connector_id, body.success);
        if recorded {
            metrics::record_usage_report(body.success);
            metrics::set_connector_status_counts(&registry.status_counts());
        }
        recorded
    };
    Json(UsageResponse { recorded }).into_response()
}

/// POST /status - Override one connector's status
async fn post_status(
    session: Session,
    State(state): State<ServerState>,
    Json(body): Json<StatusBody>,
) -> Response {
    if !session.has_scope(SCOPE_WRITE) {
        return StatusCode::FORBIDDEN.into_response();
    }

    let mut registry = state.registry();
    if let Err(err) = registry.set_status(&body.connector_id, body.status) {
        return registry_error_response(err);
    }
    metrics::set_connector_status_counts(&registry.status_counts());
    info!(
        "{} set {} to {}",
        session.subject, body.connector_id, body.status
    );
    match registry.get(&body.connector_id) {
        Some(entry) => Json(entry.clone()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// POST /fallback - Set or clear one connector's fallback
async fn post_fallback(
    session: Session,
    State(state): State<ServerState>,
    Json(body): Json<FallbackBody>,
) -> Response {
    if !session.has_scope(SCOPE_WRITE) {
        return StatusCode::FORBIDDEN.into_response();
    }

    let mut registry = state.registry();
    if let Err(err) = registry.set_fallback(&body.connector_id, body.fallback.as_deref()) {
        return registry_error_response(err);
    }
    match registry.get(&body.connector_id) {
        Some(entry) => Json(entry.clone()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Routes mounted under `/v1/dashboard`:
/// - GET /
/// - GET /export
/// - GET /validate
/// - GET /blocks
/// - GET /unused
/// - POST /optimize
/// - POST /usage
/// - POST /status
/// - POST /fallback
pub fn dashboard_routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(get_summary))
        .route("/export", get(get_export))
        .route("/validate", get(get_validation))
        .route("/blocks", get(get_blocks))
        .route("/unused", get(get_unused))
        .route("/optimize", post(post_optimize))
        .route("/usage", post(post_usage))
        .route("/status", post(post_status))
        .route("/fallback", post(post_fallback))
}
