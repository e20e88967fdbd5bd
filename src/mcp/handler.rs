//! MCP Request Handlers
//!
//! Dispatches JSON-RPC messages arriving over HTTP POST or WebSocket frames.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use futures::{FutureExt, SinkExt, StreamExt};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use super::context::ToolContext;
use super::prompts::{get_prompt, prompt_definitions};
use super::protocol::{
    methods, InitializeParams, InitializeResult, McpError, McpRequest, McpResponse, PingResult,
    PromptsCapability, PromptsGetParams, PromptsListResult, RequestId, ResourcesCapability,
    ResourcesListResult, ResourcesReadParams, ResourcesReadResult, ServerCapabilities, ServerInfo,
    ToolsCallParams, ToolsCapability, ToolsListResult, MCP_PROTOCOL_VERSION,
};
use super::registry::{McpRegistry, ToolName};
use crate::security::{sanitize, validate_envelope, SCOPE_READ};
use crate::server::metrics::{categorize_endpoint, record_rate_limit_hit, record_tool_call};
use crate::server::session::Session;
use crate::server::state::{GuardedMcpState, ServerState};

/// Name reported in `initialize`
pub const SERVER_NAME: &str = "mcp-hub";

const WS_PATH: &str = "/v1/mcp/ws";

/// State shared across MCP requests
pub struct McpState {
    pub registry: Arc<McpRegistry>,
}

/// `POST /v1/mcp`: one JSON-RPC message per request body.
///
/// Envelope errors answer 400, notifications 202 with an empty body,
/// everything else 200.
pub async fn mcp_http_handler(
    session: Session,
    State(server_state): State<ServerState>,
    State(mcp_state): State<GuardedMcpState>,
    body: Bytes,
) -> Response {
    match process_message(&body, &session, &server_state, &mcp_state).await {
        None => StatusCode::ACCEPTED.into_response(),
        Some(response) => {
            let status = match response.error_code() {
                Some(code) if McpError::is_envelope_error(code) => StatusCode::BAD_REQUEST,
                _ => StatusCode::OK,
            };
            (status, Json(response)).into_response()
        }
    }
}

/// `GET /v1/mcp/ws`: one JSON-RPC message per text frame
pub async fn mcp_ws_handler(
    ws: WebSocketUpgrade,
    session: Session,
    State(server_state): State<ServerState>,
    State(mcp_state): State<GuardedMcpState>,
) -> Response {
    info!(
        "MCP WebSocket upgrade for {} via {}",
        session.subject,
        session.method.as_str()
    );

    ws.on_upgrade(move |socket| handle_mcp_socket(socket, session, server_state, mcp_state))
}

/// Handle an established MCP WebSocket connection
async fn handle_mcp_socket(
    socket: WebSocket,
    session: Session,
    server_state: ServerState,
    mcp_state: Arc<McpState>,
) {
    debug!("MCP connection established for {}", session.subject);

    let (mut ws_sink, mut ws_stream) = socket.split();

    while let Some(result) = ws_stream.next().await {
        match result {
            Ok(Message::Text(text)) => {
                let frame = text.as_str().as_bytes();
                let response = match frame_rate_limit(frame, &session, &server_state) {
                    Some(rejection) => Some(rejection),
                    None => process_message(frame, &session, &server_state, &mcp_state).await,
                };

                if let Some(response) = response {
                    match serde_json::to_string(&response) {
                        Ok(json) => {
                            if ws_sink.send(Message::Text(json.into())).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            error!("Failed to serialize MCP response: {}", e);
                        }
                    }
                }
            }
            Ok(Message::Binary(_)) => {
                debug!("Received binary message, ignoring");
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
            Ok(Message::Close(_)) => {
                debug!("Received close frame");
                break;
            }
            Err(e) => {
                debug!("WebSocket error: {}", e);
                break;
            }
        }
    }

    debug!("MCP connection closed for {}", session.subject);
}

/// Charges one WebSocket frame to the caller's rate limit, like the gate
/// does for every HTTP request. Returns the rejection to send back.
fn frame_rate_limit(
    frame: &[u8],
    session: &Session,
    server_state: &ServerState,
) -> Option<McpResponse> {
    let limits = &server_state.config.rate_limit;
    let exceeded = server_state
        .rate_limiter
        .check_and_record(&session.client_id, limits.requests_per_window, limits.window)
        .err()?;

    warn!(
        "Rate limit exceeded for {} on WebSocket frame",
        session.client_id
    );
    record_rate_limit_hit(categorize_endpoint(WS_PATH), "session");

    let id = serde_json::from_slice::<Value>(frame)
        .ok()
        .and_then(|body| RequestId::from_envelope(&body));
    Some(McpResponse::error(
        id,
        McpError::RateLimited {
            retry_after_secs: exceeded.retry_after_secs(),
        },
    ))
}

/// Runs one raw message through sanitization, envelope validation and
/// dispatch. `None` means the message gets no response.
pub async fn process_message(
    body: &[u8],
    session: &Session,
    server_state: &ServerState,
    mcp_state: &McpState,
) -> Option<McpResponse> {
    let raw: Value = match serde_json::from_slice(body) {
        Ok(value) => value,
        Err(e) => {
            return Some(McpResponse::error(
                None,
                McpError::ParseError(e.to_string()),
            ));
        }
    };

    let body = sanitize(raw);
    if !validate_envelope(&body) {
        return Some(McpResponse::error(
            RequestId::from_envelope(&body),
            McpError::InvalidRequest("expected a JSON-RPC 2.0 envelope".to_string()),
        ));
    }

    let request: McpRequest = match serde_json::from_value(body) {
        Ok(req) => req,
        Err(e) => {
            return Some(McpResponse::error(
                None,
                McpError::InvalidRequest(e.to_string()),
            ));
        }
    };

    if request.is_notification() {
        debug!("Notification {} from {}", request.method, session.subject);
        return None;
    }

    let request_id = request.id.clone();

    let result = match request.method.as_str() {
        methods::INITIALIZE => handle_initialize(&request, session),
        methods::PING => to_value(&PingResult {}),
        methods::TOOLS_LIST => handle_tools_list(session, mcp_state),
        methods::TOOLS_CALL => handle_tools_call(&request, session, server_state, mcp_state).await,
        methods::RESOURCES_LIST => handle_resources_list(session, mcp_state),
        methods::RESOURCES_READ => {
            handle_resources_read(&request, session, server_state, mcp_state).await
        }
        methods::PROMPTS_LIST => handle_prompts_list(session),
        methods::PROMPTS_GET => handle_prompts_get(&request, session, server_state),
        methods::SHUTDOWN => {
            debug!("Shutdown requested by {}", session.subject);
            return None;
        }
        other => Err(McpError::MethodNotFound(other.to_string())),
    };

    Some(match result {
        Ok(value) => McpResponse::success(request_id, value),
        Err(error) => McpResponse::error(request_id, error),
    })
}

fn to_value<T: serde::Serialize>(value: &T) -> Result<Value, McpError> {
    serde_json::to_value(value).map_err(|e| McpError::InternalError(e.to_string()))
}

fn parse_params<T: DeserializeOwned>(params: Option<Value>) -> Result<Option<T>, McpError> {
    params
        .map(serde_json::from_value)
        .transpose()
        .map_err(|e| McpError::InvalidParams(e.to_string()))
}

fn server_version() -> String {
    format!("{}-{}", env!("APP_VERSION"), env!("GIT_HASH"))
}

fn handle_initialize(request: &McpRequest, session: &Session) -> Result<Value, McpError> {
    let params: Option<InitializeParams> = parse_params(request.params.clone())?;
    if let Some(client) = params.as_ref().and_then(|p| p.client_info.as_ref()) {
        info!(
            "MCP client {} {} initialized by {}",
            client.name,
            client.version.as_deref().unwrap_or("(unknown version)"),
            session.subject
        );
    }

    to_value(&InitializeResult {
        protocol_version: MCP_PROTOCOL_VERSION.to_string(),
        capabilities: ServerCapabilities {
            tools: Some(ToolsCapability { list_changed: None }),
            resources: Some(ResourcesCapability {
                subscribe: Some(false),
                list_changed: None,
            }),
            prompts: Some(PromptsCapability { list_changed: None }),
        },
        server_info: ServerInfo {
            name: SERVER_NAME.to_string(),
            version: server_version(),
        },
    })
}

fn handle_tools_list(session: &Session, mcp_state: &McpState) -> Result<Value, McpError> {
    let tools = mcp_state.registry.get_available_tools(&session.scopes);
    to_value(&ToolsListResult { tools })
}

async fn handle_tools_call(
    request: &McpRequest,
    session: &Session,
    server_state: &ServerState,
    mcp_state: &McpState,
) -> Result<Value, McpError> {
    let params: ToolsCallParams = parse_params(request.params.clone())?
        .ok_or_else(|| McpError::InvalidParams("Missing params".to_string()))?;

    let unknown = || McpError::MethodNotFound(format!("Unknown tool: {}", params.name));
    let name: ToolName = params.name.parse().map_err(|_| unknown())?;
    let tool = mcp_state.registry.get_tool(name).ok_or_else(unknown)?;

    if !tool.is_allowed(&session.scopes) {
        warn!("{} lacks scope for tool {}", session.subject, name);
        record_tool_call(name.as_str(), "permission_denied");
        return Err(McpError::PermissionDenied(format!(
            "tool {} requires scope {}",
            name,
            tool.scopes.join(", ")
        )));
    }

    let ctx = ToolContext::new(session.clone(), server_state);
    let arguments = params.arguments.unwrap_or_else(|| serde_json::json!({}));

    let outcome = AssertUnwindSafe((tool.handler)(ctx, arguments))
        .catch_unwind()
        .await;

    match outcome {
        Ok(Ok(result)) => {
            let label = if result.is_error == Some(true) {
                "tool_error"
            } else {
                "ok"
            };
            record_tool_call(name.as_str(), label);
            to_value(&result)
        }
        Ok(Err(err)) => {
            record_tool_call(name.as_str(), "error");
            Err(err)
        }
        Err(_) => {
            error!("Tool {} panicked", name);
            record_tool_call(name.as_str(), "panic");
            Err(McpError::InternalError(format!("tool {} failed", name)))
        }
    }
}

fn handle_resources_list(session: &Session, mcp_state: &McpState) -> Result<Value, McpError> {
    let resources = mcp_state.registry.get_available_resources(&session.scopes);
    to_value(&ResourcesListResult { resources })
}

async fn handle_resources_read(
    request: &McpRequest,
    session: &Session,
    server_state: &ServerState,
    mcp_state: &McpState,
) -> Result<Value, McpError> {
    let params: ResourcesReadParams = parse_params(request.params.clone())?
        .ok_or_else(|| McpError::InvalidParams("Missing params".to_string()))?;

    let resource = mcp_state
        .registry
        .find_resource(&params.uri, &session.scopes)
        .ok_or_else(|| McpError::ResourceNotFound(params.uri.clone()))?;

    let ctx = ToolContext::new(session.clone(), server_state);
    let contents = (resource.handler)(ctx, params.uri).await?;

    to_value(&ResourcesReadResult { contents })
}

fn handle_prompts_list(session: &Session) -> Result<Value, McpError> {
    let prompts = if session.has_scope(SCOPE_READ) {
        prompt_definitions()
    } else {
        Vec::new()
    };
    to_value(&PromptsListResult { prompts })
}

fn handle_prompts_get(
    request: &McpRequest,
    session: &Session,
    server_state: &ServerState,
) -> Result<Value, McpError> {
    if !session.has_scope(SCOPE_READ) {
        return Err(McpError::PermissionDenied(format!(
            "prompts require scope {}",
            SCOPE_READ
        )));
    }
    let params: PromptsGetParams = parse_params(request.params.clone())?
        .ok_or_else(|| McpError::InvalidParams("Missing params".to_string()))?;

    let ctx = ToolContext::new(session.clone(), server_state);
    to_value(&get_prompt(&ctx, &params)?)
}

/// Create the MCP state with registered tools and resources.
///
/// Fails when a tool name has no handler.
pub fn create_mcp_state() -> anyhow::Result<McpState> {
    let mut registry = McpRegistry::new();

    super::tools::register_all_tools(&mut registry);
    super::resources::register_all_resources(&mut registry);
    registry.ensure_complete()?;

    info!(
        "MCP registry initialized with {} tools and {} resources",
        registry.tool_count(),
        registry.resource_count()
    );

    Ok(McpState {
        registry: Arc::new(registry),
    })
}
