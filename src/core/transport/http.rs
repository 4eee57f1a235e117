//! HTTP transport implementation.
//!
//! Server-sent events carry everything from server to client; clients send
//! JSON-RPC messages with POST requests addressed to their own session:
//!
//! 1. `GET <sse_path>` opens a stream. The first event is `endpoint`, whose
//!    data is `<message_path>?sessionId=<id>`.
//! 2. `POST <message_path>?sessionId=<id>` is answered with `202 Accepted`;
//!    the JSON-RPC response arrives as a `message` event on that session's
//!    stream and nowhere else.
//!
//! Every stream is an independent session attached to the discovery
//! notifier until the client goes away.

use std::convert::Infallible;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use axum::{
    Json, Router,
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::{get, post},
};
use futures::Stream;
use rmcp::{ErrorData as McpError, model::JsonObject};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc::{self, error::TrySendError};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{debug, info, instrument, warn};

use super::{
    SessionId, SessionRegistry, SessionSink, TransportError, TransportResult, config::HttpConfig,
};
use crate::core::McpServer;

/// Events buffered per session before a stalled client is dropped.
const SESSION_QUEUE_CAPACITY: usize = 64;

/// HTTP transport handler.
pub struct HttpTransport {
    config: HttpConfig,
}

/// JSON-RPC request structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

/// JSON-RPC response structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC error structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcResponse {
    /// Create a success response.
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response.
    pub fn error(id: Option<Value>, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
                data: None,
            }),
        }
    }

    /// Carry an MCP protocol error, data included.
    pub fn from_mcp_error(id: Option<Value>, err: McpError) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code: err.code.0,
                message: err.message.into_owned(),
                data: err.data,
            }),
        }
    }

    /// Method not found error.
    pub fn method_not_found(id: Option<Value>) -> Self {
        Self::error(id, -32601, "Method not found")
    }

    /// Invalid request error.
    pub fn invalid_request(id: Option<Value>) -> Self {
        Self::error(id, -32600, "Invalid Request")
    }

    /// Invalid params error.
    pub fn invalid_params(id: Option<Value>, msg: impl Into<String>) -> Self {
        Self::error(id, -32602, msg)
    }

    /// Internal error.
    pub fn internal_error(id: Option<Value>, msg: impl Into<String>) -> Self {
        Self::error(id, -32603, msg)
    }
}

/// One event queued for a session's stream.
#[derive(Debug)]
struct OutboundMessage {
    event: &'static str,
    data: String,
}

impl OutboundMessage {
    fn endpoint(url: String) -> Self {
        Self {
            event: "endpoint",
            data: url,
        }
    }

    fn message(data: String) -> Self {
        Self {
            event: "message",
            data,
        }
    }

    fn into_event(self) -> Event {
        Event::default().event(self.event).data(self.data)
    }
}

/// A single SSE client connection.
///
/// The outbound queue is bounded. A client that lets it fill up is treated
/// as gone.
#[derive(Debug)]
pub struct SseSession {
    id: SessionId,
    tx: mpsc::Sender<OutboundMessage>,
    overflowed: AtomicBool,
}

impl SseSession {
    fn new(id: SessionId, tx: mpsc::Sender<OutboundMessage>) -> Self {
        Self {
            id,
            tx,
            overflowed: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Whether the client's stream has gone away or stopped reading.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed() || self.overflowed.load(Ordering::SeqCst)
    }

    fn send(&self, message: OutboundMessage) -> TransportResult<()> {
        if self.overflowed.load(Ordering::SeqCst) {
            return Err(TransportError::SessionFull(self.id.to_string()));
        }
        self.tx.try_send(message).map_err(|e| match e {
            TrySendError::Full(_) => {
                self.overflowed.store(true, Ordering::SeqCst);
                TransportError::SessionFull(self.id.to_string())
            }
            TrySendError::Closed(_) => TransportError::SessionClosed(self.id.to_string()),
        })
    }

    fn send_response(&self, response: &JsonRpcResponse) -> TransportResult<()> {
        let data = serde_json::to_string(response)?;
        self.send(OutboundMessage::message(data))
    }
}

#[async_trait]
impl SessionSink for SseSession {
    async fn notify_tool_list_changed(&self) -> Result<(), TransportError> {
        let notification = serde_json::json!({
            "jsonrpc": "2.0",
            "method": "notifications/tools/list_changed",
        });
        self.send(OutboundMessage::message(notification.to_string()))
    }
}

/// Detaches a session once its event stream is dropped.
struct SessionGuard {
    id: SessionId,
    state: AppState,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let id = self.id.clone();
        let state = self.state.clone();
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                state.detach_session(&id).await;
                info!(session = %id, "SSE client disconnected");
            });
        }
    }
}

/// Application state shared across HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// The MCP server instance.
    server: McpServer,
    /// Live SSE sessions keyed by id.
    sessions: Arc<SessionRegistry<SseSession>>,
    config: Arc<HttpConfig>,
}

impl AppState {
    pub fn new(server: McpServer, config: HttpConfig) -> Self {
        Self {
            server,
            sessions: Arc::new(SessionRegistry::new()),
            config: Arc::new(config),
        }
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.len().await
    }

    /// Forget a session in both the HTTP and the discovery registries.
    async fn detach_session(&self, id: &SessionId) {
        self.sessions.detach(id).await;
        self.server.notifier().detach(id).await;
    }
}

/// Query string of a POSTed message.
#[derive(Debug, Deserialize)]
struct MessageQuery {
    #[serde(rename = "sessionId")]
    session_id: Option<String>,
}

impl HttpTransport {
    /// Create a new HTTP transport with the given config.
    pub fn new(config: HttpConfig) -> Self {
        Self { config }
    }

    /// Get the bind address.
    pub fn address(&self) -> String {
        format!("{}:{}", self.config.host, self.config.port)
    }

    /// Build the router serving the SSE and message endpoints.
    pub fn router(state: AppState) -> Router {
        let config = state.config.clone();

        let mut app = Router::new()
            .route(&config.sse_path, get(handle_sse))
            .route(&config.message_path, post(handle_message))
            .route("/health", get(health_check))
            .route("/", get(root_handler))
            .with_state(state)
            .layer(TraceLayer::new_for_http());

        // Add CORS if enabled
        if config.enable_cors {
            let cors = CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any);
            app = app.layer(cors);
        }

        app
    }

    /// Run the HTTP transport.
    pub async fn run(self, server: McpServer) -> TransportResult<()> {
        let addr = self.address();
        let sse_path = self.config.sse_path.clone();
        let message_path = self.config.message_path.clone();
        let cors_status = if self.config.enable_cors {
            "enabled"
        } else {
            "disabled"
        };

        let app = Self::router(AppState::new(server, self.config));

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| TransportError::bind(&addr, e))?;

        info!(
            "Ready - listening on {} (JSON-RPC over SSE, CORS {})",
            addr, cors_status
        );
        info!("  → Stream:   GET {}", sse_path);
        info!("  → Messages: POST {}?sessionId=<id>", message_path);
        info!("  → Health:   GET /health");

        axum::serve(listener, app)
            .await
            .map_err(|e| TransportError::http(e.to_string()))?;

        Ok(())
    }
}

/// Root handler - provides API info.
async fn root_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "name": state.server.name(),
        "version": state.server.version(),
        "transport": "SSE",
        "endpoints": {
            "stream": state.config.sse_path,
            "messages": state.config.message_path,
            "health": "/health"
        },
        "protocol": "JSON-RPC 2.0",
        "documentation": format!(
            "Open GET {} and POST messages to the endpoint it announces",
            state.config.sse_path
        )
    }))
}

/// Health check endpoint.
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Open a new SSE session.
async fn handle_sse(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (tx, rx) = mpsc::channel(SESSION_QUEUE_CAPACITY);
    let id = SessionId::generate();
    let session = Arc::new(SseSession::new(id.clone(), tx));

    state.sessions.insert(id.clone(), session.clone()).await;
    state
        .server
        .notifier()
        .attach_with_id(id.clone(), session.clone())
        .await;
    info!(session = %id, "SSE client connected");

    let endpoint = format!("{}?sessionId={}", state.config.message_path, id);
    if let Err(e) = session.send(OutboundMessage::endpoint(endpoint)) {
        warn!(session = %id, "Failed to announce endpoint: {}", e);
    }

    let guard = SessionGuard { id, state };
    let stream = futures::stream::unfold((rx, guard), |(mut rx, guard)| async move {
        rx.recv()
            .await
            .map(|message| (Ok::<_, Infallible>(message.into_event()), (rx, guard)))
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// Accept a JSON-RPC message for one session.
#[instrument(skip_all, fields(session))]
async fn handle_message(
    State(state): State<AppState>,
    Query(query): Query<MessageQuery>,
    body: Bytes,
) -> Response {
    let Some(raw_id) = query.session_id else {
        return (StatusCode::BAD_REQUEST, "Missing sessionId").into_response();
    };
    tracing::Span::current().record("session", raw_id.as_str());
    let id = SessionId::from(raw_id);

    let Some(session) = state.sessions.get(&id).await else {
        warn!("Message for unknown session");
        return (StatusCode::NOT_FOUND, "Unknown session").into_response();
    };

    if session.is_closed() {
        state.detach_session(&id).await;
        return (StatusCode::GONE, "Session closed").into_response();
    }

    let request: JsonRpcRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            warn!("Malformed JSON-RPC message: {}", e);
            return (StatusCode::BAD_REQUEST, format!("Malformed message: {e}")).into_response();
        }
    };
    info!("Received JSON-RPC request: {}", request.method);

    tokio::spawn(async move {
        let Some(response) = process_request(&state, request).await else {
            return;
        };
        if let Err(e) = session.send_response(&response) {
            warn!(session = %session.id(), "Dropping session after failed response: {}", e);
            state.detach_session(session.id()).await;
        }
    });

    StatusCode::ACCEPTED.into_response()
}

/// Process a JSON-RPC request. Notifications produce no response.
async fn process_request(state: &AppState, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
    // Validate JSON-RPC version
    if request.jsonrpc != "2.0" {
        return Some(JsonRpcResponse::invalid_request(request.id));
    }

    let response = match request.method.as_str() {
        "initialize" => handle_initialize(state, request),

        "ping" => JsonRpcResponse::success(request.id, serde_json::json!({})),

        "tools/list" => handle_tools_list(state, request),

        "tools/call" => handle_tools_call(state, request).await,

        method if method.starts_with("notifications/") => {
            debug!("Received notification: {}", method);
            return None;
        }

        _ => {
            warn!("Unknown method: {}", request.method);
            JsonRpcResponse::method_not_found(request.id)
        }
    };

    Some(response)
}

/// Handle initialize request.
fn handle_initialize(state: &AppState, request: JsonRpcRequest) -> JsonRpcResponse {
    info!("Processing initialize request");

    match serde_json::to_value(state.server.server_info()) {
        Ok(result) => JsonRpcResponse::success(request.id, result),
        Err(e) => JsonRpcResponse::internal_error(request.id, e.to_string()),
    }
}

/// Handle tools/list request.
fn handle_tools_list(state: &AppState, request: JsonRpcRequest) -> JsonRpcResponse {
    info!("Processing tools/list request");

    let listing = state.server.list_tools();
    let mut result = serde_json::json!({ "tools": listing.tools });
    if let Some(instructions) = listing.instructions {
        result["instructions"] = Value::String(instructions);
    }

    JsonRpcResponse::success(request.id, result)
}

/// Handle tools/call request.
async fn handle_tools_call(state: &AppState, request: JsonRpcRequest) -> JsonRpcResponse {
    info!("Processing tools/call request");

    let params = match request.params {
        Some(p) => p,
        None => return JsonRpcResponse::invalid_params(request.id, "Missing params"),
    };

    let name = match params.get("name").and_then(|v| v.as_str()) {
        Some(n) => n.to_string(),
        None => return JsonRpcResponse::invalid_params(request.id, "Missing tool name"),
    };

    let arguments: Option<JsonObject> = match params.get("arguments") {
        None | Some(Value::Null) => None,
        Some(Value::Object(map)) => Some(map.clone()),
        Some(_) => {
            return JsonRpcResponse::invalid_params(request.id, "Tool arguments must be an object");
        }
    };

    match state.server.call_tool(&name, arguments).await {
        Ok(result) => match serde_json::to_value(result) {
            Ok(value) => JsonRpcResponse::success(request.id, value),
            Err(e) => JsonRpcResponse::internal_error(request.id, e.to_string()),
        },
        Err(e) => JsonRpcResponse::from_mcp_error(request.id, e),
    }
}
