//! HTTP surface: info page, health, SSE connect, and the paired message
//! endpoint.
//!
//! `GET /sse` registers a streaming session whose events (handshake,
//! responses, keep-alive pings) travel over the response body. Clients
//! send requests by POSTing to the paired endpoint announced in the
//! `endpoint` event; the matching RPC response arrives on the stream,
//! never in the POST response.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, StatusCode, Uri};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::errors::{AppError, Result};
use crate::mcp::bridge::StreamBridge;
use crate::mcp::dispatcher::Dispatcher;
use crate::mcp::session::SessionManager;

/// Shared state for the HTTP handlers.
pub struct HttpState {
    /// Protocol dispatcher shared by every session.
    pub dispatcher: Arc<Dispatcher>,
    /// Live session registry.
    pub sessions: Arc<SessionManager>,
}

/// Build the router serving the whole HTTP surface.
///
/// `POST /message` and `POST /messages` are aliases; some MCP clients
/// pluralize the paired endpoint path.
#[must_use]
pub fn router(state: Arc<HttpState>) -> Router {
    Router::new()
        .route("/", get(info_page))
        .route("/health", get(health))
        .route("/sse", get(open_stream))
        .route("/message", post(post_message))
        .route("/messages", post(post_message))
        .with_state(state)
}

/// Start the HTTP transport on `port`, serving until `ct` fires.
///
/// # Errors
///
/// Returns [`AppError::Config`] if the port cannot be bound, or
/// [`AppError::Transport`] if the server fails while running.
pub async fn serve_http(port: u16, state: Arc<HttpState>, ct: CancellationToken) -> Result<()> {
    let bind = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .map_err(|err| AppError::Config(format!("failed to bind {bind}: {err}")))?;

    info!(%bind, "starting HTTP/SSE transport");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { ct.cancelled().await })
        .await
        .map_err(|err| AppError::Transport(format!("http server failed: {err}")))?;

    info!("HTTP/SSE transport shut down");
    Ok(())
}

/// `GET /` — server identity and usage hints.
async fn info_page() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": "gitvitae",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "MCP server exposing GitHub resume tools",
        "endpoints": {
            "sse": "GET /sse",
            "message": "POST /message?sessionId=<id>",
            "health": "GET /health",
        },
    }))
}

/// `GET /health` — liveness probe.
async fn health() -> &'static str {
    "ok"
}

/// `GET /sse` — register a session and stream its events.
async fn open_stream(State(state): State<Arc<HttpState>>) -> Response {
    let cancel = CancellationToken::new();
    let (bridge, body) = StreamBridge::channel(&cancel);

    let session = match state.sessions.open(bridge, cancel).await {
        Ok(session) => session,
        Err(err) => {
            warn!(%err, "failed to open streaming session");
            return (StatusCode::INTERNAL_SERVER_ERROR, "failed to open session").into_response();
        }
    };

    debug!(session_id = %session.id, "event stream started");
    match Response::builder()
        .header(header::CONTENT_TYPE, "text/event-stream")
        .header(header::CACHE_CONTROL, "no-cache")
        .header(header::CONNECTION, "keep-alive")
        .body(Body::from_stream(body))
    {
        Ok(response) => response,
        Err(err) => {
            warn!(%err, "failed to build stream response");
            (StatusCode::INTERNAL_SERVER_ERROR, "failed to open session").into_response()
        }
    }
}

/// `POST /message` — submit a request for a live session.
///
/// The body is dispatched on a background task and the RPC response is
/// delivered through the session's event stream; this handler only
/// acknowledges receipt. An unknown or already-closed session id is a
/// 404 and mutates nothing.
async fn post_message(State(state): State<Arc<HttpState>>, uri: Uri, body: String) -> Response {
    let Some(session_id) = extract_session_id(&uri) else {
        return (StatusCode::BAD_REQUEST, "missing sessionId query parameter").into_response();
    };

    let Some(session) = state.sessions.get(&session_id).await else {
        debug!(session_id = %session_id, "message for unknown session");
        return (StatusCode::NOT_FOUND, "session not found").into_response();
    };

    let dispatcher = Arc::clone(&state.dispatcher);
    let sessions = Arc::clone(&state.sessions);
    tokio::spawn(async move {
        let Some(response) = dispatcher.handle_line(&body).await else {
            return;
        };
        if let Err(err) = session.deliver(&response) {
            warn!(session_id = %session.id, %err, "delivery failed, closing session");
            sessions.close(&session.id).await;
        }
    });

    (StatusCode::OK, Json(serde_json::json!({ "status": "accepted" }))).into_response()
}

// ── Private helpers ───────────────────────────────────────────────────────────

/// Extract the `sessionId` query parameter from a request URI.
///
/// Returns `None` when the parameter is absent or empty.
fn extract_session_id(uri: &Uri) -> Option<String> {
    uri.query().and_then(|query| {
        query
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(key, _)| *key == "sessionId")
            .map(|(_, value)| value.to_owned())
            .filter(|value| !value.is_empty())
    })
}
