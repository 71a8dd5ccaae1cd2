//! WebSocket transport: upgrade handling and per-connection session loops.
//!
//! The handshake runs *before* the protocol upgrade so a refusal is
//! transport-level (an HTTP error status, no event emitted) and no
//! connection or session is ever created for an unauthorized caller.

pub mod session;

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use tokio::sync::mpsc;
use tracing::warn;

use campus_core::{ConnectionId, HubError};

use crate::server::AppState;
use session::{ChatChannel, LectureChannel};

/// Outbound frame buffer per connection; frames beyond this are dropped
/// for that connection rather than blocking the hub.
pub(crate) const OUTBOUND_BUFFER: usize = 1024;

/// Extract the handshake token.
///
/// The `token` query parameter takes precedence; the `Authorization:
/// Bearer` header is the fallback auth payload.
fn handshake_token(params: &HashMap<String, String>, headers: &HeaderMap) -> String {
    if let Some(token) = params.get("token").filter(|token| !token.is_empty()) {
        return token.clone();
    }
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .unwrap_or_default()
        .to_owned()
}

/// HTTP status for a refused handshake.
fn refusal_status(error: &HubError) -> StatusCode {
    match error {
        HubError::Forbidden(_) => StatusCode::FORBIDDEN,
        _ => StatusCode::UNAUTHORIZED,
    }
}

/// GET /ws — chat channel upgrade.
pub async fn chat_upgrade(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Response {
    if state.chat.registry().connection_count().await >= state.config.max_connections {
        warn!("chat channel at capacity, refusing connection");
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }
    let token = handshake_token(&params, &headers);
    let connection_id = ConnectionId::new();
    let (tx, rx) = mpsc::channel(OUTBOUND_BUFFER);

    match state.chat.handshake(connection_id, &token, tx).await {
        Ok(connection) => {
            let dispatcher = Arc::new(ChatChannel::new(Arc::clone(&state.chat)));
            let config = state.config.clone();
            let cancel = state.shutdown.token();
            ws.max_message_size(config.max_message_size)
                .on_upgrade(move |socket| {
                    session::run_session(socket, connection, rx, dispatcher, config, cancel)
                })
        }
        Err(error) => {
            warn!(%error, "chat handshake refused");
            refusal_status(&error).into_response()
        }
    }
}

/// GET /ws/lecture — lecture channel upgrade.
pub async fn lecture_upgrade(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Response {
    if state.lecture.registry().connection_count().await >= state.config.max_connections {
        warn!("lecture channel at capacity, refusing connection");
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }
    let token = handshake_token(&params, &headers);
    let connection_id = ConnectionId::new();
    let (tx, rx) = mpsc::channel(OUTBOUND_BUFFER);

    match state.lecture.handshake(connection_id, &token, tx).await {
        Ok(connection) => {
            let dispatcher = Arc::new(LectureChannel::new(Arc::clone(&state.lecture)));
            let config = state.config.clone();
            let cancel = state.shutdown.token();
            ws.max_message_size(config.max_message_size)
                .on_upgrade(move |socket| {
                    session::run_session(socket, connection, rx, dispatcher, config, cancel)
                })
        }
        Err(error) => {
            warn!(%error, "lecture handshake refused");
            refusal_status(&error).into_response()
        }
    }
}
