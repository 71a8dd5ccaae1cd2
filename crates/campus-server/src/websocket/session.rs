//! Per-connection WebSocket lifecycle — from upgrade through disconnect.
//!
//! One shared session loop serves both channels; the channel-specific frame
//! parsing and teardown plug in through [`ChannelDispatcher`]. Events from
//! the same connection are handled in receipt order; separate connections
//! run on separate tasks.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Bytes;
use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use metrics::{counter, gauge, histogram};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use campus_core::events::{ClientEvent, LectureClientEvent, LectureServerEvent};
use campus_core::ConnectionId;
use campus_hub::connection::HubConnection;
use campus_hub::{ChatHub, LectureHub};

use crate::config::ServerConfig;

/// Channel-specific frame handling plugged into the shared session loop.
#[async_trait]
pub trait ChannelDispatcher: Send + Sync {
    /// Channel label for logs and metrics.
    fn channel(&self) -> &'static str;

    /// Handle one inbound text frame.
    async fn dispatch(&self, connection_id: &ConnectionId, text: &str);

    /// Tear down after the socket closes. Called exactly once per session.
    async fn disconnect(&self, connection_id: &ConnectionId);
}

/// Chat-channel adapter. Malformed frames are dropped silently.
pub struct ChatChannel {
    hub: Arc<ChatHub>,
}

impl ChatChannel {
    /// Wrap a chat hub for the session loop.
    pub fn new(hub: Arc<ChatHub>) -> Self {
        Self { hub }
    }
}

#[async_trait]
impl ChannelDispatcher for ChatChannel {
    fn channel(&self) -> &'static str {
        "chat"
    }

    async fn dispatch(&self, connection_id: &ConnectionId, text: &str) {
        match serde_json::from_str::<ClientEvent>(text) {
            Ok(event) => self.hub.handle_event(connection_id, event).await,
            Err(error) => {
                debug!(connection = %connection_id, %error, "malformed frame dropped");
            }
        }
    }

    async fn disconnect(&self, connection_id: &ConnectionId) {
        self.hub.disconnect(connection_id).await;
    }
}

/// Lecture-channel adapter. The channel is request/response shaped, so a
/// malformed frame gets a structured `error` reply.
pub struct LectureChannel {
    hub: Arc<LectureHub>,
}

impl LectureChannel {
    /// Wrap a lecture hub for the session loop.
    pub fn new(hub: Arc<LectureHub>) -> Self {
        Self { hub }
    }
}

#[async_trait]
impl ChannelDispatcher for LectureChannel {
    fn channel(&self) -> &'static str {
        "lecture"
    }

    async fn dispatch(&self, connection_id: &ConnectionId, text: &str) {
        match serde_json::from_str::<LectureClientEvent>(text) {
            Ok(event) => self.hub.handle_event(connection_id, event).await,
            Err(error) => {
                debug!(connection = %connection_id, %error, "malformed frame rejected");
                let _ = self
                    .hub
                    .registry()
                    .emit_to_connection(
                        connection_id,
                        &LectureServerEvent::error("Invalid event payload", None),
                    )
                    .await;
            }
        }
    }

    async fn disconnect(&self, connection_id: &ConnectionId) {
        self.hub.disconnect(connection_id).await;
    }
}

/// Run one connected client from upgrade through disconnect.
///
/// 1. Spawns the outbound writer, interleaving queued frames with periodic
///    Ping frames and disconnecting unresponsive clients
/// 2. Dispatches inbound text/binary frames through the channel dispatcher
/// 3. On any exit path (close frame, socket error, shutdown) runs the
///    hub's disconnect bookkeeping exactly once
#[instrument(skip_all, fields(channel = %dispatcher.channel(), connection = %connection.id))]
pub async fn run_session<S: Send + Sync + 'static>(
    socket: WebSocket,
    connection: Arc<HubConnection<S>>,
    mut rx: mpsc::Receiver<Arc<String>>,
    dispatcher: Arc<dyn ChannelDispatcher>,
    config: ServerConfig,
    cancel: CancellationToken,
) {
    let channel = dispatcher.channel();
    let connection_id = connection.id.clone();

    info!("client connected");
    counter!("ws_connections_total", "channel" => channel).increment(1);
    gauge!("ws_connections_active", "channel" => channel).increment(1.0);

    let (mut ws_tx, mut ws_rx) = socket.split();

    // Outbound forwarder with periodic Ping frames.
    let ping_interval = config.heartbeat_interval();
    let pong_timeout = config.heartbeat_timeout();
    let outbound_conn = Arc::clone(&connection);
    let outbound_cancel = cancel.clone();
    let outbound = tokio::spawn(async move {
        let mut ping = tokio::time::interval(ping_interval);
        // Skip the immediate first tick
        let _ = ping.tick().await;

        loop {
            tokio::select! {
                frame = rx.recv() => {
                    match frame {
                        Some(text) => {
                            if ws_tx.send(Message::Text((*text).clone().into())).await.is_err() {
                                break;
                            }
                        }
                        None => break,
                    }
                }
                _ = ping.tick() => {
                    if !outbound_conn.check_alive()
                        && outbound_conn.last_pong_elapsed() > pong_timeout
                    {
                        warn!(connection = %outbound_conn.id, "client unresponsive, disconnecting");
                        break;
                    }
                    if ws_tx.send(Message::Ping(Bytes::new())).await.is_err() {
                        break;
                    }
                }
                () = outbound_cancel.cancelled() => {
                    let _ = ws_tx.send(Message::Close(None)).await;
                    break;
                }
            }
        }
    });

    // Inbound loop. Same-connection events are processed in receipt order;
    // handlers may suspend on collaborators without blocking other
    // connections.
    loop {
        let frame = tokio::select! {
            frame = ws_rx.next() => frame,
            () = cancel.cancelled() => break,
        };
        let Some(Ok(frame)) = frame else { break };

        let text = match frame {
            Message::Text(ref text) => Some(text.to_string()),
            Message::Binary(ref data) => match std::str::from_utf8(data.as_ref()) {
                Ok(text) => Some(text.to_owned()),
                Err(_) => {
                    debug!(len = data.len(), "non-UTF8 binary frame ignored");
                    None
                }
            },
            Message::Close(_) => break,
            Message::Ping(_) | Message::Pong(_) => {
                connection.mark_alive();
                None
            }
        };

        let Some(text) = text else { continue };
        connection.mark_alive();
        dispatcher.dispatch(&connection_id, &text).await;
    }

    info!(dropped = connection.drop_count(), "client disconnected");
    counter!("ws_disconnections_total", "channel" => channel).increment(1);
    gauge!("ws_connections_active", "channel" => channel).decrement(1.0);
    histogram!("ws_connection_duration_seconds", "channel" => channel)
        .record(connection.age().as_secs_f64());

    outbound.abort();
    dispatcher.disconnect(&connection_id).await;
}
