//! Chat-channel event dispatcher.
//!
//! Per-connection state machine: unauthenticated → (handshake) → active →
//! (disconnect) → terminated. A connection only exists in the registry
//! while active, and its session never changes once set.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, instrument, warn};

use campus_core::events::{ClientEvent, PresenceStatus, ServerEvent};
use campus_core::{ConnectionId, HubError, HubResult, Identity, StudentSession};

use crate::collaborators::{ChatStore, StudentDirectory};
use crate::connection::HubConnection;
use crate::presence::{PresenceTracker, PresenceTransition};
use crate::registry::ConnectionRegistry;
use crate::rooms::{class_room, personal_room};

/// Dispatcher for the default (chat) channel.
///
/// Owns the channel's registry and presence state. Collaborators are
/// injected, so independent hub instances can coexist in one process.
pub struct ChatHub {
    registry: ConnectionRegistry<StudentSession>,
    presence: PresenceTracker,
    directory: Arc<dyn StudentDirectory>,
    store: Arc<dyn ChatStore>,
}

impl ChatHub {
    /// Create a hub with its external collaborators.
    pub fn new(directory: Arc<dyn StudentDirectory>, store: Arc<dyn ChatStore>) -> Self {
        Self {
            registry: ConnectionRegistry::new(),
            presence: PresenceTracker::new(),
            directory,
            store,
        }
    }

    /// The channel's connection registry.
    pub fn registry(&self) -> &ConnectionRegistry<StudentSession> {
        &self.registry
    }

    /// The channel's presence tracker.
    pub fn presence(&self) -> &PresenceTracker {
        &self.presence
    }

    /// Authorize a token and register the connection.
    ///
    /// On success the session is created, the connection joins its personal
    /// and class rooms, and an `online` presence update is broadcast if this
    /// is the identity's first live connection. On failure nothing is
    /// registered and the caller must refuse the connection at the
    /// transport level.
    #[instrument(skip_all, fields(connection = %connection_id))]
    pub async fn handshake(
        &self,
        connection_id: ConnectionId,
        token: &str,
        tx: mpsc::Sender<Arc<String>>,
    ) -> HubResult<Arc<HubConnection<StudentSession>>> {
        let identity = self.directory.resolve_identity(token).await?;
        let context = self.directory.roster_context(&identity).await?;

        let session = StudentSession::new(identity.clone(), context.clone());
        let connection = Arc::new(HubConnection::new(connection_id.clone(), session, tx));
        self.registry.register(Arc::clone(&connection)).await;
        self.registry
            .join(&connection_id, personal_room(context.tenant_id, &identity))
            .await;
        let class = class_room(&context);
        self.registry.join(&connection_id, class.clone()).await;

        if self.presence.on_connect(&identity, &connection_id)
            == Some(PresenceTransition::Online)
        {
            let _ = self
                .registry
                .emit_to_room(
                    &class,
                    &ServerEvent::PresenceUpdate {
                        identity: identity.clone(),
                        status: PresenceStatus::Online,
                    },
                    None,
                )
                .await;
        }

        debug!(identity = %identity, "student connected");
        Ok(connection)
    }

    /// Tear down a connection.
    ///
    /// Idempotent; unknown ids are a no-op. Emits an `offline` presence
    /// update when the identity's last connection went away.
    #[instrument(skip_all, fields(connection = %connection_id))]
    pub async fn disconnect(&self, connection_id: &ConnectionId) {
        let Some(connection) = self.registry.unregister(connection_id).await else {
            return;
        };
        let session = connection.session();

        if self.presence.on_disconnect(&session.identity, connection_id)
            == Some(PresenceTransition::Offline)
        {
            let _ = self
                .registry
                .emit_to_room(
                    &class_room(&session.context),
                    &ServerEvent::PresenceUpdate {
                        identity: session.identity.clone(),
                        status: PresenceStatus::Offline,
                    },
                    None,
                )
                .await;
        }

        debug!(identity = %session.identity, "student disconnected");
    }

    /// Route one inbound event.
    ///
    /// Events from unregistered connections are dropped silently — an
    /// unauthenticated sender never learns why. Per-event failures follow
    /// the silent-drop policy and are only logged; a handler fault never
    /// affects other connections.
    pub async fn handle_event(&self, connection_id: &ConnectionId, event: ClientEvent) {
        let Some(connection) = self.registry.lookup(connection_id).await else {
            debug!(connection = %connection_id, "event from unregistered connection dropped");
            return;
        };

        let outcome = match event {
            ClientEvent::Signal {
                peer_identity,
                signal_type,
                payload,
            } => {
                self.relay_signal(&connection, peer_identity, signal_type, payload)
                    .await
            }
            ClientEvent::Typing {
                peer_identity,
                typing,
            } => self.relay_typing(&connection, peer_identity, typing).await,
            ClientEvent::SendMessage {
                peer_identity,
                message,
                share_metadata,
            } => {
                self.send_message(&connection, peer_identity, message, share_metadata)
                    .await
            }
            ClientEvent::PresenceRequest => self.presence_request(&connection).await,
        };

        if let Err(error) = outcome {
            match error {
                HubError::Forbidden(_) | HubError::Validation(_) => {
                    debug!(connection = %connection_id, %error, "event dropped");
                }
                _ => warn!(connection = %connection_id, %error, "event handler failed"),
            }
        }
    }

    /// Relay an opaque signaling payload to a classmate's personal room,
    /// excluding the sender's own connection so a multi-tab sender never
    /// echoes to itself.
    async fn relay_signal(
        &self,
        connection: &HubConnection<StudentSession>,
        peer: Identity,
        signal_type: String,
        payload: Option<serde_json::Value>,
    ) -> HubResult<()> {
        if peer.is_empty() || signal_type.trim().is_empty() {
            return Err(HubError::validation(
                "peer_identity and signal_type are required",
            ));
        }
        let session = connection.session();
        let peer_context = self
            .directory
            .validate_same_scope(&session.context, &peer)
            .await?;

        let event = ServerEvent::Signal {
            sender_identity: session.identity.clone(),
            signal_type,
            payload,
        };
        let _ = self
            .registry
            .emit_to_room(
                &personal_room(peer_context.tenant_id, &peer),
                &event,
                Some(&connection.id),
            )
            .await;
        Ok(())
    }

    /// Forward a typing indicator under the same scope rules as `signal`.
    async fn relay_typing(
        &self,
        connection: &HubConnection<StudentSession>,
        peer: Identity,
        typing: bool,
    ) -> HubResult<()> {
        if peer.is_empty() {
            return Err(HubError::validation("peer_identity is required"));
        }
        let session = connection.session();
        let peer_context = self
            .directory
            .validate_same_scope(&session.context, &peer)
            .await?;

        let event = ServerEvent::Typing {
            sender_identity: session.identity.clone(),
            typing,
        };
        let _ = self
            .registry
            .emit_to_room(
                &personal_room(peer_context.tenant_id, &peer),
                &event,
                Some(&connection.id),
            )
            .await;
        Ok(())
    }

    /// Persist a chat message, then fan it out to both participants.
    ///
    /// The record must be durable before anything is broadcast; a
    /// persistence failure aborts the whole operation. No self-exclusion
    /// here — the sender's other tabs must see the sent message too.
    async fn send_message(
        &self,
        connection: &HubConnection<StudentSession>,
        peer: Identity,
        message: String,
        share_metadata: Option<serde_json::Value>,
    ) -> HubResult<()> {
        let body = message.trim();
        if peer.is_empty() || body.is_empty() {
            return Err(HubError::validation(
                "peer_identity and a non-empty message are required",
            ));
        }
        let session = connection.session();
        let peer_context = self
            .directory
            .validate_same_scope(&session.context, &peer)
            .await?;

        let record = self
            .store
            .persist_message(session, &peer, &peer_context, body, share_metadata)
            .await?;

        let event = ServerEvent::MessageNew {
            message: record,
            participants: vec![session.identity.clone(), peer.clone()],
        };
        let sender_room = personal_room(session.context.tenant_id, &session.identity);
        let peer_room = personal_room(peer_context.tenant_id, &peer);
        let _ = self.registry.emit_to_room(&sender_room, &event, None).await;
        if peer_room != sender_room {
            let _ = self.registry.emit_to_room(&peer_room, &event, None).await;
        }
        Ok(())
    }

    /// Reply privately with the presence snapshot, then re-announce the
    /// requester's own `online` status to their class room.
    ///
    /// The re-announce is a best-effort refresh: it bypasses the tracker,
    /// so the edge-triggered invariant is untouched and peers must treat
    /// a duplicate `online` as idempotent.
    async fn presence_request(
        &self,
        connection: &HubConnection<StudentSession>,
    ) -> HubResult<()> {
        let session = connection.session();
        let online = self.presence.snapshot();
        let _ = connection.send_event(&ServerEvent::PresenceSnapshot { online });

        let _ = self
            .registry
            .emit_to_room(
                &class_room(&session.context),
                &ServerEvent::PresenceUpdate {
                    identity: session.identity.clone(),
                    status: PresenceStatus::Online,
                },
                None,
            )
            .await;
        Ok(())
    }
}
