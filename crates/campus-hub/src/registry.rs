//! Connection registry and room fan-out.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use campus_core::ConnectionId;

use crate::connection::HubConnection;
use crate::rooms::RoomKey;

/// Tracks live connections and their room memberships for one channel.
///
/// Owned by a hub instance, never a process-wide singleton; each channel
/// gets its own registry. The registry size is the sole source of "who is
/// connected" for diagnostics.
pub struct ConnectionRegistry<S> {
    /// Connections indexed by connection ID.
    connections: RwLock<HashMap<ConnectionId, Arc<HubConnection<S>>>>,
    /// Explicit room membership, decoupled from room derivation.
    rooms: RwLock<HashMap<RoomKey, HashSet<ConnectionId>>>,
}

impl<S> ConnectionRegistry<S> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            rooms: RwLock::new(HashMap::new()),
        }
    }

    /// Add a connection.
    pub async fn register(&self, connection: Arc<HubConnection<S>>) {
        let mut connections = self.connections.write().await;
        let _ = connections.insert(connection.id.clone(), connection);
    }

    /// Remove a connection and all of its room memberships.
    ///
    /// Idempotent: removing an already-absent connection is a no-op.
    pub async fn unregister(&self, id: &ConnectionId) -> Option<Arc<HubConnection<S>>> {
        let removed = self.connections.write().await.remove(id);
        if removed.is_some() {
            let mut rooms = self.rooms.write().await;
            rooms.retain(|_, members| {
                let _ = members.remove(id);
                !members.is_empty()
            });
        }
        removed
    }

    /// Look up a live connection.
    pub async fn lookup(&self, id: &ConnectionId) -> Option<Arc<HubConnection<S>>> {
        self.connections.read().await.get(id).cloned()
    }

    /// Subscribe a connection to a room.
    pub async fn join(&self, id: &ConnectionId, room: RoomKey) {
        let mut rooms = self.rooms.write().await;
        let _ = rooms.entry(room).or_default().insert(id.clone());
    }

    /// Number of live connections.
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Number of connections subscribed to a room.
    pub async fn room_size(&self, room: &RoomKey) -> usize {
        self.rooms
            .read()
            .await
            .get(room)
            .map_or(0, HashSet::len)
    }

    /// Emit an event to every connection in a room, optionally excluding
    /// one connection (self-exclusion is per-connection, not per-identity).
    ///
    /// Returns the number of connections the frame was enqueued for.
    /// Connections whose send channel is gone are skipped silently.
    pub async fn emit_to_room<E: Serialize>(
        &self,
        room: &RoomKey,
        event: &E,
        skip: Option<&ConnectionId>,
    ) -> usize {
        let json = match serde_json::to_string(event) {
            Ok(json) => Arc::new(json),
            Err(error) => {
                warn!(room = %room, %error, "failed to serialize event");
                return 0;
            }
        };

        let members: Vec<ConnectionId> = {
            let rooms = self.rooms.read().await;
            match rooms.get(room) {
                Some(members) => members.iter().cloned().collect(),
                None => return 0,
            }
        };

        let connections = self.connections.read().await;
        let mut delivered = 0;
        for member in &members {
            if skip == Some(member) {
                continue;
            }
            let Some(connection) = connections.get(member) else {
                continue;
            };
            if connection.send(Arc::clone(&json)) {
                delivered += 1;
            } else {
                debug!(room = %room, connection = %member, "dropped frame for slow or gone connection");
            }
        }
        delivered
    }

    /// Emit an event privately to one connection.
    ///
    /// Returns `false` when the connection is gone or its channel is full;
    /// both are silent no-ops for the sender.
    pub async fn emit_to_connection<E: Serialize>(&self, id: &ConnectionId, event: &E) -> bool {
        let Some(connection) = self.lookup(id).await else {
            return false;
        };
        connection.send_event(event)
    }
}

impl<S> Default for ConnectionRegistry<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    use campus_core::{Identity, RosterContext, StudentSession};

    use crate::rooms::{class_room, personal_room};

    fn session(identity: &str) -> StudentSession {
        StudentSession::new(
            Identity::new(identity),
            RosterContext::new(1, "5", Some("a".into())),
        )
    }

    fn connection(
        id: &str,
        identity: &str,
    ) -> (Arc<HubConnection<StudentSession>>, mpsc::Receiver<Arc<String>>) {
        let (tx, rx) = mpsc::channel(32);
        (
            Arc::new(HubConnection::new(
                ConnectionId::from(id),
                session(identity),
                tx,
            )),
            rx,
        )
    }

    #[tokio::test]
    async fn register_and_lookup() {
        let registry = ConnectionRegistry::new();
        let (conn, _rx) = connection("c1", "s1");
        registry.register(conn).await;
        assert_eq!(registry.connection_count().await, 1);
        assert!(registry.lookup(&ConnectionId::from("c1")).await.is_some());
    }

    #[tokio::test]
    async fn unregister_is_idempotent() {
        let registry = ConnectionRegistry::new();
        let (conn, _rx) = connection("c1", "s1");
        registry.register(conn).await;
        assert!(registry.unregister(&ConnectionId::from("c1")).await.is_some());
        assert!(registry.unregister(&ConnectionId::from("c1")).await.is_none());
        assert!(registry.unregister(&ConnectionId::from("ghost")).await.is_none());
        assert_eq!(registry.connection_count().await, 0);
    }

    #[tokio::test]
    async fn unregister_returns_the_session() {
        let registry = ConnectionRegistry::new();
        let (conn, _rx) = connection("c1", "s1");
        registry.register(conn).await;
        let removed = registry.unregister(&ConnectionId::from("c1")).await.unwrap();
        assert_eq!(removed.session().identity.as_str(), "s1");
    }

    #[tokio::test]
    async fn room_broadcast_reaches_all_members() {
        let registry = ConnectionRegistry::new();
        let room = class_room(&RosterContext::new(1, "5", Some("a".into())));
        let (c1, mut rx1) = connection("c1", "s1");
        let (c2, mut rx2) = connection("c2", "s2");
        registry.register(c1).await;
        registry.register(c2).await;
        registry.join(&ConnectionId::from("c1"), room.clone()).await;
        registry.join(&ConnectionId::from("c2"), room.clone()).await;

        let delivered = registry
            .emit_to_room(&room, &serde_json::json!({"event": "x"}), None)
            .await;
        assert_eq!(delivered, 2);
        assert!(rx1.try_recv().is_ok());
        assert!(rx2.try_recv().is_ok());
    }

    #[tokio::test]
    async fn room_broadcast_skips_excluded_connection() {
        let registry = ConnectionRegistry::new();
        let room = personal_room(1, &Identity::new("s1"));
        let (c1, mut rx1) = connection("c1", "s1");
        let (c2, mut rx2) = connection("c2", "s1");
        registry.register(c1).await;
        registry.register(c2).await;
        registry.join(&ConnectionId::from("c1"), room.clone()).await;
        registry.join(&ConnectionId::from("c2"), room.clone()).await;

        let skip = ConnectionId::from("c1");
        let delivered = registry
            .emit_to_room(&room, &serde_json::json!({"event": "x"}), Some(&skip))
            .await;
        assert_eq!(delivered, 1);
        assert!(rx1.try_recv().is_err());
        assert!(rx2.try_recv().is_ok());
    }

    #[tokio::test]
    async fn broadcast_to_unknown_room_is_noop() {
        let registry: ConnectionRegistry<StudentSession> = ConnectionRegistry::new();
        let room = personal_room(1, &Identity::new("nobody"));
        let delivered = registry
            .emit_to_room(&room, &serde_json::json!({"event": "x"}), None)
            .await;
        assert_eq!(delivered, 0);
    }

    #[tokio::test]
    async fn unregister_removes_room_membership() {
        let registry = ConnectionRegistry::new();
        let room = personal_room(1, &Identity::new("s1"));
        let (c1, mut rx1) = connection("c1", "s1");
        registry.register(c1).await;
        registry.join(&ConnectionId::from("c1"), room.clone()).await;
        assert_eq!(registry.room_size(&room).await, 1);

        let _ = registry.unregister(&ConnectionId::from("c1")).await;
        assert_eq!(registry.room_size(&room).await, 0);
        let delivered = registry
            .emit_to_room(&room, &serde_json::json!({"event": "x"}), None)
            .await;
        assert_eq!(delivered, 0);
        assert!(rx1.try_recv().is_err());
    }

    #[tokio::test]
    async fn emit_to_gone_connection_is_silent() {
        let registry: ConnectionRegistry<StudentSession> = ConnectionRegistry::new();
        let sent = registry
            .emit_to_connection(&ConnectionId::from("ghost"), &serde_json::json!({}))
            .await;
        assert!(!sent);
    }

    #[tokio::test]
    async fn emit_to_connection_delivers_privately() {
        let registry = ConnectionRegistry::new();
        let (c1, mut rx1) = connection("c1", "s1");
        let (c2, mut rx2) = connection("c2", "s2");
        registry.register(c1).await;
        registry.register(c2).await;

        let sent = registry
            .emit_to_connection(&ConnectionId::from("c1"), &serde_json::json!({"event": "x"}))
            .await;
        assert!(sent);
        assert!(rx1.try_recv().is_ok());
        assert!(rx2.try_recv().is_err());
    }

    #[tokio::test]
    async fn closed_channel_member_does_not_poison_broadcast() {
        let registry = ConnectionRegistry::new();
        let room = class_room(&RosterContext::new(1, "5", Some("a".into())));
        let (c1, rx1) = connection("c1", "s1");
        let (c2, mut rx2) = connection("c2", "s2");
        registry.register(c1).await;
        registry.register(c2).await;
        registry.join(&ConnectionId::from("c1"), room.clone()).await;
        registry.join(&ConnectionId::from("c2"), room.clone()).await;
        drop(rx1);

        let delivered = registry
            .emit_to_room(&room, &serde_json::json!({"event": "x"}), None)
            .await;
        assert_eq!(delivered, 1);
        assert!(rx2.try_recv().is_ok());
    }

    #[tokio::test]
    async fn register_same_id_overwrites() {
        let registry = ConnectionRegistry::new();
        let (c1, _rx1) = connection("c1", "s1");
        let (c2, _rx2) = connection("c1", "s2");
        registry.register(c1).await;
        registry.register(c2).await;
        assert_eq!(registry.connection_count().await, 1);
        let conn = registry.lookup(&ConnectionId::from("c1")).await.unwrap();
        assert_eq!(conn.session().identity.as_str(), "s2");
    }
}
