//! Edge-triggered presence tracking.

use std::collections::{HashMap, HashSet};

use parking_lot::Mutex;

use campus_core::{ConnectionId, Identity};

/// A presence boundary crossing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PresenceTransition {
    /// Live-connection count went 0 → 1.
    Online,
    /// Live-connection count went 1 → 0.
    Offline,
}

/// Reference-counted presence per identity.
///
/// Transitions are edge-triggered: emitted only when an identity's
/// live-connection count crosses the zero boundary. A second tab or device
/// never re-announces. Invariant: an identity appears in the map iff its
/// connection set is non-empty; absence means offline.
///
/// The lock is synchronous and must never be held across an await point;
/// all mutations are atomic with respect to interleaving connect and
/// disconnect events for any identity.
#[derive(Default)]
pub struct PresenceTracker {
    identities: Mutex<HashMap<Identity, HashSet<ConnectionId>>>,
}

impl PresenceTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new connection for `identity`.
    ///
    /// Returns `Online` only when this is the identity's first live
    /// connection.
    pub fn on_connect(
        &self,
        identity: &Identity,
        connection: &ConnectionId,
    ) -> Option<PresenceTransition> {
        let mut identities = self.identities.lock();
        let connections = identities.entry(identity.clone()).or_default();
        let was_empty = connections.is_empty();
        let _ = connections.insert(connection.clone());
        was_empty.then_some(PresenceTransition::Online)
    }

    /// Record a closed connection for `identity`.
    ///
    /// Returns `Offline` only when the identity's last live connection
    /// went away; the identity entry is removed at that point.
    pub fn on_disconnect(
        &self,
        identity: &Identity,
        connection: &ConnectionId,
    ) -> Option<PresenceTransition> {
        let mut identities = self.identities.lock();
        let connections = identities.get_mut(identity)?;
        let _ = connections.remove(connection);
        if connections.is_empty() {
            let _ = identities.remove(identity);
            Some(PresenceTransition::Offline)
        } else {
            None
        }
    }

    /// Identities with at least one live connection, sorted for stable
    /// snapshots.
    pub fn snapshot(&self) -> Vec<Identity> {
        let identities = self.identities.lock();
        let mut online: Vec<Identity> = identities.keys().cloned().collect();
        online.sort();
        online
    }

    /// Whether `identity` has at least one live connection.
    pub fn is_online(&self, identity: &Identity) -> bool {
        self.identities.lock().contains_key(identity)
    }

    /// Number of online identities.
    pub fn online_count(&self) -> usize {
        self.identities.lock().len()
    }
}
