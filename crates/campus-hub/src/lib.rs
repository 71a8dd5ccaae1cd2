//! # campus-hub
//!
//! The realtime hub core: connection/session registry, room derivation,
//! presence tracking, and event dispatch for the chat and lecture channels.
//!
//! The hub sits between raw socket connections and the rest of the system.
//! External collaborators (identity resolution, persistence, AI generation)
//! are injected through the traits in [`collaborators`], so a hub instance
//! is fully constructible in tests with no live transport.

#![deny(unsafe_code)]

pub mod collaborators;
pub mod connection;
pub mod dispatch;
pub mod presence;
pub mod registry;
pub mod rooms;

pub use connection::HubConnection;
pub use dispatch::chat::ChatHub;
pub use dispatch::lecture::LectureHub;
pub use presence::{PresenceTracker, PresenceTransition};
pub use registry::ConnectionRegistry;
pub use rooms::{RoomKey, class_room, personal_room};
