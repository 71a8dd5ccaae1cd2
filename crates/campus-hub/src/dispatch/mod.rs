//! Event dispatchers, one per channel.
//!
//! Each dispatcher owns its channel's registry and applies per-event
//! authorization against the connection's handshake-time session.

pub mod chat;
pub mod lecture;
