//! # campus-core
//!
//! Foundation types for the campus realtime hub.
//!
//! This crate provides the shared vocabulary the hub and transport crates
//! depend on:
//!
//! - **Branded IDs**: `ConnectionId`, `LectureId`, `MessageId` as newtypes
//! - **Identity & scoping**: `Identity`, `RosterContext`, `Role`, `RoleContext`
//! - **Sessions**: immutable `StudentSession` / `LectureSession`, one per connection
//! - **Errors**: `HubError` hierarchy via `thiserror`
//! - **Wire events**: tagged inbound/outbound event enums for both channels
//! - **Collaborator records**: `ChatMessage`, `LectureRecord`, `AnswerPayload`

#![deny(unsafe_code)]

pub mod errors;
pub mod events;
pub mod identity;
pub mod ids;
pub mod records;
pub mod session;

pub use errors::{HubError, HubResult};
pub use identity::{Identity, Role, RoleContext, RosterContext};
pub use ids::{ConnectionId, LectureId, MessageId};
pub use records::{AnswerPayload, ChatMessage, LectureRecord};
pub use session::{LectureSession, StudentSession};
