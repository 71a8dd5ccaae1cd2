//! Immutable per-connection sessions.
//!
//! A session is attached to a connection exactly once, at handshake time,
//! and is the sole source of truth for authorizing every subsequent event
//! on that connection. Event payloads can never substitute for it.

use crate::identity::{Identity, RoleContext, RosterContext};

/// Session attached to a chat-channel connection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StudentSession {
    /// Authenticated caller.
    pub identity: Identity,
    /// Roster scope resolved at handshake.
    pub context: RosterContext,
}

impl StudentSession {
    /// Create a session from resolved handshake data.
    pub fn new(identity: Identity, context: RosterContext) -> Self {
        Self { identity, context }
    }
}

/// Session attached to a lecture-channel connection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LectureSession {
    /// Resolved caller role and id.
    pub role_context: RoleContext,
}

impl LectureSession {
    /// Create a session from a resolved role context.
    pub fn new(role_context: RoleContext) -> Self {
        Self { role_context }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Role;

    #[test]
    fn student_session_holds_resolved_data() {
        let session = StudentSession::new(
            Identity::new("EN-1"),
            RosterContext::new(1, "5", Some("a".into())),
        );
        assert_eq!(session.identity.as_str(), "en-1");
        assert_eq!(session.context.tenant_id, 1);
    }

    #[test]
    fn lecture_session_holds_role() {
        let session = LectureSession::new(RoleContext {
            role: Role::Member,
            user_id: "u1".into(),
        });
        assert!(session.role_context.role.may_join_lecture());
    }
}
