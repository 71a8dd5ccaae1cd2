//! Room key derivation.
//!
//! Rooms are not stored entities. Keys are pure functions of session data,
//! recomputed at connect time and again at every event; identical inputs
//! must always produce identical keys, independent of call order.

use std::fmt;

use serde::{Deserialize, Serialize};

use campus_core::{Identity, RosterContext};

/// Derived room key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomKey(String);

impl RoomKey {
    /// The derived key string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<RoomKey> for String {
    fn from(key: RoomKey) -> Self {
        key.0
    }
}

/// 1:1 delivery mailbox for one identity within one tenant.
pub fn personal_room(tenant_id: i64, identity: &Identity) -> RoomKey {
    RoomKey(format!("student:{tenant_id}:{identity}").to_lowercase())
}

/// Broadcast group for a tenant + grade + section.
///
/// A missing or blank section joins the grade-wide `all` group.
pub fn class_room(context: &RosterContext) -> RoomKey {
    let section = context.section_label().unwrap_or("all");
    RoomKey(
        format!(
            "class:{}:{}:{}",
            context.tenant_id,
            context.grade.trim(),
            section
        )
        .to_lowercase(),
    )
}
