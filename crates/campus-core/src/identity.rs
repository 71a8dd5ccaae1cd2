//! Caller identity and roster/role scoping types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque end-user identifier (enrollment number).
///
/// Normalized to lowercase on construction. Room keys and the presence map
/// are keyed on the normalized form, so `"S1"` and `"s1"` name the same
/// caller.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Identity(String);

impl Identity {
    /// Create a normalized identity.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into().trim().to_lowercase())
    }

    /// The normalized identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the identifier is blank after normalization.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for Identity {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for Identity {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<Identity> for String {
    fn from(id: Identity) -> Self {
        id.0
    }
}

impl AsRef<str> for Identity {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Tenant/grade/section tuple attached to an authenticated student.
///
/// Used for class-room derivation and per-event scope validation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterContext {
    /// Owning tenant (school account).
    pub tenant_id: i64,
    /// Grade label, e.g. `"5"`.
    pub grade: String,
    /// Section within the grade; `None` or blank means the whole grade.
    #[serde(default)]
    pub section: Option<String>,
}

impl RosterContext {
    /// Create a roster context.
    pub fn new(tenant_id: i64, grade: impl Into<String>, section: Option<String>) -> Self {
        Self {
            tenant_id,
            grade: grade.into(),
            section,
        }
    }

    /// Normalized section label; blank collapses to `None`.
    #[must_use]
    pub fn section_label(&self) -> Option<&str> {
        self.section
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Whether two contexts describe the same class scope
    /// (tenant + grade + section, case-insensitive).
    #[must_use]
    pub fn same_scope(&self, other: &RosterContext) -> bool {
        if self.tenant_id != other.tenant_id {
            return false;
        }
        if !self.grade.trim().eq_ignore_ascii_case(other.grade.trim()) {
            return false;
        }
        match (self.section_label(), other.section_label()) {
            (None, None) => true,
            (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
            _ => false,
        }
    }
}

/// Caller role on the lecture channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Tenant administrator.
    Admin,
    /// Regular member.
    Member,
    /// Read-only viewer; not allowed on the lecture channel.
    Viewer,
}

impl Role {
    /// Whether this role may open a lecture-channel connection.
    #[must_use]
    pub fn may_join_lecture(self) -> bool {
        matches!(self, Self::Admin | Self::Member)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Admin => "admin",
            Self::Member => "member",
            Self::Viewer => "viewer",
        };
        f.write_str(s)
    }
}

/// Resolved caller on the lecture channel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleContext {
    /// Caller role.
    pub role: Role,
    /// Caller user id within the tenant.
    pub user_id: String,
}
