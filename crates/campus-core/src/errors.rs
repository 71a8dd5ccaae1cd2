//! Error taxonomy for the hub.
//!
//! Each variant maps to one policy in the dispatchers: handshake rejection,
//! silent drop, structured `error` reply, or logged-and-swallowed. The
//! mapping itself lives with the dispatchers; this type only carries the
//! classification.

use thiserror::Error;

/// Result alias used across the hub crates.
pub type HubResult<T> = Result<T, HubError>;

/// Top-level hub error.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HubError {
    /// Bad or missing token. Rejects the handshake; never retried.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Scope or role mismatch. Dropped silently on the chat channel so a
    /// sender can never probe whether a peer exists.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Empty or missing required field.
    #[error("invalid request: {0}")]
    Validation(String),

    /// Referenced record does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The durable store rejected a write.
    #[error("persistence failed: {0}")]
    Persistence(String),

    /// A generation collaborator is unavailable.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Unexpected internal failure; never escapes a handler uncaught.
    #[error("{0}")]
    Internal(String),
}

impl HubError {
    /// Bad-token handshake rejection.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    /// Scope/role mismatch.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    /// Missing or empty required field.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Missing record.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }
}
