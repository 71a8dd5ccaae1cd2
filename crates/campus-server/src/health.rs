//! `/health` endpoint.

use serde::Serialize;
use std::time::Instant;

/// Health check response body.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Always `"ok"` when the server is running.
    pub status: String,
    /// Seconds since the server started.
    pub uptime_secs: u64,
    /// Live chat-channel connections.
    pub chat_connections: usize,
    /// Live lecture-channel connections.
    pub lecture_connections: usize,
    /// Identities currently online on the chat channel.
    pub online_identities: usize,
}

/// Build a health response from live registry counters.
pub fn health_check(
    start_time: Instant,
    chat_connections: usize,
    lecture_connections: usize,
    online_identities: usize,
) -> HealthResponse {
    HealthResponse {
        status: "ok".into(),
        uptime_secs: start_time.elapsed().as_secs(),
        chat_connections,
        lecture_connections,
        online_identities,
    }
}
