//! # campus-server
//!
//! Axum HTTP + `WebSocket` transport for the campus realtime hub.
//!
//! - `GET /health` — liveness, uptime, and per-channel connection counts
//! - `GET /ws` — chat channel upgrade (token in query string or bearer header)
//! - `GET /ws/lecture` — lecture Q&A channel upgrade
//! - Per-connection read/write loops with ping/pong heartbeat
//! - Graceful shutdown via `CancellationToken`

#![deny(unsafe_code)]

pub mod config;
pub mod health;
pub mod server;
pub mod shutdown;
pub mod websocket;
