//! `CampusServer` — Axum HTTP + WebSocket server.

use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::extract::State;
use axum::response::Json;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use campus_hub::{ChatHub, LectureHub};

use crate::config::ServerConfig;
use crate::health::{self, HealthResponse};
use crate::shutdown::ShutdownCoordinator;
use crate::websocket;

/// Shared state accessible from Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Chat-channel dispatcher.
    pub chat: Arc<ChatHub>,
    /// Lecture-channel dispatcher.
    pub lecture: Arc<LectureHub>,
    /// Shutdown coordinator.
    pub shutdown: Arc<ShutdownCoordinator>,
    /// When the server started.
    pub start_time: Instant,
    /// Server configuration.
    pub config: ServerConfig,
}

/// The campus hub server.
pub struct CampusServer {
    config: ServerConfig,
    chat: Arc<ChatHub>,
    lecture: Arc<LectureHub>,
    shutdown: Arc<ShutdownCoordinator>,
    start_time: Instant,
}

impl CampusServer {
    /// Create a new server around the two channel hubs.
    pub fn new(config: ServerConfig, chat: Arc<ChatHub>, lecture: Arc<LectureHub>) -> Self {
        Self {
            config,
            chat,
            lecture,
            shutdown: Arc::new(ShutdownCoordinator::new()),
            start_time: Instant::now(),
        }
    }

    /// Build the Axum router with all routes.
    pub fn router(&self) -> Router {
        let state = AppState {
            chat: Arc::clone(&self.chat),
            lecture: Arc::clone(&self.lecture),
            shutdown: Arc::clone(&self.shutdown),
            start_time: self.start_time,
            config: self.config.clone(),
        };

        Router::new()
            .route("/health", get(health_handler))
            .route("/ws", get(websocket::chat_upgrade))
            .route("/ws/lecture", get(websocket::lecture_upgrade))
            .layer(TraceLayer::new_for_http())
            .layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            )
            .with_state(state)
    }

    /// The chat-channel hub.
    pub fn chat(&self) -> &Arc<ChatHub> {
        &self.chat
    }

    /// The lecture-channel hub.
    pub fn lecture(&self) -> &Arc<LectureHub> {
        &self.lecture
    }

    /// The shutdown coordinator.
    pub fn shutdown(&self) -> &Arc<ShutdownCoordinator> {
        &self.shutdown
    }

    /// The server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

/// GET /health
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let chat_connections = state.chat.registry().connection_count().await;
    let lecture_connections = state.lecture.registry().connection_count().await;
    let online = state.chat.presence().online_count();
    Json(health::health_check(
        state.start_time,
        chat_connections,
        lecture_connections,
        online,
    ))
}
