//! HTTP/WebSocket API for the game server.
//!
//! # Endpoints
//!
//! - `GET /health` - server health plus live room count
//! - `GET /api/rooms` - list rooms (id, seated players, phase)
//! - `GET /ws` - the game socket; the first client message must be
//!   `join-room`, after which actions flow in and full-state broadcasts
//!   flow out
//!
//! Game state is owned by per-room actors behind the
//! [`settlers::room::RoomRegistry`]; handlers only pass messages.

pub mod rate_limiter;
pub mod websocket;

use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    response::{IntoResponse, Json},
    routing::get,
};
use serde_json::json;
use settlers::room::RoomRegistry;
use tower_http::cors::CorsLayer;

/// Application state shared across handlers. Cloned per request; cheap
/// because everything is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<RoomRegistry>,
}

/// Create the router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/rooms", get(list_rooms))
        .route("/ws", get(websocket::websocket_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "rooms": state.registry.room_count().await,
    }))
}

async fn list_rooms(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.registry.summaries().await)
}
