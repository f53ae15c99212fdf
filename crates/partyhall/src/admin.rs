//! Operational HTTP endpoints, served on their own listener.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    routing::{get, post},
};
use partyhall_protocol::RoomCode;
use partyhall_room::{Room, RoomSummary};
use serde_json::{Value, json};

use crate::SessionCoordinator;

/// What the admin handlers can reach.
#[derive(Clone)]
pub struct AdminState {
    pub coordinator: Arc<SessionCoordinator>,
    /// Bearer token `POST /reset` requires, if any.
    pub token: Option<String>,
}

pub fn router(state: AdminState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/rooms", get(list_rooms))
        .route("/rooms/{room_id}", get(room_detail))
        .route("/reset", post(reset))
        .with_state(Arc::new(state))
}

/// Health check endpoint
pub async fn health_check() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

/// Summaries of every live room.
pub async fn list_rooms(State(state): State<Arc<AdminState>>) -> Json<Vec<RoomSummary>> {
    Json(state.coordinator.rooms().list().await)
}

/// Full snapshot of one room.
pub async fn room_detail(
    State(state): State<Arc<AdminState>>,
    Path(room_id): Path<String>,
) -> Result<Json<Room>, StatusCode> {
    state
        .coordinator
        .snapshot(&RoomCode::new(room_id))
        .await
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

/// Clears every room and connection.
pub async fn reset(
    State(state): State<Arc<AdminState>>,
    headers: HeaderMap,
) -> Result<Json<Value>, StatusCode> {
    if let Some(expected) = &state.token {
        let presented = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));
        if presented != Some(expected.as_str()) {
            tracing::warn!("reset refused: bad or missing admin token");
            return Err(StatusCode::UNAUTHORIZED);
        }
    }
    let (rooms, connections) = state.coordinator.reset().await;
    Ok(Json(json!({
        "success": true,
        "message": format!("Server data reset. Cleared {rooms} rooms and {connections} connections."),
    })))
}
