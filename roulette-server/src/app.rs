use crate::config::LobbyConfig;
use crate::lobby::{LobbyHandle, LobbyStats};
use crate::signaling::{SignalingService, ws_handler};
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use std::sync::Arc;
use tracing::error;

pub struct AppState {
    pub lobby: LobbyHandle,
}

impl AppState {
    /// Spawns the lobby wired to a fresh `SignalingService`.
    pub fn new(config: LobbyConfig) -> Arc<Self> {
        let signaling = SignalingService::new();
        let lobby = LobbyHandle::spawn(config, Arc::new(signaling));

        Arc::new(Self { lobby })
    }
}

/// `GET /ws` for participants, `GET /stats` for lobby counts.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/stats", get(stats_handler))
        .with_state(state)
}

async fn stats_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<LobbyStats>, StatusCode> {
    match state.lobby.stats().await {
        Ok(stats) => Ok(Json(stats)),
        Err(e) => {
            error!("Stats unavailable: {}", e);
            Err(StatusCode::SERVICE_UNAVAILABLE)
        }
    }
}
