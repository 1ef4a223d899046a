use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::AppError;
use crate::scene::Scene;
use crate::AppState;

// ── Request / Response DTOs ──────────────────────────────────

#[derive(Serialize)]
pub struct StartLoginResponse {
    pub scene_id: String,
    /// QR image as a data URI, ready for an `<img src>` attribute.
    pub artifact: String,
}

#[derive(Deserialize)]
pub struct CompleteLoginRequest {
    pub code: String,
}

// ── Handlers ─────────────────────────────────────────────────

/// GET /login/start — mint a QR code and open a new scene.
pub async fn start_login(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StartLoginResponse>, AppError> {
    let (scene_id, artifact) = state.scenes.start_login().await?;
    let encoded = base64::engine::general_purpose::STANDARD.encode(&artifact);
    Ok(Json(StartLoginResponse {
        scene_id,
        artifact: format!("data:image/png;base64,{encoded}"),
    }))
}

/// GET /login/status/:scene_id — poll the scene.
/// 404 means expired or never issued; clients restart the flow.
pub async fn get_status(
    State(state): State<Arc<AppState>>,
    Path(scene_id): Path<String>,
) -> Result<Json<Scene>, AppError> {
    let scene = state.scenes.get_status(&scene_id)?;
    Ok(Json(scene))
}

/// POST /login/complete/:scene_id — called by the scanning device with
/// its authorization code. Returns the raw identity payload from the
/// upstream exchange.
pub async fn complete_login(
    State(state): State<Arc<AppState>>,
    Path(scene_id): Path<String>,
    Json(req): Json<CompleteLoginRequest>,
) -> Result<Json<Map<String, Value>>, AppError> {
    let payload = state.scenes.complete_login(&scene_id, &req.code).await?;
    Ok(Json(payload))
}
