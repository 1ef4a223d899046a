use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::AppState;

pub mod handlers;

/// Build the login-flow router.
/// All routes are relative — the caller mounts this under `/login`.
pub fn login_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/start", get(handlers::start_login))
        .route("/status/:scene_id", get(handlers::get_status))
        .route("/complete/:scene_id", post(handlers::complete_login))
}
