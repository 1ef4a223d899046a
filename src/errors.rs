use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// The identity provider reported a structured failure
    /// (token issuance, artifact minting, or code exchange).
    /// Propagated unchanged; never retried here.
    #[error("upstream rejected request: [{code}] {message}")]
    Upstream { code: i64, message: String },

    /// Scene id does not resolve to a live record — expired or never
    /// issued, the two are indistinguishable by design. A normal
    /// terminal state for polling, not a transport failure.
    #[error("scene not found")]
    SceneNotFound,

    /// Network-level failure talking to the identity provider.
    /// Not classified further; the caller decides whether to retry.
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        AppError::UpstreamUnavailable(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, code, msg) = match &self {
            AppError::Upstream { code, message } => (
                StatusCode::BAD_GATEWAY,
                "upstream_error",
                "upstream_rejected",
                format!("[{}] {}", code, message),
            ),
            AppError::SceneNotFound => (
                StatusCode::NOT_FOUND,
                "invalid_request_error",
                "scene_not_found",
                "scene expired or unknown".to_string(),
            ),
            AppError::UpstreamUnavailable(e) => {
                tracing::warn!("Upstream unavailable: {}", e);
                (
                    StatusCode::BAD_GATEWAY,
                    "upstream_error",
                    "upstream_unavailable",
                    e.clone(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal_server_error",
                    "internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "message": msg,
                "type": error_type,
                "code": code,
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_error_display_keeps_code_and_message() {
        let err = AppError::Upstream {
            code: 40001,
            message: "invalid credential".into(),
        };
        assert_eq!(
            err.to_string(),
            "upstream rejected request: [40001] invalid credential"
        );
    }

    #[test]
    fn test_scene_not_found_maps_to_404() {
        let resp = AppError::SceneNotFound.into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_upstream_error_maps_to_502() {
        let resp = AppError::Upstream {
            code: 40001,
            message: "invalid credential".into(),
        }
        .into_response();
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    }
}
