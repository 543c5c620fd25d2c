use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Errors surfaced by the detection handler.
///
/// Only the missing-image case is an expected, user-facing error; decode
/// and inference failures map to a bare 500 with no structured body.
#[derive(Error, Debug)]
pub enum DetectError {
    #[error("no image provided")]
    MissingImage,
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("inference failed: {0}")]
    Inference(#[from] anyhow::Error),
}

impl IntoResponse for DetectError {
    fn into_response(self) -> Response {
        match self {
            DetectError::MissingImage => (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": "No image provided"})),
            )
                .into_response(),
            DetectError::Decode(e) => {
                tracing::error!(error = %e, "Image decode failed");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
            DetectError::Inference(e) => {
                tracing::error!(error = %e, "Model inference failed");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}
