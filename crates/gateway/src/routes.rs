use crate::error::DetectError;
use crate::state::AppState;
use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State, multipart::MultipartRejection},
    routing::post,
};
use serde::Serialize;
use tower_http::cors::CorsLayer;

const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

#[derive(Debug, Serialize)]
pub struct DetectionJson {
    pub label: String,
    pub confidence: f32,
    pub bbox: [f32; 4],
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/detect", post(detect))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// POST /detect - run object detection on an uploaded image.
///
/// Expects a multipart body with a file field named `image`; responds with
/// a flat JSON array of detections in model iteration order.
async fn detect(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Vec<DetectionJson>>, DetectError> {
    let multipart = multipart.map_err(|_| DetectError::MissingImage)?;
    let image_bytes = read_image_field(multipart).await?;

    let image = image::load_from_memory(&image_bytes)?;

    // Inference is CPU-bound; keep it off the async runtime
    let model = state.model.clone();
    let result_sets = tokio::task::spawn_blocking(move || model.predict(&image))
        .await
        .map_err(|e| DetectError::Inference(anyhow::anyhow!("inference task failed: {e}")))??;

    let mut detections = Vec::new();
    for set in &result_sets {
        for b in &set.boxes {
            detections.push(DetectionJson {
                label: state.model.label(b.class_id).to_string(),
                confidence: b.confidence,
                bbox: b.bbox,
            });
        }
    }

    tracing::debug!(detections = detections.len(), "Detection request served");

    Ok(Json(detections))
}

/// Scan multipart fields for the one named `image` and read its bytes.
async fn read_image_field(mut multipart: Multipart) -> Result<Vec<u8>, DetectError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| DetectError::MissingImage)?
    {
        if field.name() == Some("image") {
            let bytes = field.bytes().await.map_err(|_| DetectError::MissingImage)?;
            return Ok(bytes.to_vec());
        }
    }

    Err(DetectError::MissingImage)
}
