use gateway::{
    config::get_configuration, logging::setup_logging, routes::app, state::AppState,
};
use inference::{
    DetectionModel, Detector, DetectorConfig, InferenceBackend, backend::ort::OrtBackend,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = get_configuration().expect("failed to load configuration");
    setup_logging(&config);

    let detector_config = DetectorConfig::from_env();
    tracing::info!(config = ?detector_config, "Loading detection model");

    let backend = OrtBackend::load_model(&detector_config.model_path)?;
    let model: Arc<dyn DetectionModel> = Arc::new(Detector::new(backend, &detector_config));

    let state = AppState { model };

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "Gateway listening");

    axum::serve(listener, app(state)).await?;

    Ok(())
}
