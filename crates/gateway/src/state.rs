use inference::DetectionModel;
use std::sync::Arc;

/// Shared handler state: the process-wide detection model, loaded once at
/// startup and injected so tests can substitute a stub.
#[derive(Clone)]
pub struct AppState {
    pub model: Arc<dyn DetectionModel>,
}
