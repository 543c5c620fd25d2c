pub mod backend;
pub mod config;
pub mod labels;
pub mod model;
pub mod processing;

// Re-export commonly used types for convenience
pub use backend::{InferenceBackend, InferenceOutput};
pub use config::DetectorConfig;
pub use model::{DetectedBox, DetectionModel, Detector, ResultSet};
