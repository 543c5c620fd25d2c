use super::{InferenceBackend, InferenceOutput};
use ndarray::{Array, IxDyn};
use ort::{
    session::{Session, builder::GraphOptimizationLevel},
    value::TensorRef,
};

pub struct OrtBackend {
    session: Session,
}

impl InferenceBackend for OrtBackend {
    fn load_model(path: &str) -> anyhow::Result<Self> {
        // Initialize ORT environment (idempotent)
        let _ = ort::init().commit();

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(4)?
            .commit_from_file(path)?;

        tracing::info!("Model loaded from {}", path);
        Ok(Self { session })
    }

    fn infer(&mut self, images: &Array<f32, IxDyn>) -> anyhow::Result<InferenceOutput> {
        let outputs = self.session.run(ort::inputs![
            "images" => TensorRef::from_array_view(images.view())?
        ])?;

        let preds = outputs["output0"].try_extract_array()?;

        Ok(InferenceOutput {
            preds: preds.into_owned(),
        })
    }
}
