use ndarray::{Array, IxDyn};

pub mod ort;

pub trait InferenceBackend: Send {
    fn load_model(path: &str) -> anyhow::Result<Self>
    where
        Self: Sized;

    /// Run inference with a preprocessed NCHW array input
    fn infer(&mut self, images: &Array<f32, IxDyn>) -> anyhow::Result<InferenceOutput>;
}

pub struct InferenceOutput {
    pub preds: ndarray::ArrayD<f32>, // [1, 4 + num_classes, num_anchors]
}
