use crate::backend::{InferenceBackend, InferenceOutput};
use crate::config::DetectorConfig;
use crate::labels::COCO_CLASSES;
use crate::processing::{PostProcessor, PreProcessor};
use image::DynamicImage;
use std::sync::Mutex;

/// One detected object in original-image pixel coordinates (xyxy).
#[derive(Debug, Clone, Copy)]
pub struct DetectedBox {
    pub class_id: u16,
    pub confidence: f32,
    pub bbox: [f32; 4],
}

/// One batch of boxes from a single inference call.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    pub boxes: Vec<DetectedBox>,
}

/// Narrow capability the HTTP layer consumes: run prediction on a decoded
/// image and resolve class indices to label strings. Kept small so tests
/// can substitute a stub.
pub trait DetectionModel: Send + Sync {
    fn predict(&self, image: &DynamicImage) -> anyhow::Result<Vec<ResultSet>>;

    fn label(&self, class_id: u16) -> &str;
}

/// Production model: preprocessing + backend inference + postprocessing.
///
/// The ONNX session needs `&mut` to run, so inference calls are serialized
/// behind a mutex; the struct itself is shared read-only across requests.
pub struct Detector<B: InferenceBackend> {
    backend: Mutex<B>,
    preprocessor: PreProcessor,
    postprocessor: PostProcessor,
    names: Vec<String>,
}

impl<B: InferenceBackend> Detector<B> {
    pub fn new(backend: B, config: &DetectorConfig) -> Self {
        Self {
            backend: Mutex::new(backend),
            preprocessor: PreProcessor::new(config.input_size),
            postprocessor: PostProcessor::new(
                config.confidence_threshold,
                config.iou_threshold,
            ),
            names: COCO_CLASSES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl<B: InferenceBackend> DetectionModel for Detector<B> {
    fn predict(&self, image: &DynamicImage) -> anyhow::Result<Vec<ResultSet>> {
        let (input, transform) = self.preprocessor.preprocess(image)?;

        let InferenceOutput { preds } = {
            let mut backend = self
                .backend
                .lock()
                .map_err(|_| anyhow::anyhow!("inference backend mutex poisoned"))?;
            backend.infer(&input)?
        };

        let boxes = self
            .postprocessor
            .parse_detections(&preds.view(), &transform)?;

        tracing::debug!(detections = boxes.len(), "Inference completed");

        // One image in, one batch out
        Ok(vec![ResultSet { boxes }])
    }

    fn label(&self, class_id: u16) -> &str {
        self.names
            .get(class_id as usize)
            .map(String::as_str)
            .unwrap_or("unknown")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array, IxDyn};

    /// Backend returning a fixed prediction tensor
    struct FixedBackend {
        preds: Array<f32, IxDyn>,
    }

    impl InferenceBackend for FixedBackend {
        fn load_model(_path: &str) -> anyhow::Result<Self> {
            anyhow::bail!("not loadable from file")
        }

        fn infer(&mut self, _images: &Array<f32, IxDyn>) -> anyhow::Result<InferenceOutput> {
            Ok(InferenceOutput {
                preds: self.preds.clone(),
            })
        }
    }

    fn test_config() -> DetectorConfig {
        DetectorConfig {
            model_path: "unused".to_string(),
            input_size: (640, 640),
            confidence_threshold: 0.5,
            iou_threshold: 0.45,
        }
    }

    fn square_test_image() -> DynamicImage {
        DynamicImage::ImageRgb8(image::RgbImage::from_pixel(640, 640, image::Rgb([0; 3])))
    }

    #[test]
    fn predict_returns_one_result_set() {
        // Single anchor, class 15 (cat) at 0.9
        let mut preds = Array::zeros(IxDyn(&[1, 84, 1]));
        preds[[0, 0, 0]] = 320.0;
        preds[[0, 1, 0]] = 320.0;
        preds[[0, 2, 0]] = 100.0;
        preds[[0, 3, 0]] = 100.0;
        preds[[0, 4 + 15, 0]] = 0.9;

        let detector = Detector::new(FixedBackend { preds }, &test_config());
        let result_sets = detector.predict(&square_test_image()).unwrap();

        assert_eq!(result_sets.len(), 1);
        assert_eq!(result_sets[0].boxes.len(), 1);

        let b = result_sets[0].boxes[0];
        assert_eq!(b.class_id, 15);
        assert_eq!(detector.label(b.class_id), "cat");
        assert_eq!(b.bbox, [270.0, 270.0, 370.0, 370.0]);
    }

    #[test]
    fn predict_with_no_confident_anchors_yields_empty_set() {
        let preds = Array::zeros(IxDyn(&[1, 84, 8400]));

        let detector = Detector::new(FixedBackend { preds }, &test_config());
        let result_sets = detector.predict(&square_test_image()).unwrap();

        assert_eq!(result_sets.len(), 1);
        assert!(result_sets[0].boxes.is_empty());
    }

    #[test]
    fn out_of_range_class_resolves_to_unknown() {
        let preds = Array::zeros(IxDyn(&[1, 84, 1]));
        let detector = Detector::new(FixedBackend { preds }, &test_config());

        assert_eq!(detector.label(400), "unknown");
    }
}
