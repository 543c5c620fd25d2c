use crate::model::DetectedBox;

/// Parameters to map detections from model-input coordinates back to the
/// original image.
pub struct TransformParams {
    pub orig_width: u32,
    pub orig_height: u32,
    pub scale: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

pub struct PostProcessor {
    pub confidence_threshold: f32,
    pub iou_threshold: f32,
}

impl PostProcessor {
    pub fn new(confidence_threshold: f32, iou_threshold: f32) -> Self {
        Self {
            confidence_threshold,
            iou_threshold,
        }
    }

    /// Parse detections from YOLOv8 output.
    ///
    /// `preds` is [1, 4 + num_classes, num_anchors]: rows 0..4 hold cxcywh
    /// boxes in model-input pixels, the remaining rows per-class scores
    /// (already sigmoid-activated in the exported graph).
    pub fn parse_detections(
        &self,
        preds: &ndarray::ArrayViewD<f32>,
        transform: &TransformParams,
    ) -> anyhow::Result<Vec<DetectedBox>> {
        let shape = preds.shape();
        if shape.len() != 3 || shape[1] < 5 {
            anyhow::bail!("unexpected prediction shape {:?}", shape);
        }
        let num_classes = shape[1] - 4;
        let num_anchors = shape[2];

        let mut candidates = Vec::new();

        for a in 0..num_anchors {
            // Argmax over class scores for this anchor
            let mut best_score = f32::NEG_INFINITY;
            let mut class_idx = 0usize;
            for c in 0..num_classes {
                let score = preds[[0, 4 + c, a]];
                if score > best_score {
                    best_score = score;
                    class_idx = c;
                }
            }

            if best_score < self.confidence_threshold {
                continue;
            }

            let cx = preds[[0, 0, a]];
            let cy = preds[[0, 1, a]];
            let w = preds[[0, 2, a]];
            let h = preds[[0, 3, a]];

            let (x1_input, y1_input, x2_input, y2_input) = cxcywh_to_xyxy(cx, cy, w, h);

            // Apply inverse letterbox transform to original image coordinates
            let x1 = ((x1_input - transform.offset_x) / transform.scale)
                .clamp(0.0, transform.orig_width as f32);
            let y1 = ((y1_input - transform.offset_y) / transform.scale)
                .clamp(0.0, transform.orig_height as f32);
            let x2 = ((x2_input - transform.offset_x) / transform.scale)
                .clamp(0.0, transform.orig_width as f32);
            let y2 = ((y2_input - transform.offset_y) / transform.scale)
                .clamp(0.0, transform.orig_height as f32);

            candidates.push(DetectedBox {
                class_id: class_idx as u16,
                confidence: best_score,
                bbox: [x1, y1, x2, y2],
            });
        }

        candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

        Ok(self.non_max_suppression(candidates))
    }

    /// Class-wise non-maximum suppression. Candidates must already be
    /// sorted by descending confidence.
    fn non_max_suppression(&self, candidates: Vec<DetectedBox>) -> Vec<DetectedBox> {
        let mut kept: Vec<DetectedBox> = Vec::with_capacity(candidates.len());

        for candidate in candidates {
            let suppressed = kept.iter().any(|k| {
                k.class_id == candidate.class_id
                    && iou(&k.bbox, &candidate.bbox) > self.iou_threshold
            });
            if !suppressed {
                kept.push(candidate);
            }
        }

        kept
    }
}

/// Convert bounding box from center-width-height format to corner format
#[inline]
fn cxcywh_to_xyxy(cx: f32, cy: f32, w: f32, h: f32) -> (f32, f32, f32, f32) {
    let x1 = cx - w / 2.0;
    let y1 = cy - h / 2.0;
    let x2 = cx + w / 2.0;
    let y2 = cy + h / 2.0;
    (x1, y1, x2, y2)
}

/// Intersection over union of two xyxy boxes
fn iou(a: &[f32; 4], b: &[f32; 4]) -> f32 {
    let x1 = a[0].max(b[0]);
    let y1 = a[1].max(b[1]);
    let x2 = a[2].min(b[2]);
    let y2 = a[3].min(b[3]);

    let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    let area_a = (a[2] - a[0]).max(0.0) * (a[3] - a[1]).max(0.0);
    let area_b = (b[2] - b[0]).max(0.0) * (b[3] - b[1]).max(0.0);
    let union = area_a + area_b - intersection;

    if union <= 0.0 { 0.0 } else { intersection / union }
}
