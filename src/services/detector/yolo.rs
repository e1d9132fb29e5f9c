//! ONNX Runtime backed YOLO detector.
//!
//! Loads a YOLO ONNX export once at startup and runs inference on a blocking
//! task per request. Decodes the `[1, 4 + nc, anchors]` output layout used by
//! YOLOv8/YOLO11 exports.

use super::{BoundingBox, Detection, Detector, DetectorError};
use crate::config::{ModelConfig, DEFAULT_CLASS_NAMES};
use async_trait::async_trait;
use ndarray::Array4;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::TensorRef;
use std::path::Path;
use std::sync::{Arc, Mutex};

pub struct YoloDetector {
    inner: Arc<Inner>,
}

struct Inner {
    // ort sessions take &mut for run; requests serialize on this lock.
    session: Mutex<Session>,
    names: Vec<String>,
    input_size: u32,
    base_confidence: f32,
    iou_threshold: f32,
}

impl YoloDetector {
    pub fn load(config: &ModelConfig) -> Result<Self, DetectorError> {
        let session = Session::builder()
            .and_then(|b| b.with_optimization_level(GraphOptimizationLevel::Level3))
            .and_then(|b| b.commit_from_file(&config.path))
            .map_err(|e| DetectorError::ModelLoad(e.to_string()))?;

        let names: Vec<String> = match &config.labels_path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .map_err(|e| DetectorError::ModelLoad(format!("labels file {path}: {e}")))?;
                raw.lines()
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .map(String::from)
                    .collect()
            }
            None => DEFAULT_CLASS_NAMES.iter().map(|s| s.to_string()).collect(),
        };

        tracing::info!(
            model = %config.path,
            classes = names.len(),
            input_size = config.input_size,
            "Loaded YOLO model"
        );

        Ok(Self {
            inner: Arc::new(Inner {
                session: Mutex::new(session),
                names,
                input_size: config.input_size,
                base_confidence: config.base_confidence,
                iou_threshold: config.iou_threshold,
            }),
        })
    }
}

#[async_trait]
impl Detector for YoloDetector {
    async fn detect(&self, path: &Path) -> Result<Vec<Detection>, DetectorError> {
        let inner = self.inner.clone();
        let path = path.to_owned();

        tokio::task::spawn_blocking(move || inner.infer(&path))
            .await
            .map_err(|e| DetectorError::Inference(format!("inference task panicked: {e}")))?
    }
}

impl Inner {
    fn infer(&self, path: &Path) -> Result<Vec<Detection>, DetectorError> {
        let image = image::open(path).map_err(|e| DetectorError::ImageRead(e.to_string()))?;
        let (orig_width, orig_height) = (image.width() as f32, image.height() as f32);

        let size = self.input_size;
        let resized = image
            .resize_exact(size, size, image::imageops::FilterType::Triangle)
            .to_rgb8();

        let mut input = Array4::<f32>::zeros((1, 3, size as usize, size as usize));
        for (x, y, pixel) in resized.enumerate_pixels() {
            input[[0, 0, y as usize, x as usize]] = pixel[0] as f32 / 255.0;
            input[[0, 1, y as usize, x as usize]] = pixel[1] as f32 / 255.0;
            input[[0, 2, y as usize, x as usize]] = pixel[2] as f32 / 255.0;
        }

        let mut session = self
            .session
            .lock()
            .map_err(|_| DetectorError::Inference("session lock poisoned".to_string()))?;

        let input_tensor = TensorRef::from_array_view(&input)
            .map_err(|e| DetectorError::Inference(e.to_string()))?;
        let input_name = session.inputs[0].name.clone();
        let output_name = session.outputs[0].name.clone();
        let outputs = session
            .run(ort::inputs![input_name.as_str() => input_tensor])
            .map_err(|e| DetectorError::Inference(e.to_string()))?;

        let preds = outputs[output_name.as_str()]
            .try_extract_array::<f32>()
            .map_err(|e| DetectorError::Inference(e.to_string()))?;

        let shape = preds.shape();
        let nc = self.names.len();
        if shape.len() != 3 || shape[1] != 4 + nc {
            return Err(DetectorError::Inference(format!(
                "unexpected output shape {:?}, expected [1, {}, anchors]",
                shape,
                4 + nc
            )));
        }

        let scale_x = orig_width / size as f32;
        let scale_y = orig_height / size as f32;
        let anchors = shape[2];

        // Per anchor: best class score, keep above the base floor.
        let mut candidates: Vec<Detection> = Vec::new();
        for a in 0..anchors {
            let mut best_class = 0;
            let mut best_score = 0.0f32;
            for c in 0..nc {
                let score = preds[[0, 4 + c, a]];
                if score > best_score {
                    best_score = score;
                    best_class = c;
                }
            }
            if best_score < self.base_confidence {
                continue;
            }

            let cx = preds[[0, 0, a]];
            let cy = preds[[0, 1, a]];
            let w = preds[[0, 2, a]];
            let h = preds[[0, 3, a]];

            candidates.push(Detection {
                label: self.names[best_class].clone(),
                confidence: best_score,
                bbox: BoundingBox {
                    x1: (cx - w / 2.0) * scale_x,
                    y1: (cy - h / 2.0) * scale_y,
                    x2: (cx + w / 2.0) * scale_x,
                    y2: (cy + h / 2.0) * scale_y,
                },
            });
        }

        Ok(non_max_suppression(candidates, self.iou_threshold))
    }
}

/// Class-aware greedy NMS; returns survivors ordered by descending confidence.
fn non_max_suppression(mut candidates: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
    candidates.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut kept: Vec<Detection> = Vec::new();
    for candidate in candidates {
        let suppressed = kept
            .iter()
            .any(|k| k.label == candidate.label && k.bbox.iou(&candidate.bbox) > iou_threshold);
        if !suppressed {
            kept.push(candidate);
        }
    }
    kept
}
