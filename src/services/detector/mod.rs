//! Flower detection abstractions and implementations.
//!
//! The `Detector` trait decouples the prediction handler from the inference
//! backend (ONNX Runtime in production, canned results in tests).

pub mod mock;
pub mod yolo;

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DetectorError {
    #[error("Failed to load model: {0}")]
    ModelLoad(String),

    #[error("Failed to read image: {0}")]
    ImageRead(String),

    #[error("Inference failed: {0}")]
    Inference(String),
}

/// Axis-aligned bounding box in input-image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    pub fn area(&self) -> f32 {
        (self.x2 - self.x1).max(0.0) * (self.y2 - self.y1).max(0.0)
    }

    /// Intersection-over-union with another box.
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let ix1 = self.x1.max(other.x1);
        let iy1 = self.y1.max(other.y1);
        let ix2 = self.x2.min(other.x2);
        let iy2 = self.y2.min(other.y2);

        let intersection = (ix2 - ix1).max(0.0) * (iy2 - iy1).max(0.0);
        let union = self.area() + other.area() - intersection;
        if union <= 0.0 {
            return 0.0;
        }
        intersection / union
    }
}

/// One classified bounding box, label already resolved via the model's
/// class-name table.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub label: String,
    pub confidence: f32,
    pub bbox: BoundingBox,
}

/// Retain exactly the detections with confidence >= threshold, preserving
/// relative order.
pub fn filter_by_threshold(detections: &[Detection], threshold: f32) -> Vec<Detection> {
    detections
        .iter()
        .filter(|d| d.confidence >= threshold)
        .cloned()
        .collect()
}

#[async_trait]
pub trait Detector: Send + Sync {
    /// Run the model on the image at `path` and return every detection above
    /// the model's base confidence floor.
    async fn detect(&self, path: &Path) -> Result<Vec<Detection>, DetectorError>;
}
