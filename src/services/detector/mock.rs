//! Mock detector for testing.

use super::{Detection, Detector, DetectorError};
use async_trait::async_trait;
use std::path::Path;

/// Returns a canned detection list regardless of the image.
pub struct MockDetector {
    detections: Vec<Detection>,
}

impl MockDetector {
    pub fn new(detections: Vec<Detection>) -> Self {
        Self { detections }
    }

    /// A detector that never finds anything.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }
}

#[async_trait]
impl Detector for MockDetector {
    async fn detect(&self, _path: &Path) -> Result<Vec<Detection>, DetectorError> {
        Ok(self.detections.clone())
    }
}
