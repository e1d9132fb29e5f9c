use serde::{Deserialize, Serialize};

/// Query parameters for `POST /predict`.
#[derive(Debug, Deserialize)]
pub struct PredictQuery {
    /// Minimum confidence for a detection to be reported. Defaults to 0.8.
    pub threshold: Option<f32>,
}

/// One reported detection.
#[derive(Debug, Serialize)]
pub struct PredictionDto {
    pub class: String,
    pub confidence: f32,
}

/// Response body when at least one detection survives the threshold.
#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub predictions: Vec<PredictionDto>,
    pub recommendation: String,
    pub flower_details: String,
}
