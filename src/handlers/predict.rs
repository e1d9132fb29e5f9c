use crate::dtos::{PredictQuery, PredictResponse, PredictionDto};
use crate::error::AppError;
use crate::services::detector::filter_by_threshold;
use crate::services::narrative;
use crate::startup::AppState;
use axum::{
    extract::{Multipart, Query, State},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

const DEFAULT_THRESHOLD: f32 = 0.8;
const NO_FLOWERS_MESSAGE: &str = "No flowers detected in the image. Try another image.";

const ALLOWED_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// True iff the filename has an extension and it is an allowed image type.
/// Only the segment after the last dot counts.
fn allowed_file(filename: &str) -> bool {
    match filename.rsplit_once('.') {
        Some((_, ext)) => ALLOWED_EXTENSIONS.contains(&ext.to_lowercase().as_str()),
        None => false,
    }
}

pub async fn predict(
    State(state): State<AppState>,
    Query(params): Query<PredictQuery>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let threshold = params.threshold.unwrap_or(DEFAULT_THRESHOLD);
    if !(0.0..=1.0).contains(&threshold) {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "threshold must be between 0.0 and 1.0"
        )));
    }

    // Find the "image" field; other fields are ignored.
    let field = loop {
        match multipart.next_field().await.map_err(|e| {
            AppError::BadRequest(anyhow::anyhow!("Failed to read multipart field: {}", e))
        })? {
            Some(field) if field.name() == Some("image") => break field,
            Some(_) => continue,
            None => {
                return Err(AppError::BadRequest(anyhow::anyhow!("No image found")));
            }
        }
    };

    let file_name = field.file_name().unwrap_or("").to_string();
    if !allowed_file(&file_name) {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "File not allowed, expected JPG/JPEG/PNG"
        )));
    }

    let data = field
        .bytes()
        .await
        .map_err(|e| AppError::BadRequest(anyhow::anyhow!("Failed to read file bytes: {}", e)))?
        .to_vec();

    let image_path = state.uploads.store(&file_name, data).await?;

    tracing::info!(
        file_name = %file_name,
        path = %image_path.display(),
        threshold = threshold,
        "Running detection"
    );

    let detections = state
        .detector
        .detect(&image_path)
        .await
        .map_err(|e| AppError::InternalError(anyhow::anyhow!("Detection failed: {}", e)))?;

    let flowers = filter_by_threshold(&detections, threshold);

    if flowers.is_empty() {
        tracing::info!(
            raw_detections = detections.len(),
            "No detections above threshold"
        );
        return Ok(Json(json!({ "message": NO_FLOWERS_MESSAGE })).into_response());
    }

    // The two provider calls are sequential; failures degrade to fallback
    // strings inside the generators.
    let recommendation = narrative::care_recommendation(state.text_provider.as_ref(), &flowers).await;
    let flower_details = narrative::flower_details(state.text_provider.as_ref(), &flowers).await;

    let predictions = flowers
        .into_iter()
        .map(|d| PredictionDto {
            class: d.label,
            confidence: d.confidence,
        })
        .collect();

    Ok(Json(PredictResponse {
        predictions,
        recommendation,
        flower_details,
    })
    .into_response())
}
