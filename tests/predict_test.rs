//! Integration tests for `POST /predict`.
//!
//! The detection model and the text provider are substituted with mocks; the
//! tests exercise the full HTTP pipeline from multipart upload to JSON body.

mod common;

use axum::http::StatusCode;
use common::{detection, image_form, TestApp};
use flower_service::services::detector::mock::MockDetector;
use flower_service::services::narrative::{DETAILS_FALLBACK, RECOMMENDATION_FALLBACK};
use flower_service::services::providers::mock::MockTextProvider;
use std::sync::Arc;

#[tokio::test]
async fn missing_image_field_returns_400() {
    let app = TestApp::spawn().await;
    let client = reqwest::Client::new();

    let form = reqwest::multipart::Form::new().text("note", "no file here");
    let response = client
        .post(format!("{}/predict", app.address))
        .multipart(form)
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::BAD_REQUEST, response.status());
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["error"], "No image found");

    app.cleanup().await;
}

#[tokio::test]
async fn disallowed_extension_returns_400() {
    let app = TestApp::spawn().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/predict", app.address))
        .multipart(image_form("flower.gif", vec![0; 64]))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::BAD_REQUEST, response.status());
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["error"], "File not allowed, expected JPG/JPEG/PNG");

    app.cleanup().await;
}

#[tokio::test]
async fn detections_above_threshold_are_returned_with_narratives() {
    let app = TestApp::spawn_with(
        Arc::new(MockDetector::new(vec![
            detection("rose", 0.95),
            detection("tulip", 0.82),
        ])),
        Arc::new(MockTextProvider::replying("Keep the soil moist.")),
    )
    .await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/predict", app.address))
        .multipart(image_form("flower.jpg", vec![0; 64]))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::OK, response.status());
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");

    let predictions = body["predictions"].as_array().expect("predictions array");
    assert_eq!(predictions.len(), 2);
    assert_eq!(predictions[0]["class"], "rose");
    assert_eq!(predictions[1]["class"], "tulip");
    let rose_conf = predictions[0]["confidence"].as_f64().unwrap();
    assert!((rose_conf - 0.95).abs() < 1e-6);

    assert_eq!(body["recommendation"], "Keep the soil moist.");
    assert_eq!(body["flower_details"], "Keep the soil moist.");

    app.cleanup().await;
}

#[tokio::test]
async fn threshold_parameter_refilters_detections() {
    let app = TestApp::spawn_with(
        Arc::new(MockDetector::new(vec![
            detection("rose", 0.95),
            detection("tulip", 0.82),
        ])),
        Arc::new(MockTextProvider::replying("ok")),
    )
    .await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/predict?threshold=0.9", app.address))
        .multipart(image_form("flower.jpg", vec![0; 64]))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::OK, response.status());
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");

    let predictions = body["predictions"].as_array().expect("predictions array");
    assert_eq!(predictions.len(), 1);
    assert_eq!(predictions[0]["class"], "rose");

    app.cleanup().await;
}

#[tokio::test]
async fn no_detections_returns_message_without_predictions() {
    let app = TestApp::spawn_with(
        Arc::new(MockDetector::empty()),
        Arc::new(MockTextProvider::replying("should never be called")),
    )
    .await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/predict", app.address))
        .multipart(image_form("flower.png", vec![0; 64]))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::OK, response.status());
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");

    assert_eq!(
        body["message"],
        "No flowers detected in the image. Try another image."
    );
    assert!(body.get("predictions").is_none());

    app.cleanup().await;
}

#[tokio::test]
async fn provider_failure_degrades_to_fallback_strings() {
    let app = TestApp::spawn_with(
        Arc::new(MockDetector::new(vec![detection("daisy", 0.9)])),
        Arc::new(MockTextProvider::failing()),
    )
    .await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/predict", app.address))
        .multipart(image_form("daisy.jpeg", vec![0; 64]))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::OK, response.status());
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");

    let predictions = body["predictions"].as_array().expect("predictions array");
    assert_eq!(predictions.len(), 1);
    assert_eq!(predictions[0]["class"], "daisy");
    assert_eq!(body["recommendation"], RECOMMENDATION_FALLBACK);
    assert_eq!(body["flower_details"], DETAILS_FALLBACK);

    app.cleanup().await;
}

#[tokio::test]
async fn unparsable_threshold_returns_400() {
    let app = TestApp::spawn().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/predict?threshold=abc", app.address))
        .multipart(image_form("flower.jpg", vec![0; 64]))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::BAD_REQUEST, response.status());

    app.cleanup().await;
}

#[tokio::test]
async fn out_of_range_threshold_returns_400() {
    let app = TestApp::spawn().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/predict?threshold=1.5", app.address))
        .multipart(image_form("flower.jpg", vec![0; 64]))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::BAD_REQUEST, response.status());
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["error"], "threshold must be between 0.0 and 1.0");

    app.cleanup().await;
}

#[tokio::test]
async fn uploaded_file_is_persisted() {
    let app = TestApp::spawn_with(
        Arc::new(MockDetector::empty()),
        Arc::new(MockTextProvider::replying("ok")),
    )
    .await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/predict", app.address))
        .multipart(image_form("flower.jpg", vec![1, 2, 3, 4]))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::OK, response.status());

    let mut entries = tokio::fs::read_dir(&app.upload_dir)
        .await
        .expect("upload dir missing");
    let entry = entries
        .next_entry()
        .await
        .expect("read_dir failed")
        .expect("no file persisted");
    let name = entry.file_name().into_string().unwrap();
    assert!(name.ends_with(".jpg"));

    app.cleanup().await;
}
