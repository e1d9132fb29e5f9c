use flower_service::config::FlowerConfig;
use flower_service::services::detector::mock::MockDetector;
use flower_service::services::detector::{BoundingBox, Detection, Detector};
use flower_service::services::providers::mock::MockTextProvider;
use flower_service::services::providers::TextProvider;
use flower_service::startup::Application;
use std::sync::Arc;
use uuid::Uuid;

pub struct TestApp {
    pub address: String,
    pub upload_dir: String,
}

impl TestApp {
    /// Spawn the app with an empty detector and a canned provider.
    #[allow(dead_code)]
    pub async fn spawn() -> Self {
        Self::spawn_with(
            Arc::new(MockDetector::empty()),
            Arc::new(MockTextProvider::replying("mock reply")),
        )
        .await
    }

    pub async fn spawn_with(
        detector: Arc<dyn Detector>,
        text_provider: Arc<dyn TextProvider>,
    ) -> Self {
        std::env::set_var("OPENAI_API_KEY", "test-api-key");

        let mut config = FlowerConfig::load().expect("Failed to load configuration");
        config.common.port = 0; // Random port for testing
        config.storage.upload_dir = format!("target/test-uploads-{}", Uuid::new_v4());
        let upload_dir = config.storage.upload_dir.clone();

        let app = Application::build_with_components(config, detector, text_provider)
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the server to be ready by polling the health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            upload_dir,
        }
    }

    /// Cleanup test resources (upload directory).
    #[allow(dead_code)]
    pub async fn cleanup(&self) {
        let _ = tokio::fs::remove_dir_all(&self.upload_dir).await;
    }
}

/// Shorthand for a detection with a fixed unit bounding box.
#[allow(dead_code)]
pub fn detection(label: &str, confidence: f32) -> Detection {
    Detection {
        label: label.to_string(),
        confidence,
        bbox: BoundingBox {
            x1: 0.0,
            y1: 0.0,
            x2: 10.0,
            y2: 10.0,
        },
    }
}

/// Minimal multipart form carrying `bytes` as the `image` field.
#[allow(dead_code)]
pub fn image_form(file_name: &str, bytes: Vec<u8>) -> reqwest::multipart::Form {
    reqwest::multipart::Form::new().part(
        "image",
        reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str("image/jpeg")
            .unwrap(),
    )
}
