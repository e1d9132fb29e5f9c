use crate::config::FlowerConfig;
use crate::error::AppError;
use crate::handlers;
use crate::services::detector::{yolo::YoloDetector, Detector};
use crate::services::providers::openai::{OpenAiConfig, OpenAiTextProvider};
use crate::services::providers::TextProvider;
use crate::services::UploadStore;
use axum::{
    routing::{get, post},
    Router,
};
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub config: FlowerConfig,
    pub uploads: UploadStore,
    pub detector: Arc<dyn Detector>,
    pub text_provider: Arc<dyn TextProvider>,
}

pub struct Application {
    port: u16,
    server: Box<dyn std::future::Future<Output = std::io::Result<()>> + Send + Unpin>,
}

impl Application {
    /// Build the application with the production detector and provider.
    pub async fn build(config: FlowerConfig) -> Result<Self, AppError> {
        let detector: Arc<dyn Detector> = Arc::new(YoloDetector::load(&config.model).map_err(
            |e| {
                tracing::error!("Failed to load detection model: {}", e);
                AppError::InternalError(anyhow::anyhow!("Model load error: {}", e))
            },
        )?);

        let text_provider: Arc<dyn TextProvider> =
            Arc::new(OpenAiTextProvider::new(OpenAiConfig {
                api_key: config.openai.api_key.clone(),
                model: config.openai.model.clone(),
            }));

        tracing::info!(
            model = %config.openai.model,
            "Initialized OpenAI text provider"
        );

        Self::build_with_components(config, detector, text_provider).await
    }

    /// Build the application around caller-supplied detector and provider.
    /// Tests use this to substitute mocks.
    pub async fn build_with_components(
        config: FlowerConfig,
        detector: Arc<dyn Detector>,
        text_provider: Arc<dyn TextProvider>,
    ) -> Result<Self, AppError> {
        let uploads = UploadStore::new(&config.storage.upload_dir)
            .await
            .map_err(|e| {
                tracing::error!(
                    "Failed to initialize upload store at {}: {}",
                    config.storage.upload_dir,
                    e
                );
                e
            })?;

        let state = AppState {
            config: config.clone(),
            uploads,
            detector,
            text_provider,
        };

        let app = Router::new()
            .route("/health", get(handlers::health_check))
            .route("/ready", get(handlers::readiness_check))
            .route("/predict", post(handlers::predict))
            .layer(TraceLayer::new_for_http())
            .with_state(state);

        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Listening on {}", port);

        let server = axum::serve(listener, app);

        Ok(Self {
            port,
            server: Box::new(server.into_future()),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.server.await
    }
}
