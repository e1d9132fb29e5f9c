use crate::error::AppError;
use config::{Config as Cfg, File};
use serde::Deserialize;
use std::env;

/// Ultralytics default confidence floor; request-level thresholding happens
/// in the handler on top of this.
const DEFAULT_BASE_CONFIDENCE: f32 = 0.25;
const DEFAULT_IOU_THRESHOLD: f32 = 0.45;
const DEFAULT_INPUT_SIZE: u32 = 640;

/// Classes of the flowers dataset the bundled model was trained on.
/// Overridden by a labels file when `FLOWER_MODEL_LABELS` is set.
pub const DEFAULT_CLASS_NAMES: [&str; 5] = ["daisy", "dandelion", "rose", "sunflower", "tulip"];

#[derive(Debug, Clone, Deserialize)]
pub struct CommonConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    8080
}

impl CommonConfig {
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let config = Cfg::builder()
            .add_source(File::with_name("configuration").required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }
}

#[derive(Debug, Clone)]
pub struct FlowerConfig {
    pub common: CommonConfig,
    pub openai: OpenAiConfig,
    pub model: ModelConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// Path to the YOLO ONNX export.
    pub path: String,
    /// Optional labels file, one class name per line.
    pub labels_path: Option<String>,
    pub input_size: u32,
    pub base_confidence: f32,
    pub iou_threshold: f32,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub upload_dir: String,
}

impl FlowerConfig {
    pub fn load() -> Result<Self, AppError> {
        let common = CommonConfig::load()?;
        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        Ok(FlowerConfig {
            common,
            openai: OpenAiConfig {
                api_key: get_env("OPENAI_API_KEY", None, is_prod)?,
                model: get_env("OPENAI_MODEL", Some("gpt-4o-mini"), is_prod)?,
            },
            model: ModelConfig {
                path: get_env("FLOWER_MODEL_PATH", Some("models/yolo11_flowers.onnx"), is_prod)?,
                labels_path: env::var("FLOWER_MODEL_LABELS").ok(),
                input_size: get_env(
                    "FLOWER_MODEL_INPUT_SIZE",
                    Some(&DEFAULT_INPUT_SIZE.to_string()),
                    is_prod,
                )?
                .parse()
                .unwrap_or(DEFAULT_INPUT_SIZE),
                base_confidence: get_env(
                    "FLOWER_BASE_CONFIDENCE",
                    Some(&DEFAULT_BASE_CONFIDENCE.to_string()),
                    is_prod,
                )?
                .parse()
                .unwrap_or(DEFAULT_BASE_CONFIDENCE),
                iou_threshold: get_env(
                    "FLOWER_IOU_THRESHOLD",
                    Some(&DEFAULT_IOU_THRESHOLD.to_string()),
                    is_prod,
                )?
                .parse()
                .unwrap_or(DEFAULT_IOU_THRESHOLD),
            },
            storage: StorageConfig {
                upload_dir: get_env("FLOWER_UPLOAD_DIR", Some("uploads"), is_prod)?,
            },
        })
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}
