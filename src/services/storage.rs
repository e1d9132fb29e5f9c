use crate::error::AppError;
use std::path::PathBuf;
use tokio::fs;
use uuid::Uuid;

/// Local upload directory. Files are keyed by a fresh UUID plus the original
/// extension so concurrent uploads with the same client filename cannot
/// overwrite each other. There is no retention policy; the directory grows
/// until operators clean it.
#[derive(Clone)]
pub struct UploadStore {
    base_path: PathBuf,
}

impl UploadStore {
    pub async fn new(base_path: impl Into<PathBuf>) -> Result<Self, AppError> {
        let base_path = base_path.into();
        if !base_path.exists() {
            fs::create_dir_all(&base_path).await?;
        }
        Ok(Self { base_path })
    }

    /// Persist `data` under a unique key derived from `original_name`'s
    /// extension. Returns the path the file was written to.
    pub async fn store(&self, original_name: &str, data: Vec<u8>) -> Result<PathBuf, AppError> {
        let extension = std::path::Path::new(original_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("bin");

        let key = format!("{}.{}", Uuid::new_v4(), extension);
        let path = self.base_path.join(key);
        fs::write(&path, data).await?;
        Ok(path)
    }
}
