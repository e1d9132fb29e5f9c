pub mod detector;
pub mod narrative;
pub mod providers;
pub mod storage;

pub use storage::UploadStore;
