pub mod health;
pub mod predict;

pub use health::{health_check, readiness_check};
pub use predict::predict;
