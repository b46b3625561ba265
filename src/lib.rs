pub mod app;
pub mod classify;
pub mod config;
pub mod image;
pub mod models;
pub mod utils;
pub mod web;

// 重新导出主要类型
pub use app::AppState;
pub use classify::{ClassificationResult, RankedPrediction};
pub use config::Config;
pub use utils::error::ClassifyError;

pub type Result<T> = std::result::Result<T, ClassifyError>;
