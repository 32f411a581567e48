pub mod config;
pub mod digest;
pub mod logging;
pub mod matcher;
pub mod models;
pub mod monitor;
pub mod normalizer;
pub mod plugins;
pub mod scheduler;
pub mod store;
pub mod utils;

// Re-export commonly used types
pub use config::AppConfig;
pub use monitor::{CycleReport, Monitor};
pub use utils::error::AppError;

pub type Result<T> = std::result::Result<T, AppError>;
