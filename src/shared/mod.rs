// Shared kernel: configuration, error types and logging used by every module

pub mod config; // Environment-driven process configuration
pub mod errors; // Shared error types
pub mod utils; // Shared utilities

pub use config::AppConfig;
pub use errors::{AppError, AppResult};
