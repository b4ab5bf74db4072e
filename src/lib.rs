pub mod modules;
pub mod shared;

pub use modules::studio::StudioService;
pub use shared::{AppConfig, AppError, AppResult};
