pub mod catalog;
pub mod templates;

pub use catalog::PosePool;
