pub mod entities;
pub mod image;
pub mod service;

pub use entities::{
    AspectRatio, Backdrop, CreativeMode, FrameType, GeneratedImage, GenerationType,
    ProcessingStatus, ProductImageFile, ProductJob,
};
pub use image::ImageData;
pub use service::{ImageGenerationService, SceneRequest};
