/// Image generation
///
/// - Domain: images, products, generated artifacts and the remote model contract
/// - Application: the multi-variant scene pipeline, background-removal batch
///   and single-shot actions
/// - Prompts: catalogs and instruction templates
/// - Infrastructure: the Gemini HTTP client
pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod prompts;

pub use application::{
    BackgroundRemovalProcessor, NewBackgroundRequest, SceneGenerationProcessor, SceneSettings,
    SingleShotService,
};
pub use domain::{
    AspectRatio, Backdrop, CreativeMode, FrameType, GeneratedImage, GenerationType, ImageData,
    ImageGenerationService, ProcessingStatus, ProductImageFile, ProductJob, SceneRequest,
};
pub use infrastructure::GeminiClient;
