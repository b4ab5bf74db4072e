use super::entities::AspectRatio;
use super::image::ImageData;
use crate::modules::credentials::Credential;
use crate::shared::errors::AppResult;
use async_trait::async_trait;

/// Inputs of one scene-composition call
#[derive(Debug, Clone, PartialEq)]
pub struct SceneRequest {
    /// Product, usually background-removed
    pub subject: ImageData,
    pub character: ImageData,
    pub instruction: String,
    pub background_reference: Option<ImageData>,
    /// Identical inputs with the same seed reproduce the same output
    pub seed: Option<u64>,
}

/// Remote image model contract
///
/// Every call either returns exactly one image or fails. Quota and auth
/// rejections fail with `AppError::RateLimitError`; a response without an
/// image fails with `AppError::GenerationError`.
#[async_trait]
pub trait ImageGenerationService: Send + Sync {
    async fn remove_background(
        &self,
        credential: &Credential,
        image: &ImageData,
        instruction: &str,
    ) -> AppResult<ImageData>;

    async fn generate_scene(
        &self,
        credential: &Credential,
        request: SceneRequest,
    ) -> AppResult<ImageData>;

    async fn generate_image_from_text(
        &self,
        credential: &Credential,
        instruction: &str,
        aspect_ratio: AspectRatio,
    ) -> AppResult<ImageData>;

    async fn edit_image(
        &self,
        credential: &Credential,
        image: &ImageData,
        instruction: &str,
    ) -> AppResult<ImageData>;
}
