//! One-off generation actions outside the batch orchestrator.
//!
//! Credentials come from the rotating picker and rate-limit errors are
//! returned to the caller as-is.

use crate::modules::credentials::{Credential, KeyRotation};
use crate::modules::generation::domain::{
    AspectRatio, GeneratedImage, GenerationType, ImageData, ImageGenerationService, SceneRequest,
};
use crate::modules::generation::prompts::catalog::{random_background, MAX_SEED};
use crate::modules::generation::prompts::templates::{with_negative, with_variation_references};
use crate::modules::jobs::{ProgressTracker, StopSignal};
use crate::modules::studio::domain::{ActivityLog, Gallery, Viewer};
use crate::shared::errors::{AppError, AppResult};
use crate::log_debug;
use std::sync::Arc;

/// A fresh scene for an already processed product and character
#[derive(Debug, Clone, PartialEq)]
pub struct NewBackgroundRequest {
    /// Background-removed product
    pub product: ImageData,
    pub original_product: ImageData,
    pub character: ImageData,
    pub base_prompt: String,
    pub negative_prompt: String,
    pub bg_removal_prompt: String,
    pub background_reference: String,
    pub pose_reference: String,
    pub style_reference: String,
    /// Joined descriptors; a random catalog background is used when empty
    pub references: String,
    pub seed: u64,
    pub source_product_id: Option<String>,
}

#[derive(Clone)]
pub struct SingleShotService {
    service: Arc<dyn ImageGenerationService>,
    rotation: KeyRotation,
    gallery: Gallery,
    viewer: Viewer,
    activity: ActivityLog,
    progress: ProgressTracker,
    stop: StopSignal,
    auto_save: bool,
}

impl SingleShotService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        service: Arc<dyn ImageGenerationService>,
        rotation: KeyRotation,
        gallery: Gallery,
        viewer: Viewer,
        activity: ActivityLog,
        progress: ProgressTracker,
        stop: StopSignal,
    ) -> Self {
        Self {
            service,
            rotation,
            gallery,
            viewer,
            activity,
            progress,
            stop,
            auto_save: true,
        }
    }

    pub fn with_auto_save(mut self, auto_save: bool) -> Self {
        self.auto_save = auto_save;
        self
    }

    fn credential(&self) -> AppResult<Credential> {
        self.rotation.next_credential().ok_or_else(|| {
            AppError::ValidationError("No API key configured. Add one in the API settings.".to_string())
        })
    }

    async fn publish(&self, image: &GeneratedImage) {
        self.viewer.show(image.clone()).await;
        if self.auto_save {
            self.gallery.prepend(image.clone()).await;
        }
    }

    /// Generate `count` images one after another from a text prompt
    ///
    /// A failed variant is counted and reported and the loop moves on; the
    /// stop signal ends it between variants.
    pub async fn text_to_image(
        &self,
        prompt: &str,
        aspect_ratio: AspectRatio,
        count: usize,
    ) -> AppResult<Vec<GeneratedImage>> {
        if prompt.trim().is_empty() {
            return Err(AppError::ValidationError(
                "Describe the image to generate.".to_string(),
            ));
        }
        if count == 0 {
            return Err(AppError::ValidationError(
                "At least one image is required.".to_string(),
            ));
        }

        self.stop.reset();
        self.activity.dismiss_banner().await;
        self.progress.reset(count);
        self.activity.info("Starting text-to-image generation.").await;

        let mut generated = Vec::new();
        for index in 0..count {
            if self.stop.is_stopped() {
                break;
            }
            let label = format!("Image {}/{}", index + 1, count);

            let credential = match self.credential() {
                Ok(credential) => credential,
                Err(e) => {
                    self.progress.record_failure(count - index);
                    self.activity.error(e.to_string()).await;
                    break;
                }
            };

            match self
                .service
                .generate_image_from_text(&credential, prompt, aspect_ratio)
                .await
            {
                Ok(image) => {
                    if self.stop.is_stopped() {
                        continue;
                    }
                    let mut result = GeneratedImage::new(image, GenerationType::Tti, prompt);
                    result.aspect_ratio = Some(aspect_ratio);
                    self.publish(&result).await;
                    self.progress.record_success();
                    self.activity.info(format!("{}: done.", label)).await;
                    generated.push(result);
                }
                Err(e) => {
                    self.progress.record_failure(1);
                    self.activity.error(format!("{}: {}", label, e)).await;
                }
            }
        }

        Ok(generated)
    }

    pub async fn edit(&self, source: &ImageData, instruction: &str) -> AppResult<GeneratedImage> {
        if instruction.trim().is_empty() {
            return Err(AppError::ValidationError(
                "Upload a source image and describe the edit.".to_string(),
            ));
        }
        let credential = self.credential()?;
        self.stop.reset();
        self.activity.info("Editing image.").await;

        let image = match self.service.edit_image(&credential, source, instruction).await {
            Ok(image) => image,
            Err(e) => {
                self.activity.error(format!("Image edit failed: {}", e)).await;
                return Err(e);
            }
        };
        if self.stop.is_stopped() {
            return Err(AppError::GenerationError("Stopped by user.".to_string()));
        }

        let mut result = GeneratedImage::new(image, GenerationType::Edit, instruction);
        result.original_product = Some(source.clone());
        self.publish(&result).await;
        self.activity.info("Image edited.").await;
        Ok(result)
    }

    pub async fn new_background(&self, request: NewBackgroundRequest) -> AppResult<GeneratedImage> {
        if request.seed > MAX_SEED {
            return Err(AppError::ValidationError(format!(
                "Seed must be between 0 and {}.",
                MAX_SEED
            )));
        }
        let credential = self.credential()?;
        self.stop.reset();
        self.activity.dismiss_banner().await;

        let mut references = request.references.trim().to_string();
        if references.is_empty() {
            let background = random_background();
            self.activity
                .info(format!("New background: using a random background: {}", background))
                .await;
            references = background.to_string();
        }
        let instruction = with_negative(
            &with_variation_references(&request.base_prompt, &references),
            &request.negative_prompt,
        );
        log_debug!("New background with seed {}", request.seed);

        let generated = self
            .service
            .generate_scene(
                &credential,
                SceneRequest {
                    subject: request.product.clone(),
                    character: request.character.clone(),
                    instruction,
                    background_reference: None,
                    seed: Some(request.seed),
                },
            )
            .await;
        let image = match generated {
            Ok(image) => image,
            Err(e) => {
                self.activity.error(format!("New background failed: {}", e)).await;
                return Err(e);
            }
        };
        if self.stop.is_stopped() {
            return Err(AppError::GenerationError("Stopped by user.".to_string()));
        }

        let mut result = GeneratedImage::new(image, GenerationType::Fashion, request.base_prompt);
        result.transparent_product = Some(request.product);
        result.original_product = Some(request.original_product);
        result.character_image = Some(request.character);
        result.negative_prompt = request.negative_prompt;
        result.bg_removal_prompt = request.bg_removal_prompt;
        result.background_reference = request.background_reference;
        result.pose_reference = request.pose_reference;
        result.style_reference = request.style_reference;
        result.source_product_id = request.source_product_id;

        self.publish(&result).await;
        self.activity.info("New background generated.").await;
        Ok(result)
    }
}
