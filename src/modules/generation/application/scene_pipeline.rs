//! Multi-variant scene generation for one product per job.
//!
//! Per product: remove the background once, generate variant 1 as the
//! background anchor, then recompose variants 2..K onto that anchor with a
//! fresh pose each. Progress is kept per product so a job re-queued after a
//! rate limit resumes at the first undelivered variant.

use crate::modules::credentials::Credential;
use crate::modules::generation::domain::{
    AspectRatio, Backdrop, CreativeMode, GeneratedImage, GenerationType, ImageData,
    ImageGenerationService, ProcessingStatus, ProductJob, SceneRequest,
};
use crate::modules::generation::prompts::catalog::{random_background, MAX_SEED};
use crate::modules::generation::prompts::templates::{
    anchor_variant_prompt, bg_removal_prompt, combine_references, with_negative,
    with_references, PRODUCT_USAGE_HINT,
};
use crate::modules::generation::prompts::PosePool;
use crate::modules::jobs::{JobProcessor, ProgressTracker, StopSignal};
use crate::modules::studio::domain::{ActivityLog, Gallery, ProductCatalog, Viewer};
use crate::shared::errors::{AppError, AppResult};
use crate::{log_debug, log_warn};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Inputs shared by every product of one batch run
#[derive(Debug, Clone, PartialEq)]
pub struct SceneSettings {
    pub mode: CreativeMode,
    pub base_prompt: String,
    pub negative_prompt: String,
    pub bg_removal_prompt: String,
    pub background_reference: String,
    pub pose_reference: String,
    pub style_reference: String,
    /// Custom mode only
    pub product_usage_reference: String,
    pub background_image: Option<ImageData>,
    pub character_image: ImageData,
    pub aspect_ratio: AspectRatio,
    pub variants: usize,
    pub seed: u64,
    pub skip_bg_removal: bool,
    pub backdrop: Backdrop,
    pub auto_save: bool,
}

impl SceneSettings {
    /// Background, pose and style descriptors (plus product usage in custom
    /// mode) joined for the prompt
    pub fn combined_reference(&self) -> String {
        let mut parts = vec![
            self.background_reference.as_str(),
            self.pose_reference.as_str(),
            self.style_reference.as_str(),
        ];
        if self.mode == CreativeMode::Custom {
            parts.push(self.product_usage_reference.as_str());
        }
        combine_references(&parts)
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.variants == 0 {
            return Err(AppError::ValidationError(
                "At least one variant per product is required.".to_string(),
            ));
        }
        if self.base_prompt.trim().is_empty()
            && self.combined_reference().is_empty()
            && self.background_image.is_none()
        {
            return Err(AppError::ValidationError(
                "Enter a main prompt or provide a background image or reference.".to_string(),
            ));
        }
        let last_offset = self.variants as u64 - 1;
        if self
            .seed
            .checked_add(last_offset)
            .map_or(true, |last| last > MAX_SEED)
        {
            return Err(AppError::ValidationError(format!(
                "Seed must be between 0 and {} for {} variants.",
                MAX_SEED.saturating_sub(last_offset),
                self.variants
            )));
        }
        Ok(())
    }

    /// Variant `v` (1-based) uses `seed + (v - 1)`
    pub fn variant_seed(&self, variant: usize) -> u64 {
        self.seed
            .saturating_add((variant as u64).saturating_sub(1))
            .min(MAX_SEED)
    }
}

/// What has been produced so far for one product
struct ItemState {
    transparent: Option<ImageData>,
    anchor: Option<ImageData>,
    /// 1-based index of the next variant to deliver
    next_variant: usize,
    poses: PosePool,
}

impl ItemState {
    fn new() -> Self {
        Self {
            transparent: None,
            anchor: None,
            next_variant: 1,
            poses: PosePool::shuffled(),
        }
    }
}

pub struct SceneGenerationProcessor {
    service: Arc<dyn ImageGenerationService>,
    settings: SceneSettings,
    products: ProductCatalog,
    gallery: Gallery,
    viewer: Viewer,
    activity: ActivityLog,
    progress: ProgressTracker,
    stop: StopSignal,
    items: DashMap<String, Arc<Mutex<ItemState>>>,
    delivered: Mutex<Vec<GeneratedImage>>,
}

impl SceneGenerationProcessor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        service: Arc<dyn ImageGenerationService>,
        settings: SceneSettings,
        products: ProductCatalog,
        gallery: Gallery,
        viewer: Viewer,
        activity: ActivityLog,
        progress: ProgressTracker,
        stop: StopSignal,
    ) -> Self {
        Self {
            service,
            settings,
            products,
            gallery,
            viewer,
            activity,
            progress,
            stop,
            items: DashMap::new(),
            delivered: Mutex::new(Vec::new()),
        }
    }

    pub fn settings(&self) -> &SceneSettings {
        &self.settings
    }

    /// Every image delivered so far, in delivery order
    pub async fn take_delivered(&self) -> Vec<GeneratedImage> {
        std::mem::take(&mut *self.delivered.lock().await)
    }

    fn item_state(&self, id: &str) -> Arc<Mutex<ItemState>> {
        self.items
            .entry(id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(ItemState::new())))
            .clone()
    }

    async fn run_item(
        &self,
        job: &ProductJob,
        credential: &Credential,
        state: &mut ItemState,
    ) -> AppResult<()> {
        let transparent = match state.transparent.clone() {
            Some(transparent) => transparent,
            None => {
                let transparent = self.remove_background(job, credential).await?;
                state.transparent = Some(transparent.clone());
                transparent
            }
        };

        let total = self.settings.variants;
        while state.next_variant <= total {
            if self.stop.is_stopped() {
                return Ok(());
            }
            let variant = state.next_variant;
            self.products
                .set_status(&job.id, ProcessingStatus::ProcessingScene)
                .await;

            let (instruction, background_reference) = if variant == 1 {
                (
                    self.first_variant_prompt().await,
                    self.settings.background_image.clone(),
                )
            } else {
                let anchor = state.anchor.clone().ok_or_else(|| {
                    AppError::GenerationError(format!(
                        "Variant {} cannot be generated because variant 1 failed",
                        variant
                    ))
                })?;
                let pose = state.poses.take_or_fallback();
                log_debug!("Product {} variant {} pose: {}", job.id, variant, pose);
                let prompt = with_negative(
                    &anchor_variant_prompt(pose, self.settings.aspect_ratio),
                    &self.settings.negative_prompt,
                );
                (prompt, Some(anchor))
            };

            let image = self
                .service
                .generate_scene(
                    credential,
                    SceneRequest {
                        subject: transparent.clone(),
                        character: self.settings.character_image.clone(),
                        instruction,
                        background_reference,
                        seed: Some(self.settings.variant_seed(variant)),
                    },
                )
                .await?;

            if variant == 1 {
                state.anchor = Some(image.clone());
            }
            state.next_variant += 1;
            self.deliver(job, &transparent, image, variant).await;
        }

        self.products.set_status(&job.id, ProcessingStatus::Done).await;
        Ok(())
    }

    async fn remove_background(
        &self,
        job: &ProductJob,
        credential: &Credential,
    ) -> AppResult<ImageData> {
        if self.settings.skip_bg_removal {
            self.products
                .update(&job.id, |product| {
                    product.status = ProcessingStatus::BgRemoved;
                    product.transparent = Some(job.original.clone());
                })
                .await;
            return Ok(job.original.clone());
        }

        self.products
            .set_status(&job.id, ProcessingStatus::ProcessingBg)
            .await;
        let prompt = bg_removal_prompt(self.settings.backdrop, &self.settings.bg_removal_prompt);
        let transparent = self
            .service
            .remove_background(credential, &job.original, &prompt)
            .await?;

        self.products
            .update(&job.id, |product| {
                product.status = ProcessingStatus::BgRemoved;
                product.transparent = Some(transparent.clone());
            })
            .await;
        Ok(transparent)
    }

    async fn first_variant_prompt(&self) -> String {
        let settings = &self.settings;
        let mut reference = settings.combined_reference();
        if reference.is_empty() && settings.background_image.is_none() {
            let background = random_background();
            self.activity
                .info(format!("No reference given, using a random background: {}", background))
                .await;
            reference = background.to_string();
        }

        let mut prompt = with_references(&settings.base_prompt, &reference);
        if settings.mode == CreativeMode::Custom && settings.product_usage_reference.trim().is_empty()
        {
            prompt = format!("{} {}", prompt, PRODUCT_USAGE_HINT);
        }
        with_negative(&prompt, &settings.negative_prompt)
    }

    async fn deliver(
        &self,
        job: &ProductJob,
        transparent: &ImageData,
        image: ImageData,
        variant: usize,
    ) {
        let settings = &self.settings;
        let mut result = GeneratedImage::new(image, GenerationType::Fashion, &settings.base_prompt);
        result.transparent_product = Some(transparent.clone());
        result.original_product = Some(job.original.clone());
        result.character_image = Some(settings.character_image.clone());
        result.negative_prompt = settings.negative_prompt.clone();
        result.bg_removal_prompt = settings.bg_removal_prompt.clone();
        result.background_reference = settings.background_reference.clone();
        result.pose_reference = settings.pose_reference.clone();
        result.style_reference = settings.style_reference.clone();
        result.background_reference_image = settings.background_image.clone();
        result.aspect_ratio = Some(settings.aspect_ratio);
        result.source_product_id = Some(job.id.clone());

        let preview = result.image.clone();
        self.products
            .update(&job.id, |product| product.generated_preview = Some(preview))
            .await;
        self.viewer.show(result.clone()).await;
        if settings.auto_save {
            self.gallery.prepend(result.clone()).await;
        }
        self.delivered.lock().await.push(result);
        self.progress.record_success();
        self.activity
            .info(format!(
                "Product {}: variant {}/{} done.",
                short_id(&job.id),
                variant,
                settings.variants
            ))
            .await;
    }
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

#[async_trait]
impl JobProcessor<ProductJob> for SceneGenerationProcessor {
    async fn process(&self, job: &ProductJob, credential: &Credential) -> AppResult<()> {
        let slot = self.item_state(&job.id);
        let mut state = slot.lock().await;

        match self.run_item(job, credential, &mut state).await {
            Ok(()) => {
                self.items.remove(&job.id);
                Ok(())
            }
            Err(e) if e.is_rate_limit() => {
                log_warn!(
                    "Product {} paused at variant {}: {}",
                    job.id,
                    state.next_variant,
                    e
                );
                Err(e)
            }
            Err(e) => {
                let total = self.settings.variants;
                let failed = state.next_variant;
                let remaining = total + 1 - failed;
                self.progress.record_failure(remaining);
                self.products.mark_error(&job.id, &e.to_string()).await;
                self.activity
                    .error(format!(
                        "Product {}: variant {}/{} failed, {} variant(s) not generated: {}",
                        short_id(&job.id),
                        failed,
                        total,
                        remaining,
                        e
                    ))
                    .await;
                self.items.remove(&job.id);
                Err(e)
            }
        }
    }
}
