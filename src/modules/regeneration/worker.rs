//! Single consumer of the regeneration queue.
//!
//! Picks the oldest pending item, runs it to a terminal status, then looks
//! again. Sleeps on the queue's wake-up when nothing is pending, so at most
//! one regeneration is ever in flight.

use super::domain::{RegenerationPolicy, RegenerationQueueItem};
use super::queue::RegenerationQueue;
use crate::modules::credentials::{Credential, KeyRotation};
use crate::modules::generation::domain::{
    AspectRatio, GeneratedImage, GenerationType, ImageData, ImageGenerationService,
    ProcessingStatus, SceneRequest,
};
use crate::modules::generation::prompts::catalog::random_seed;
use crate::modules::generation::prompts::templates::{
    bg_removal_prompt, combine_references, edit_variation_prompt, text_to_image_variation_prompt,
    with_negative, with_references, BACKGROUND_IMAGE_INSTRUCTION,
};
use crate::modules::studio::domain::{ActivityLog, Gallery, Viewer};
use crate::shared::errors::{AppError, AppResult};
use crate::{log_debug, log_info};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

pub struct RegenerationWorker {
    queue: RegenerationQueue,
    service: Arc<dyn ImageGenerationService>,
    rotation: KeyRotation,
    gallery: Gallery,
    viewer: Viewer,
    activity: ActivityLog,
    policy: RwLock<RegenerationPolicy>,
}

impl RegenerationWorker {
    pub fn new(
        queue: RegenerationQueue,
        service: Arc<dyn ImageGenerationService>,
        rotation: KeyRotation,
        gallery: Gallery,
        viewer: Viewer,
        activity: ActivityLog,
        policy: RegenerationPolicy,
    ) -> Self {
        Self {
            queue,
            service,
            rotation,
            gallery,
            viewer,
            activity,
            policy: RwLock::new(policy),
        }
    }

    pub fn queue(&self) -> &RegenerationQueue {
        &self.queue
    }

    /// Applies from the next item on
    pub async fn set_policy(&self, policy: RegenerationPolicy) {
        *self.policy.write().await = policy;
    }

    /// Consume the queue until `shutdown` is cancelled
    pub async fn run(self: Arc<Self>, shutdown: CancellationToken) {
        log_info!("Regeneration worker started");
        loop {
            if shutdown.is_cancelled() {
                break;
            }

            if let Some(item) = self.queue.next_pending().await {
                self.process(item).await;
                continue;
            }

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = self.queue.wait_for_work() => {}
            }
        }
        log_info!("Regeneration worker stopped");
    }

    /// Run one item to `done` or `error`
    pub async fn process(&self, item: RegenerationQueueItem) {
        let policy = *self.policy.read().await;
        log_debug!(
            "Regenerating {} ({})",
            item.id,
            item.source_image.generation_type
        );

        match self.regenerate(&item, policy).await {
            Ok(result) => {
                let stored = result.clone();
                self.queue
                    .update(&item.id, |entry| {
                        entry.status = ProcessingStatus::Done;
                        entry.result = Some(stored);
                        entry.error_message = None;
                    })
                    .await;
                self.viewer.show(result.clone()).await;
                if policy.auto_save {
                    self.gallery.prepend(result).await;
                }
                self.activity.info("Regeneration finished.").await;
            }
            Err(e) => {
                let message = e.to_string();
                self.queue
                    .update(&item.id, |entry| {
                        entry.status = ProcessingStatus::Error;
                        entry.error_message = Some(message.clone());
                    })
                    .await;
                self.activity
                    .error(format!("Regeneration failed: {}", message))
                    .await;
            }
        }
    }

    async fn regenerate(
        &self,
        item: &RegenerationQueueItem,
        policy: RegenerationPolicy,
    ) -> AppResult<GeneratedImage> {
        let credential = self.rotation.next_credential().ok_or_else(|| {
            AppError::ValidationError("No API key configured. Add one in the API settings.".to_string())
        })?;
        let source = &item.source_image;

        match source.generation_type {
            GenerationType::Edit => {
                let original = required(&source.original_product, "source image")?;
                self.queue
                    .set_status(&item.id, ProcessingStatus::ProcessingScene)
                    .await;
                let image = self
                    .service
                    .edit_image(&credential, original, &edit_variation_prompt(&source.prompt))
                    .await?;
                Ok(source.derive(image))
            }
            GenerationType::Tti => {
                self.queue
                    .set_status(&item.id, ProcessingStatus::ProcessingScene)
                    .await;
                let ratio = source.aspect_ratio.unwrap_or(AspectRatio::Tall);
                let image = self
                    .service
                    .generate_image_from_text(
                        &credential,
                        &text_to_image_variation_prompt(&source.prompt),
                        ratio,
                    )
                    .await?;
                Ok(source.derive(image))
            }
            GenerationType::Fashion => self.regenerate_scene(item, &credential, policy).await,
        }
    }

    async fn regenerate_scene(
        &self,
        item: &RegenerationQueueItem,
        credential: &Credential,
        policy: RegenerationPolicy,
    ) -> AppResult<GeneratedImage> {
        let source = &item.source_image;
        let character = required(&source.character_image, "source character image")?;
        let original = required(&source.original_product, "source product image")?;

        let transparent = if policy.skip_bg_removal {
            original.clone()
        } else {
            self.queue
                .set_status(&item.id, ProcessingStatus::ProcessingBg)
                .await;
            let prompt = bg_removal_prompt(policy.backdrop, &source.bg_removal_prompt);
            let transparent = self
                .service
                .remove_background(credential, original, &prompt)
                .await?;
            let stored = transparent.clone();
            self.queue
                .update(&item.id, |entry| {
                    entry.status = ProcessingStatus::BgRemoved;
                    entry.new_transparent = Some(stored);
                })
                .await;
            transparent
        };

        self.queue
            .set_status(&item.id, ProcessingStatus::ProcessingScene)
            .await;
        let base = if source.background_reference_image.is_some() {
            BACKGROUND_IMAGE_INSTRUCTION
        } else {
            source.prompt.as_str()
        };
        let references = combine_references(&[
            source.background_reference.as_str(),
            source.pose_reference.as_str(),
            source.style_reference.as_str(),
        ]);
        let instruction = with_negative(
            &with_references(base, &references),
            &source.negative_prompt,
        );

        let image = self
            .service
            .generate_scene(
                credential,
                SceneRequest {
                    subject: transparent.clone(),
                    character: character.clone(),
                    instruction,
                    background_reference: source.background_reference_image.clone(),
                    seed: Some(random_seed()),
                },
            )
            .await?;

        let mut result = source.derive(image);
        result.transparent_product = Some(transparent);
        Ok(result)
    }
}

fn required<'a>(image: &'a Option<ImageData>, what: &str) -> AppResult<&'a ImageData> {
    image
        .as_ref()
        .ok_or_else(|| AppError::GenerationError(format!("Cannot regenerate: missing {}", what)))
}
