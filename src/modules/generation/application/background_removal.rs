use crate::modules::credentials::Credential;
use crate::modules::generation::domain::{
    Backdrop, ImageGenerationService, ProcessingStatus, ProductJob,
};
use crate::modules::generation::prompts::templates::bg_removal_prompt;
use crate::modules::jobs::{JobProcessor, ProgressTracker, StopSignal};
use crate::modules::studio::domain::{ActivityLog, ProductCatalog};
use crate::shared::errors::AppResult;
use async_trait::async_trait;
use std::sync::Arc;

/// Background removal without scene composition, one unit per product
pub struct BackgroundRemovalProcessor {
    service: Arc<dyn ImageGenerationService>,
    prompt: String,
    products: ProductCatalog,
    activity: ActivityLog,
    progress: ProgressTracker,
    stop: StopSignal,
}

impl BackgroundRemovalProcessor {
    pub fn new(
        service: Arc<dyn ImageGenerationService>,
        configured_prompt: &str,
        backdrop: Backdrop,
        products: ProductCatalog,
        activity: ActivityLog,
        progress: ProgressTracker,
        stop: StopSignal,
    ) -> Self {
        Self {
            service,
            prompt: bg_removal_prompt(backdrop, configured_prompt),
            products,
            activity,
            progress,
            stop,
        }
    }
}

#[async_trait]
impl JobProcessor<ProductJob> for BackgroundRemovalProcessor {
    async fn process(&self, job: &ProductJob, credential: &Credential) -> AppResult<()> {
        self.products
            .set_status(&job.id, ProcessingStatus::ProcessingBg)
            .await;

        match self
            .service
            .remove_background(credential, &job.original, &self.prompt)
            .await
        {
            Ok(transparent) => {
                if self.stop.is_stopped() {
                    return Ok(());
                }
                self.products
                    .update(&job.id, |product| {
                        product.status = ProcessingStatus::Done;
                        product.transparent = Some(transparent);
                        product.error_message = None;
                    })
                    .await;
                self.progress.record_success();
                self.activity
                    .info(format!("Background removed for product {}.", job.id))
                    .await;
                Ok(())
            }
            Err(e) if e.is_rate_limit() => {
                self.products
                    .set_status(&job.id, ProcessingStatus::Pending)
                    .await;
                Err(e)
            }
            Err(e) => {
                self.products.mark_error(&job.id, &e.to_string()).await;
                self.progress.record_failure(1);
                self.activity
                    .error(format!("Background removal failed for product {}: {}", job.id, e))
                    .await;
                Err(e)
            }
        }
    }
}
