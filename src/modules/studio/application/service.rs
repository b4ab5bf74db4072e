//! Entry point that wires the studio together.
//!
//! One instance owns the shared state (products, gallery, activity log,
//! viewer, progress, stop signal and credential pool) and hands clones of it
//! to whichever flow runs.

use crate::modules::advisory::{AdvisoryModel, AdvisoryService, VideoSceneInput};
use crate::modules::credentials::{CredentialPool, KeyRotation, RateLimitTracker};
use crate::modules::generation::application::{
    BackgroundRemovalProcessor, NewBackgroundRequest, SceneGenerationProcessor, SceneSettings,
    SingleShotService,
};
use crate::modules::generation::domain::{
    AspectRatio, Backdrop, CreativeMode, GeneratedImage, ImageData, ImageGenerationService,
    ProductImageFile,
};
use crate::modules::generation::infrastructure::GeminiClient;
use crate::modules::generation::prompts::catalog::random_seed;
use crate::modules::jobs::{BatchOrchestrator, BatchOutcome, OrchestratorSettings, ProgressTracker, StopSignal};
use crate::modules::media::{export_images, DEFAULT_EXPORT_DELAY};
use crate::modules::preferences::{
    FileKeyValueStore, KeyValueStore, PreferencesService, UserPreferences,
};
use crate::modules::regeneration::{
    RegenerationPolicy, RegenerationQueue, RegenerationQueueItem, RegenerationWorker,
};
use crate::modules::story::{StoryOptions, StoryOutcome, StoryScene, StorySequencer};
use crate::modules::studio::domain::{ActivityLog, Gallery, ProductCatalog, Viewer};
use crate::shared::config::AppConfig;
use crate::shared::errors::{AppError, AppResult};
use crate::{log_info, log_warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Per-run inputs of a scene batch; everything else comes from preferences
#[derive(Debug, Clone, PartialEq)]
pub struct BatchRequest {
    pub mode: CreativeMode,
    pub character_image: ImageData,
    pub background_image: Option<ImageData>,
    pub variants: usize,
    /// Random when absent
    pub seed: Option<u64>,
    pub backdrop: Backdrop,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport {
    pub outcome: BatchOutcome,
    /// Delivered images in delivery order
    pub images: Vec<GeneratedImage>,
}

struct WorkerHandle {
    shutdown: CancellationToken,
    task: JoinHandle<()>,
}

pub struct StudioService {
    config: AppConfig,
    preferences_service: PreferencesService,
    preferences: RwLock<UserPreferences>,
    generator: Arc<dyn ImageGenerationService>,
    advisory: AdvisoryService,
    pool: CredentialPool,
    rotation: KeyRotation,
    rate_limits: RateLimitTracker,
    progress: ProgressTracker,
    stop: StopSignal,
    activity: ActivityLog,
    products: ProductCatalog,
    gallery: Gallery,
    story_gallery: Gallery,
    viewer: Viewer,
    regeneration: Arc<RegenerationWorker>,
    /// Backdrop of the latest batch; regenerations reuse it
    backdrop: RwLock<Backdrop>,
    worker: Mutex<Option<WorkerHandle>>,
}

impl StudioService {
    pub fn new(
        config: AppConfig,
        generator: Arc<dyn ImageGenerationService>,
        advisor: Arc<dyn AdvisoryModel>,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        let preferences_service = PreferencesService::new(store);
        let preferences = preferences_service.load();
        let pool = preferences_service.active_credentials(&preferences, &config.default_api_keys);
        let rotation = KeyRotation::new(pool.clone());
        let activity = ActivityLog::new();
        let gallery = Gallery::new();
        let viewer = Viewer::new();

        let regeneration = Arc::new(RegenerationWorker::new(
            RegenerationQueue::new(gallery.clone()),
            generator.clone(),
            rotation.clone(),
            gallery.clone(),
            viewer.clone(),
            activity.clone(),
            regeneration_policy(&preferences, Backdrop::default()),
        ));

        log_info!("Studio ready with {} API keys", pool.len());

        Self {
            advisory: AdvisoryService::new(advisor, rotation.clone()),
            config,
            preferences_service,
            preferences: RwLock::new(preferences),
            generator,
            pool,
            rotation,
            rate_limits: RateLimitTracker::new(),
            progress: ProgressTracker::new(),
            stop: StopSignal::new(),
            activity,
            products: ProductCatalog::new(),
            gallery,
            story_gallery: Gallery::new(),
            viewer,
            regeneration,
            backdrop: RwLock::new(Backdrop::default()),
            worker: Mutex::new(None),
        }
    }

    /// Gemini backend with preferences stored at `config.preferences_path`
    pub fn from_config(config: AppConfig) -> AppResult<Self> {
        let client = Arc::new(GeminiClient::new(&config)?);
        let store = Arc::new(FileKeyValueStore::new(config.preferences_path.clone()));
        Ok(Self::new(config, client.clone(), client, store))
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn activity(&self) -> &ActivityLog {
        &self.activity
    }

    pub fn gallery(&self) -> &Gallery {
        &self.gallery
    }

    pub fn story_gallery(&self) -> &Gallery {
        &self.story_gallery
    }

    pub fn viewer(&self) -> &Viewer {
        &self.viewer
    }

    pub fn products(&self) -> &ProductCatalog {
        &self.products
    }

    pub fn progress(&self) -> &ProgressTracker {
        &self.progress
    }

    pub fn credentials(&self) -> &CredentialPool {
        &self.pool
    }

    pub fn advisory(&self) -> &AdvisoryService {
        &self.advisory
    }

    pub fn regeneration_queue(&self) -> &RegenerationQueue {
        self.regeneration.queue()
    }

    pub async fn preferences(&self) -> UserPreferences {
        self.preferences.read().await.clone()
    }

    /// Persist and apply; the credential pool follows the key settings
    pub async fn save_preferences(&self, preferences: UserPreferences) -> AppResult<()> {
        self.preferences_service.save(&preferences)?;
        self.pool
            .replace(preferences.active_keys(&self.config.default_api_keys));
        let backdrop = *self.backdrop.read().await;
        self.regeneration
            .set_policy(regeneration_policy(&preferences, backdrop))
            .await;
        *self.preferences.write().await = preferences;
        Ok(())
    }

    /// Backdrop colour used when a regenerated scene removes the background again
    pub async fn select_backdrop(&self, backdrop: Backdrop) {
        *self.backdrop.write().await = backdrop;
        let preferences = self.preferences().await;
        self.regeneration
            .set_policy(regeneration_policy(&preferences, backdrop))
            .await;
    }

    pub async fn save_api_settings(
        &self,
        api_keys: Vec<String>,
        use_default_api_key: bool,
        max_concurrency: usize,
    ) -> AppResult<()> {
        if max_concurrency == 0 {
            return Err(AppError::ValidationError(
                "Concurrency must be at least 1.".to_string(),
            ));
        }
        let mut preferences = self.preferences().await;
        preferences.api_keys = api_keys
            .into_iter()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .collect();
        preferences.use_default_api_key = use_default_api_key;
        preferences.max_concurrency = max_concurrency;
        self.save_preferences(preferences).await?;

        self.activity
            .info(format!("API settings saved: {} keys active.", self.pool.len()))
            .await;
        Ok(())
    }

    pub async fn add_products(&self, images: Vec<ImageData>) -> Vec<ProductImageFile> {
        self.products.add(images).await
    }

    /// Raise the shared stop flag; running flows end at their next check
    pub fn stop(&self) {
        log_info!("Stop requested");
        self.stop.stop();
    }

    fn orchestrator(&self, preferences: &UserPreferences) -> BatchOrchestrator {
        BatchOrchestrator::new(
            self.pool.clone(),
            self.rate_limits.clone(),
            self.progress.clone(),
            self.stop.clone(),
            self.activity.clone(),
            OrchestratorSettings {
                cooldown: preferences.rate_limit_cooldown(),
                ..OrchestratorSettings::default()
            },
        )
    }

    fn scene_settings(preferences: &UserPreferences, request: &BatchRequest) -> SceneSettings {
        let p = preferences;
        let (prompt, negative, bg_removal, background, pose, style, usage) = match request.mode {
            CreativeMode::Fashion => (
                &p.fashion_prompt,
                &p.fashion_negative_prompt,
                &p.fashion_bg_removal_prompt,
                &p.fashion_background_reference,
                &p.fashion_pose_reference,
                &p.fashion_style_reference,
                String::new(),
            ),
            CreativeMode::Custom => (
                &p.custom_prompt,
                &p.custom_negative_prompt,
                &p.custom_bg_removal_prompt,
                &p.custom_background_reference,
                &p.custom_pose_reference,
                &p.custom_style_reference,
                p.custom_product_usage_reference.clone(),
            ),
        };

        SceneSettings {
            mode: request.mode,
            base_prompt: prompt.clone(),
            negative_prompt: negative.clone(),
            bg_removal_prompt: bg_removal.clone(),
            background_reference: background.clone(),
            pose_reference: pose.clone(),
            style_reference: style.clone(),
            product_usage_reference: usage,
            background_image: request.background_image.clone(),
            character_image: request.character_image.clone(),
            aspect_ratio: p.fashion_aspect_ratio,
            variants: request.variants,
            seed: request.seed.unwrap_or_else(random_seed),
            skip_bg_removal: p.skip_bg_removal,
            backdrop: request.backdrop,
            auto_save: p.auto_save_to_gallery,
        }
    }

    async fn reject(&self, error: AppError) -> AppError {
        self.activity.error(error.to_string()).await;
        error
    }

    /// Scene generation for every uploaded product
    pub async fn generate_batch(&self, request: BatchRequest) -> AppResult<BatchReport> {
        let preferences = self.preferences().await;
        let jobs = self.products.jobs().await;
        if jobs.is_empty() {
            return Err(self
                .reject(AppError::ValidationError(
                    "Upload a character image and at least one product image.".to_string(),
                ))
                .await);
        }

        let settings = Self::scene_settings(&preferences, &request);
        if let Err(e) = settings.validate() {
            return Err(self.reject(e).await);
        }
        self.select_backdrop(request.backdrop).await;

        let variants = settings.variants;
        self.activity
            .info(format!(
                "Generating {} variants for {} products (seed {}).",
                variants,
                jobs.len(),
                settings.seed
            ))
            .await;

        let processor = SceneGenerationProcessor::new(
            self.generator.clone(),
            settings,
            self.products.clone(),
            self.gallery.clone(),
            self.viewer.clone(),
            self.activity.clone(),
            self.progress.clone(),
            self.stop.clone(),
        );
        let outcome = self
            .orchestrator(&preferences)
            .run_batch(jobs, variants, preferences.concurrency(), &processor)
            .await?;

        Ok(BatchReport {
            outcome,
            images: processor.take_delivered().await,
        })
    }

    /// Background removal only, one unit per product
    pub async fn remove_backgrounds(&self, mode: CreativeMode, backdrop: Backdrop) -> AppResult<BatchOutcome> {
        let preferences = self.preferences().await;
        if preferences.skip_bg_removal {
            return Err(self
                .reject(AppError::ValidationError(
                    "Background removal cannot run while skipping background removal is enabled."
                        .to_string(),
                ))
                .await);
        }
        let jobs = self.products.jobs().await;
        if jobs.is_empty() {
            return Err(self
                .reject(AppError::ValidationError(
                    "Upload at least one product image.".to_string(),
                ))
                .await);
        }

        self.select_backdrop(backdrop).await;
        let configured = match mode {
            CreativeMode::Fashion => &preferences.fashion_bg_removal_prompt,
            CreativeMode::Custom => &preferences.custom_bg_removal_prompt,
        };
        self.activity
            .info(format!("Removing backgrounds for {} products.", jobs.len()))
            .await;

        let processor = BackgroundRemovalProcessor::new(
            self.generator.clone(),
            configured,
            backdrop,
            self.products.clone(),
            self.activity.clone(),
            self.progress.clone(),
            self.stop.clone(),
        );
        self.orchestrator(&preferences)
            .run_batch(jobs, 1, preferences.concurrency(), &processor)
            .await
    }

    /// Turn background-removed products into the new product list
    pub async fn promote_transparent(&self) -> usize {
        let promoted = self.products.promote_transparent().await;
        self.activity
            .info(format!("{} background-removed images moved to products.", promoted))
            .await;
        promoted
    }

    fn single_shot(&self, preferences: &UserPreferences) -> SingleShotService {
        SingleShotService::new(
            self.generator.clone(),
            self.rotation.clone(),
            self.gallery.clone(),
            self.viewer.clone(),
            self.activity.clone(),
            self.progress.clone(),
            self.stop.clone(),
        )
        .with_auto_save(preferences.auto_save_to_gallery)
    }

    pub async fn text_to_image(
        &self,
        prompt: &str,
        aspect_ratio: AspectRatio,
        count: usize,
    ) -> AppResult<Vec<GeneratedImage>> {
        let preferences = self.preferences().await;
        self.single_shot(&preferences)
            .text_to_image(prompt, aspect_ratio, count)
            .await
    }

    pub async fn edit_image(&self, source: &ImageData, instruction: &str) -> AppResult<GeneratedImage> {
        let preferences = self.preferences().await;
        self.single_shot(&preferences).edit(source, instruction).await
    }

    pub async fn new_background(&self, request: NewBackgroundRequest) -> AppResult<GeneratedImage> {
        let preferences = self.preferences().await;
        self.single_shot(&preferences).new_background(request).await
    }

    /// Write the results of a finished run to disk.
    ///
    /// Nothing is written for a stopped run. Without an explicit `dir` the
    /// images go to the configured output directory, and only when
    /// auto-download is enabled.
    pub async fn export_results(
        &self,
        images: &[GeneratedImage],
        dir: Option<&Path>,
        stopped: bool,
    ) -> AppResult<Vec<PathBuf>> {
        if stopped || images.is_empty() {
            return Ok(Vec::new());
        }
        let dir = match dir {
            Some(dir) => dir.to_path_buf(),
            None if self.preferences().await.auto_download_all => self.config.output_dir.clone(),
            None => return Ok(Vec::new()),
        };
        self.activity
            .info(format!("Downloading {} images...", images.len()))
            .await;
        export_images(images, &dir, DEFAULT_EXPORT_DELAY).await
    }

    /// Video prompts following the saved prompt structure
    pub async fn suggest_video_prompts(
        &self,
        scenes: &[VideoSceneInput],
        story: &str,
    ) -> AppResult<Vec<String>> {
        let template = self.preferences().await.video_prompt_structure;
        self.advisory
            .suggest_video_prompts(scenes, story, &template)
            .await
    }

    /// Move a gallery image into the regeneration queue
    pub async fn request_regeneration(&self, image_id: &str) -> AppResult<RegenerationQueueItem> {
        let item = self.regeneration.queue().enqueue(image_id).await?;
        self.activity.info("Image added to the regeneration queue.").await;
        Ok(item)
    }

    pub async fn generate_story(
        &self,
        scenes: &[StoryScene],
        options: StoryOptions,
    ) -> AppResult<StoryOutcome> {
        StorySequencer::new(
            self.generator.clone(),
            self.rotation.clone(),
            self.story_gallery.clone(),
            self.viewer.clone(),
            self.activity.clone(),
            self.progress.clone(),
            self.stop.clone(),
        )
        .run(scenes, options)
        .await
    }

    /// Spawn the regeneration consumer; a second call is a no-op
    pub async fn start_regeneration_worker(&self) {
        let mut worker = self.worker.lock().await;
        if worker.is_some() {
            return;
        }
        let shutdown = CancellationToken::new();
        let task = tokio::spawn(self.regeneration.clone().run(shutdown.clone()));
        *worker = Some(WorkerHandle { shutdown, task });
    }

    /// Cancel the consumer and wait for it; an item in flight finishes first
    pub async fn stop_regeneration_worker(&self) {
        let handle = self.worker.lock().await.take();
        if let Some(handle) = handle {
            handle.shutdown.cancel();
            if let Err(e) = handle.task.await {
                log_warn!("Regeneration worker ended abnormally: {}", e);
            }
        }
    }
}

fn regeneration_policy(preferences: &UserPreferences, backdrop: Backdrop) -> RegenerationPolicy {
    RegenerationPolicy {
        skip_bg_removal: preferences.skip_bg_removal,
        backdrop,
        auto_save: preferences.auto_save_to_gallery,
    }
}
