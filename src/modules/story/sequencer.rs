//! Sequential storyboard generation.
//!
//! Each scene yields a start and an end frame, strictly in order. With
//! consistency on, every frame after the first is conditioned on the frame
//! generated just before it.

use super::domain::{StoryOptions, StoryOutcome, StoryScene};
use crate::modules::credentials::KeyRotation;
use crate::modules::generation::domain::{
    FrameType, GeneratedImage, GenerationType, ImageData, ImageGenerationService, SceneRequest,
};
use crate::modules::generation::prompts::templates::story_consistency_prompt;
use crate::modules::jobs::{ProgressTracker, StopSignal};
use crate::modules::studio::domain::{ActivityLog, Gallery, Viewer};
use crate::shared::errors::{AppError, AppResult};
use crate::shared::utils::TimedOperation;
use crate::log_info;
use std::sync::Arc;

#[derive(Clone)]
pub struct StorySequencer {
    service: Arc<dyn ImageGenerationService>,
    rotation: KeyRotation,
    /// Story frames live apart from the main results
    gallery: Gallery,
    viewer: Viewer,
    activity: ActivityLog,
    progress: ProgressTracker,
    stop: StopSignal,
}

impl StorySequencer {
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
        }
    }

    pub fn gallery(&self) -> &Gallery {
        &self.gallery
    }

    pub async fn run(&self, scenes: &[StoryScene], options: StoryOptions) -> AppResult<StoryOutcome> {
        if scenes.is_empty() {
            return Err(AppError::ValidationError(
                "Analyze a story first to get a list of scenes.".to_string(),
            ));
        }

        self.stop.reset();
        self.activity.dismiss_banner().await;
        let total_frames = scenes.len() * 2;
        self.progress.reset(total_frames);
        self.activity
            .info(format!(
                "Starting story with {} scenes ({} frames).",
                scenes.len(),
                total_frames
            ))
            .await;
        let timer = TimedOperation::new("story generation");

        let mut previous: Option<ImageData> = None;
        let mut frames = Vec::with_capacity(total_frames);
        let mut failed_scene = None;

        'scenes: for (index, scene) in scenes.iter().enumerate() {
            let scene_index = index + 1;
            let steps = [
                (FrameType::Start, scene.start_prompt.en.as_str()),
                (FrameType::End, scene.end_prompt.en.as_str()),
            ];

            for (frame_type, prompt) in steps {
                if self.stop.is_stopped() {
                    break 'scenes;
                }
                let label = format!(
                    "Scene {}/{} ({})",
                    scene_index,
                    scenes.len(),
                    frame_label(frame_type)
                );

                match self.frame(prompt, previous.as_ref(), options).await {
                    Ok(image) => {
                        if self.stop.is_stopped() {
                            break 'scenes;
                        }
                        let conditioned = !frames.is_empty() && options.keep_character_consistent;
                        let mut result = GeneratedImage::new(image.clone(), GenerationType::Tti, prompt);
                        result.aspect_ratio = Some(options.aspect_ratio);
                        result.scene_index = Some(scene_index);
                        result.frame_type = Some(frame_type);
                        if conditioned {
                            result.background_reference_image = previous.clone();
                        }
                        previous = Some(image);

                        self.viewer.show(result.clone()).await;
                        if options.auto_save {
                            self.gallery.prepend(result.clone()).await;
                        }
                        self.progress.record_success();
                        self.activity.info(format!("{}: done.", label)).await;
                        frames.push(result);
                    }
                    Err(e) => {
                        self.activity.error(format!("{}: {}", label, e)).await;
                        self.activity
                            .info(format!("Story halted because scene {} failed.", scene_index))
                            .await;
                        self.progress
                            .record_failure(total_frames.saturating_sub(frames.len()));
                        failed_scene = Some(scene_index);
                        break 'scenes;
                    }
                }
            }
        }

        let stopped = self.stop.is_stopped();
        if stopped {
            self.activity.info("Processing stopped by user.").await;
        }
        timer.finish_with_info(&format!("{}/{} frames", frames.len(), total_frames));
        log_info!("Story finished with {} frames", frames.len());

        Ok(StoryOutcome {
            frames,
            failed_scene,
            stopped,
        })
    }

    async fn frame(
        &self,
        prompt: &str,
        previous: Option<&ImageData>,
        options: StoryOptions,
    ) -> AppResult<ImageData> {
        let credential = self.rotation.next_credential().ok_or_else(|| {
            AppError::ValidationError("No API key configured. Add one in the API settings.".to_string())
        })?;

        match (previous, options.keep_character_consistent) {
            (Some(reference), true) => {
                self.service
                    .generate_scene(
                        &credential,
                        SceneRequest {
                            subject: ImageData::blank_pixel(),
                            character: reference.clone(),
                            instruction: story_consistency_prompt(prompt, options.aspect_ratio),
                            background_reference: None,
                            seed: None,
                        },
                    )
                    .await
            }
            _ => {
                self.service
                    .generate_image_from_text(&credential, prompt, options.aspect_ratio)
                    .await
            }
        }
    }
}

fn frame_label(frame_type: FrameType) -> &'static str {
    match frame_type {
        FrameType::Start => "start",
        FrameType::End => "end",
    }
}
