use crate::modules::advisory::domain::prompts::{
    edit_suggestion_prompt, scene_suggestion_prompt, story_analysis_prompt, video_prompt_request,
    CORE_INSTRUCTIONS_EN, CORE_INSTRUCTIONS_VI,
};
use crate::modules::advisory::domain::schema::{
    validate_prompt_suggestions, validate_scene_suggestions, validate_string_list,
    validate_video_prompts,
};
use crate::modules::advisory::domain::{
    AdvisoryModel, PromptSuggestion, SceneSuggestion, VideoSceneInput,
};
use crate::modules::credentials::{Credential, KeyRotation};
use crate::modules::generation::domain::ImageData;
use crate::shared::errors::{AppError, AppResult};
use crate::{log_debug, log_info};
use std::sync::Arc;

/// Prompt suggestions and storyboard analysis from the text model
///
/// One credential is drawn from the rotation per call; rate-limit errors are
/// returned to the caller unchanged.
pub struct AdvisoryService {
    model: Arc<dyn AdvisoryModel>,
    rotation: KeyRotation,
}

impl AdvisoryService {
    pub fn new(model: Arc<dyn AdvisoryModel>, rotation: KeyRotation) -> Self {
        Self { model, rotation }
    }

    fn credential(&self) -> AppResult<Credential> {
        self.rotation.next_credential().ok_or_else(|| {
            AppError::ValidationError("No API key configured. Add one in the API settings.".to_string())
        })
    }

    /// Ready-to-use scene prompts for a product and character pair
    pub async fn suggest_prompts(
        &self,
        product: &ImageData,
        character: &ImageData,
        references: &str,
    ) -> AppResult<Vec<PromptSuggestion>> {
        let credential = self.credential()?;
        let prompt = scene_suggestion_prompt(references);
        let value = self
            .model
            .generate_json(&credential, &prompt, &[product.clone(), character.clone()])
            .await?;

        let suggestions = validate_prompt_suggestions(value)?
            .into_iter()
            .map(|s| PromptSuggestion {
                en: format!("{} {}", CORE_INSTRUCTIONS_EN, s.en),
                vi: format!("{} {}", CORE_INSTRUCTIONS_VI, s.vi),
            })
            .collect::<Vec<_>>();

        log_info!("Received {} prompt suggestions", suggestions.len());
        Ok(suggestions)
    }

    pub async fn suggest_edit_prompts(
        &self,
        image: &ImageData,
        request: &str,
        count: usize,
    ) -> AppResult<Vec<String>> {
        let credential = self.credential()?;
        let prompt = edit_suggestion_prompt(request, count.max(1));
        let value = self
            .model
            .generate_json(&credential, &prompt, std::slice::from_ref(image))
            .await?;
        Ok(validate_string_list(value)?)
    }

    /// Split a story into scenes with start and end frame prompts
    pub async fn analyze_story(&self, story: &str) -> AppResult<Vec<SceneSuggestion>> {
        if story.trim().is_empty() {
            return Err(AppError::ValidationError(
                "Enter a story to analyze.".to_string(),
            ));
        }
        let credential = self.credential()?;
        let value = self
            .model
            .generate_json(&credential, &story_analysis_prompt(story), &[])
            .await?;

        let scenes = validate_scene_suggestions(value)?;
        log_info!("Story split into {} scenes", scenes.len());
        Ok(scenes)
    }

    /// One video prompt per scene, in scene order
    pub async fn suggest_video_prompts(
        &self,
        scenes: &[VideoSceneInput],
        story: &str,
        template: &str,
    ) -> AppResult<Vec<String>> {
        if scenes.is_empty() {
            return Err(AppError::ValidationError(
                "Generate at least one storyboard scene first.".to_string(),
            ));
        }
        let credential = self.credential()?;
        let prompt = video_prompt_request(template, story, scenes);
        let images: Vec<ImageData> = scenes
            .iter()
            .flat_map(|scene| [scene.start_image.clone(), scene.end_image.clone()])
            .collect();
        log_debug!(
            "Requesting video prompts for {} scenes ({} images)",
            scenes.len(),
            images.len()
        );

        let value = self.model.generate_json(&credential, &prompt, &images).await?;
        Ok(validate_video_prompts(value, scenes.len())?)
    }
}
